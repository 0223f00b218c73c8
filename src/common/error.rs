use thiserror::Error;

use super::codec::Mode;

// Error
//------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq, Copy, Clone)]
pub enum QRError {
    #[error("Empty message")]
    InvalidMessage,

    #[error("Invalid version {0}, expected 1 to 40")]
    InvalidVersion(usize),

    #[error("Invalid masking pattern {0}, expected 0 to 7")]
    InvalidMaskingPattern(u8),

    // Recovered internally by discarding the segmentation that produced it
    #[error("Character {0:?} cannot be encoded in {1:?} mode")]
    ModeMismatch(char, Mode),

    #[error("Count {count} overflows the {bits}-bit character count field")]
    DataTooLong { count: usize, bits: usize },

    #[error("No generator polynomial for {0} error correction codewords")]
    UnsupportedEccLength(usize),

    #[error("Unable to encode message within version 40")]
    UnableToEncode,

    #[error("Requested version {requested} is too small, message needs version {required}")]
    VersionMismatch { requested: usize, required: usize },
}

pub type QRResult<T> = Result<T, QRError>;
