// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Mode {
    Numeric = 0b0001,
    Alphanumeric = 0b0010,
    Byte = 0b0100,
}

impl Mode {
    pub fn contains(&self, ch: char) -> bool {
        match self {
            Self::Numeric => ch.is_ascii_digit(),
            Self::Alphanumeric => Self::alphanumeric_digit(ch).is_some(),
            Self::Byte => true,
        }
    }

    #[inline]
    pub(crate) fn alphanumeric_digit(ch: char) -> Option<u16> {
        let digit = match ch {
            '0'..='9' => ch as u16 - '0' as u16,
            'A'..='Z' => ch as u16 - 'A' as u16 + 10,
            ' ' => 36,
            '$' => 37,
            '%' => 38,
            '*' => 39,
            '+' => 40,
            '-' => 41,
            '.' => 42,
            '/' => 43,
            ':' => 44,
            _ => return None,
        };
        Some(digit)
    }

    /// Packs a chunk already validated for this mode: up to 3 digits, up to 2
    /// alphanumerics or a single byte.
    pub fn encode_chunk(&self, data: &[u8]) -> u16 {
        let len = data.len();
        match self {
            Self::Numeric => {
                debug_assert!(len <= 3, "Data is too long for numeric conversion: {len}");
                data.iter().fold(0, |n, b| n * 10 + (b - b'0') as u16)
            }
            Self::Alphanumeric => {
                debug_assert!(len <= 2, "Data is too long for alphanumeric conversion: {len}");
                data.iter().fold(0, |n, &b| n * 45 + Self::alphanumeric_digit(b as char).unwrap_or(0))
            }
            Self::Byte => {
                debug_assert!(len == 1, "Data is too long for byte conversion: {len}");
                data[0] as u16
            }
        }
    }

    /// Bit length of the packed payload for `count` characters (bytes for byte mode).
    pub fn encoded_len(&self, count: usize) -> usize {
        match self {
            Self::Numeric => count / 3 * 10 + [0, 4, 7][count % 3],
            Self::Alphanumeric => count / 2 * 11 + (count % 2) * 6,
            Self::Byte => count * 8,
        }
    }
}


// Segment
//------------------------------------------------------------------------------

/// Span of the message tagged with one mode. `start` and `len` are UTF-8 byte
/// offsets, so a segment always lies on char boundaries.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct Segment {
    pub mode: Mode,
    pub start: usize,
    pub len: usize,
}

impl Segment {
    pub fn new(mode: Mode, start: usize, len: usize) -> Self {
        Self { mode, start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn content<'a>(&self, msg: &'a str) -> &'a str {
        &msg[self.start..self.end()]
    }

    /// Characters counted in the header: bytes for byte mode, chars otherwise.
    pub fn char_count(&self, msg: &str) -> usize {
        match self.mode {
            Mode::Byte => self.len,
            Mode::Numeric | Mode::Alphanumeric => self.content(msg).chars().count(),
        }
    }
}

/// Ordered segments covering a message without gaps or overlaps.
pub type Segmentation = Vec<Segment>;

// Global constants
//------------------------------------------------------------------------------

pub static PADDING_CODEWORDS: [u8; 2] = [0b1110_1100, 0b0001_0001];
