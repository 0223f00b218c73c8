//! # qrforge
//!
//! A Rust library for generating QR codes per ISO/IEC 18004: mode segmentation,
//! Reed-Solomon error correction, symbol layout and mask selection.
//!
//! ## Features
//!
//! - **Mode segmentation**: numeric, alphanumeric and byte runs are planned
//!   per message and the most compact plan wins
//! - **Negotiation**: versions 1-40 and levels L, M, Q, H are picked
//!   automatically unless pinned
//! - **Reed-Solomon error correction**: GF(256) tables built at compile time
//! - **Mask selection**: all 8 masks are scored with the standard penalty
//!   rules, optionally in parallel with the `parallel` feature
//! - **Rendering**: grayscale images through the `image` crate, or block
//!   characters for terminals
//!
//! ## Quick Start
//!
//! ```rust
//! use qrforge::QRBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Simplest usage - version, level and mask are chosen automatically
//! let qr = QRBuilder::new("Hello, World!").build()?;
//!
//! let img = qr.render(4); // 4 pixels per module
//! assert_eq!(img.width(), (qr.width() as u32 + 8) * 4);
//! # Ok(())
//! # }
//! ```
//!
//! ### Full Configuration
//!
//! ```rust
//! use qrforge::{ECLevel, MaskPattern, QRBuilder, Version};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let qr = QRBuilder::new("HELLO WORLD")
//!     .version(Version::new(2)?) // Fails with VersionMismatch if the data needs more
//!     .ec_level(ECLevel::Q)      // If not provided, the highest level that fits
//!     .mask(MaskPattern::new(3)?) // If not provided, the lowest penalty mask
//!     .build()?;
//!
//! assert_eq!(qr.width(), 25);
//! print!("{}", qr.to_str(1));
//! # Ok(())
//! # }
//! ```
//!
//! ### Reusing segmentations
//!
//! ```rust
//! use qrforge::{QRBuilder, SegmentCache};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut cache = SegmentCache::new();
//! for _ in 0..3 {
//!     let qr = QRBuilder::new("Tel: 555-1234").build_with_cache(&mut cache)?;
//!     assert!(qr.mask().is_some());
//! }
//! assert_eq!(cache.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Correction Levels
//! - **L (Low)**: ~7% error correction
//! - **M (Medium)**: ~15% error correction
//! - **Q (Quartile)**: ~25% error correction
//! - **H (High)**: ~30% error correction

#![allow(clippy::items_after_test_module, mixed_script_confusables)]

pub mod builder;
pub(crate) mod common;

pub use builder::{Module, QRBuilder, QR};
pub use common::codec::{Mode, Segment, SegmentCache, Segmentation};
pub use common::error::{QRError, QRResult};
pub use common::mask::MaskPattern;
pub use common::metadata::{Color, ECLevel, Version};
