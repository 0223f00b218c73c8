use std::ops::{Deref, Not};

use super::codec::Mode;
use super::error::{QRError, QRResult};
use super::mask::MaskPattern;

// Color
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum Color {
    Light,
    Dark,
}

impl Color {
    pub fn select<T>(self, light: T, dark: T) -> T {
        match self {
            Self::Light => light,
            Self::Dark => dark,
        }
    }
}

impl Not for Color {
    type Output = Self;
    fn not(self) -> Self::Output {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl From<bool> for Color {
    fn from(bit: bool) -> Self {
        if bit {
            Self::Dark
        } else {
            Self::Light
        }
    }
}

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
    H = 3,
}

impl ECLevel {
    /// Fallback order when no level is requested: most redundant first.
    pub const DESCENDING: [ECLevel; 4] = [ECLevel::H, ECLevel::Q, ECLevel::M, ECLevel::L];
}

// Version
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub struct Version(usize);

impl Deref for Version {
    type Target = usize;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Version {
    pub const MIN: Version = Version(1);
    pub const MAX: Version = Version(40);

    pub fn new(version: usize) -> QRResult<Self> {
        match version {
            1..=40 => Ok(Self(version)),
            _ => Err(QRError::InvalidVersion(version)),
        }
    }

    pub fn all() -> impl DoubleEndedIterator<Item = Version> {
        (1..=40).map(Version)
    }

    pub const fn width(self) -> usize {
        self.0 * 4 + 17
    }

    pub fn alignment_pattern(self) -> &'static [i16] {
        ALIGNMENT_PATTERN_POSITIONS[self.0]
    }

    /// 18-bit version information word, zero below version 7.
    pub fn info(self) -> u32 {
        match self.0 {
            7..=40 => VERSION_INFOS[self.0 - 7],
            _ => 0,
        }
    }

    pub fn total_codewords(self) -> usize {
        RAW_DATA_MODULES[self.0] >> 3
    }

    pub fn remainder_bits(self) -> usize {
        RAW_DATA_MODULES[self.0] & 7
    }

    pub fn block_count(self, ecl: ECLevel) -> usize {
        ERROR_CORRECTION_BLOCKS[ecl as usize][self.0]
    }

    pub fn ecc_per_block(self, ecl: ECLevel) -> usize {
        ECC_CODEWORDS_PER_BLOCK[ecl as usize][self.0]
    }

    pub fn data_capacity(self, ecl: ECLevel) -> usize {
        self.total_codewords() - self.block_count(ecl) * self.ecc_per_block(ecl)
    }

    pub fn data_bit_capacity(self, ecl: ECLevel) -> usize {
        self.data_capacity(ecl) << 3
    }

    /// Returns (short block size, short block count, long block size, long block count).
    pub fn data_codewords_per_block(self, ecl: ECLevel) -> (usize, usize, usize, usize) {
        let blocks = self.block_count(ecl);
        let data = self.data_capacity(ecl);
        let short_size = data / blocks;
        let long_count = data % blocks;
        let long_size = if long_count > 0 { short_size + 1 } else { 0 };
        (short_size, blocks - long_count, long_size, long_count)
    }

    pub fn char_cnt_bits(self, mode: Mode) -> usize {
        match (mode, self.0) {
            (Mode::Numeric, 1..=9) => 10,
            (Mode::Numeric, 10..=26) => 12,
            (Mode::Numeric, _) => 14,
            (Mode::Alphanumeric, 1..=9) => 9,
            (Mode::Alphanumeric, 10..=26) => 11,
            (Mode::Alphanumeric, _) => 13,
            (Mode::Byte, 1..=9) => 8,
            (Mode::Byte, _) => 16,
        }
    }

    /// Smallest version whose data capacity at `ecl` holds `bit_len` bits.
    pub fn version_for(ecl: ECLevel, bit_len: usize) -> Option<Version> {
        Self::all().find(|v| v.data_bit_capacity(ecl) >= bit_len)
    }
}


// Format information
//------------------------------------------------------------------------------

/// 15-bit BCH protected format word for a level and mask, already XOR-ed with 0x5412.
pub fn format_info(ecl: ECLevel, mask: MaskPattern) -> u32 {
    FORMAT_INFOS[ecl as usize][*mask as usize]
}


// Global constants
//------------------------------------------------------------------------------

pub const MODE_INDICATOR_BIT_LEN: usize = 4;

pub const FORMAT_INFO_BIT_LEN: usize = 15;

// Bits 14 down to 0 around the top left finder
pub static FORMAT_INFO_COORDS_QR_MAIN: [(i16, i16); 15] = [
    (8, 0),
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 7),
    (8, 8),
    (7, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
    (0, 8),
];

// Bits 14 down to 0 split between the bottom left and top right finders
pub static FORMAT_INFO_COORDS_QR_SIDE: [(i16, i16); 15] = [
    (-1, 8),
    (-2, 8),
    (-3, 8),
    (-4, 8),
    (-5, 8),
    (-6, 8),
    (-7, 8),
    (8, -8),
    (8, -7),
    (8, -6),
    (8, -5),
    (8, -4),
    (8, -3),
    (8, -2),
    (8, -1),
];

// Bits 17 down to 0
pub static VERSION_INFO_COORDS_BL: [(i16, i16); 18] = [
    (-9, 5),
    (-10, 5),
    (-11, 5),
    (-9, 4),
    (-10, 4),
    (-11, 4),
    (-9, 3),
    (-10, 3),
    (-11, 3),
    (-9, 2),
    (-10, 2),
    (-11, 2),
    (-9, 1),
    (-10, 1),
    (-11, 1),
    (-9, 0),
    (-10, 0),
    (-11, 0),
];

pub static VERSION_INFO_COORDS_TR: [(i16, i16); 18] = [
    (5, -9),
    (5, -10),
    (5, -11),
    (4, -9),
    (4, -10),
    (4, -11),
    (3, -9),
    (3, -10),
    (3, -11),
    (2, -9),
    (2, -10),
    (2, -11),
    (1, -9),
    (1, -10),
    (1, -11),
    (0, -9),
    (0, -10),
    (0, -11),
];

static FORMAT_INFOS: [[u32; 8]; 4] = [
    [0x77C4, 0x72F3, 0x7DAA, 0x789D, 0x662F, 0x6318, 0x6C41, 0x6976],
    [0x5412, 0x5125, 0x5E7C, 0x5B4B, 0x45F9, 0x40CE, 0x4F97, 0x4AA0],
    [0x355F, 0x3068, 0x3F31, 0x3A06, 0x24B4, 0x2183, 0x2EDA, 0x2BED],
    [0x1689, 0x13BE, 0x1CE7, 0x19D0, 0x0762, 0x0255, 0x0D0C, 0x083B],
];

static VERSION_INFOS: [u32; 34] = [
    0x07C94, 0x085BC, 0x09A99, 0x0A4D3, 0x0BBF6, 0x0C762, 0x0D847, 0x0E60D, 0x0F928, 0x10B78,
    0x1145D, 0x12A17, 0x13532, 0x149A6, 0x15683, 0x168C9, 0x177EC, 0x18EC4, 0x191E1, 0x1AFAB,
    0x1B08E, 0x1CC1A, 0x1D33F, 0x1ED75, 0x1F250, 0x209D5, 0x216F0, 0x228BA, 0x2379F, 0x24B0B,
    0x2542E, 0x26A64, 0x27541, 0x28C69,
];

static ALIGNMENT_PATTERN_POSITIONS: [&[i16]; 41] = [
    &[],
    &[],
    &[6, 18],
    &[6, 22],
    &[6, 26],
    &[6, 30],
    &[6, 34],
    &[6, 22, 38],
    &[6, 24, 42],
    &[6, 26, 46],
    &[6, 28, 50],
    &[6, 30, 54],
    &[6, 32, 58],
    &[6, 34, 62],
    &[6, 26, 46, 66],
    &[6, 26, 48, 70],
    &[6, 26, 50, 74],
    &[6, 30, 54, 78],
    &[6, 30, 56, 82],
    &[6, 30, 58, 86],
    &[6, 34, 62, 90],
    &[6, 28, 50, 72, 94],
    &[6, 26, 50, 74, 98],
    &[6, 30, 54, 78, 102],
    &[6, 28, 54, 80, 106],
    &[6, 32, 58, 84, 110],
    &[6, 30, 58, 86, 114],
    &[6, 34, 62, 90, 118],
    &[6, 26, 50, 74, 98, 122],
    &[6, 30, 54, 78, 102, 126],
    &[6, 26, 52, 78, 104, 130],
    &[6, 30, 56, 82, 108, 134],
    &[6, 34, 60, 86, 112, 138],
    &[6, 30, 58, 86, 114, 142],
    &[6, 34, 62, 90, 118, 146],
    &[6, 30, 54, 78, 102, 126, 150],
    &[6, 24, 50, 76, 102, 128, 154],
    &[6, 28, 54, 80, 106, 132, 158],
    &[6, 32, 58, 84, 110, 136, 162],
    &[6, 26, 54, 82, 110, 138, 166],
    &[6, 30, 58, 86, 114, 142, 170],
];

// Indexed by [ECLevel][version], version 0 unused
static ECC_CODEWORDS_PER_BLOCK: [[usize; 41]; 4] = [
    [
        0, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
    [
        0, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ],
    [
        0, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
    [
        0, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
];

static ERROR_CORRECTION_BLOCKS: [[usize; 41]; 4] = [
    [
        0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12, 13,
        14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ],
    [
        0, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ],
    [
        0, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27, 29,
        34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ],
    [
        0, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ],
];

// Modules left for codewords once every function pattern is drawn
static RAW_DATA_MODULES: [usize; 41] = raw_data_modules_table();

const fn raw_data_modules_table() -> [usize; 41] {
    let mut table = [0; 41];
    let mut v = 1;
    while v <= 40 {
        let mut modules = (16 * v + 128) * v + 64;
        if v >= 2 {
            let align = v / 7 + 2;
            modules -= (25 * align - 10) * align - 55;
            if v >= 7 {
                modules -= 36;
            }
        }
        table[v] = modules;
        v += 1;
    }
    table
}
