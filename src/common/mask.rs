use std::ops::Deref;

use tracing::{debug, trace};

use super::error::{QRError, QRResult};
use super::metadata::Color;
use crate::builder::QR;

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> QRResult<Self> {
        if pattern < 8 {
            Ok(Self(pattern))
        } else {
            Err(QRError::InvalidMaskingPattern(pattern))
        }
    }

    pub fn all() -> impl Iterator<Item = MaskPattern> {
        (0..8).map(MaskPattern)
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// x is the column, y the row
mod mask_functions {
    pub fn checkerboard(x: i16, y: i16) -> bool {
        (x + y) & 1 == 0
    }

    pub fn horizontal_lines(_: i16, y: i16) -> bool {
        y & 1 == 0
    }

    pub fn vertical_lines(x: i16, _: i16) -> bool {
        x % 3 == 0
    }

    pub fn diagonal_lines(x: i16, y: i16) -> bool {
        (x + y) % 3 == 0
    }

    pub fn large_checkerboard(x: i16, y: i16) -> bool {
        ((y >> 1) + (x / 3)) & 1 == 0
    }

    pub fn fields(x: i16, y: i16) -> bool {
        let p = x as i32 * y as i32;
        (p & 1) + (p % 3) == 0
    }

    pub fn diamonds(x: i16, y: i16) -> bool {
        let p = x as i32 * y as i32;
        ((p & 1) + (p % 3)) & 1 == 0
    }

    pub fn meadow(x: i16, y: i16) -> bool {
        let p = x as i32 * y as i32;
        (((x + y) as i32 & 1) + (p % 3)) & 1 == 0
    }
}

impl MaskPattern {
    pub fn mask_functions(self) -> fn(i16, i16) -> bool {
        match *self {
            0b000 => mask_functions::checkerboard,
            0b001 => mask_functions::horizontal_lines,
            0b010 => mask_functions::vertical_lines,
            0b011 => mask_functions::diagonal_lines,
            0b100 => mask_functions::large_checkerboard,
            0b101 => mask_functions::fields,
            0b110 => mask_functions::diamonds,
            _ => mask_functions::meadow,
        }
    }
}


// Mask selection
//------------------------------------------------------------------------------

/// Scores every mask on a copy of `qr`, applies the lowest penalty one (lowest
/// index on ties) and returns it with its penalty.
pub fn apply_best_mask(qr: &mut QR) -> (MaskPattern, u32) {
    let score = |m: MaskPattern| {
        let mut candidate = qr.clone();
        candidate.apply_mask(m);
        let penalty = compute_total_penalty(&candidate);
        trace!("Mask {} penalty {penalty}", *m);
        (penalty, m)
    };

    // Mask 0 seeds the search so there is always a winner
    let seed = score(MaskPattern(0));

    #[cfg(feature = "parallel")]
    let (penalty, mask) = {
        use rayon::prelude::*;
        let rest = MaskPattern::all().skip(1).collect::<Vec<_>>();
        rest.into_par_iter().map(score).reduce(|| seed, std::cmp::min)
    };
    #[cfg(not(feature = "parallel"))]
    let (penalty, mask) = MaskPattern::all().skip(1).map(score).fold(seed, std::cmp::min);

    debug!("Selected mask {} with penalty {penalty}", *mask);
    qr.apply_mask(mask);
    (mask, penalty)
}

#[cfg(test)]
mod best_mask_tests {
    use super::{apply_best_mask, MaskPattern};
    use crate::builder::QR;
    use crate::common::bit_utils::BitStream;
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_apply_best_mask_picks_lowest_penalty() {
        let ver = Version::new(2).unwrap();
        let mut qr = QR::new(ver, ECLevel::M);
        qr.draw_all_function_patterns();
        let mut payload = BitStream::new(ver.total_codewords() << 3);
        payload.extend(&(0..ver.total_codewords() as u8).collect::<Vec<_>>());
        qr.draw_encoding_region(payload);
        let unmasked = qr.clone();

        let (mask, penalty) = apply_best_mask(&mut qr);
        assert_eq!(qr.mask(), Some(mask));
        assert_eq!(qr.penalty(), penalty);
        for m in MaskPattern::all() {
            let mut other = unmasked.clone();
            other.apply_mask(m);
            let other_penalty = other.penalty();
            assert!(other_penalty > penalty || (other_penalty == penalty && m >= mask), "Mask {}", *m);
        }
    }
}

pub fn compute_total_penalty(qr: &QR) -> u32 {
    let w = qr.width() as i16;
    let rows = (0..w).map(|r| (0..w).map(|c| *qr.get(r, c)).collect::<Vec<_>>()).collect::<Vec<_>>();
    let cols = (0..w).map(|c| (0..w).map(|r| *qr.get(r, c)).collect::<Vec<_>>()).collect::<Vec<_>>();

    let adj_pen = rows.iter().chain(cols.iter()).map(|l| compute_adjacent_penalty(l)).sum::<u32>();
    let blk_pen = compute_block_penalty(&rows);
    let fp_pen = rows.iter().chain(cols.iter()).map(|l| compute_finder_pattern_penalty(l)).sum::<u32>();
    let bal_pen = compute_balance_penalty(qr);
    adj_pen + blk_pen + fp_pen + bal_pen
}

// Rule 1: every maximal run of 5 or more scores its length minus 2
fn compute_adjacent_penalty(line: &[Color]) -> u32 {
    let mut pen = 0;
    let mut run = 0;
    for (i, clr) in line.iter().enumerate() {
        run += 1;
        if line.get(i + 1) != Some(clr) {
            if run >= 5 {
                pen += run - 2;
            }
            run = 0;
        }
    }
    pen
}

// Rule 2: every 2x2 block of one color, overlaps included
fn compute_block_penalty(rows: &[Vec<Color>]) -> u32 {
    rows.windows(2)
        .map(|pair| {
            (0..pair[0].len().saturating_sub(1))
                .filter(|&c| {
                    let clr = pair[0][c];
                    clr == pair[0][c + 1] && clr == pair[1][c] && clr == pair[1][c + 1]
                })
                .count() as u32
                * 3
        })
        .sum()
}

// Rule 3: 1:1:3:1:1 finder lookalikes with four light modules on either side.
// Modules beyond the edge count as light quiet zone.
fn compute_finder_pattern_penalty(line: &[Color]) -> u32 {
    static PATTERN: [Color; 7] = [
        Color::Dark,
        Color::Light,
        Color::Dark,
        Color::Dark,
        Color::Dark,
        Color::Light,
        Color::Dark,
    ];
    let w = line.len() as isize;
    let is_light = |i: isize| i < 0 || i >= w || line[i as usize] == Color::Light;

    let mut pen = 0;
    for (j, window) in line.windows(7).enumerate() {
        if window != PATTERN {
            continue;
        }
        let j = j as isize;
        if (j - 4..j).all(is_light) {
            pen += 40;
        }
        if (j + 7..j + 11).all(is_light) {
            pen += 40;
        }
    }
    pen
}

// Rule 4: twice the distance of the rounded dark percentage from 50
fn compute_balance_penalty(qr: &QR) -> u32 {
    let dark_cnt = qr.count_dark_modules();
    let w = qr.width();
    let tot = w * w;
    let pct = (dark_cnt * 200 + tot) / (tot * 2);
    (pct.abs_diff(50) * 2) as u32
}

#[cfg(test)]
mod penalty_tests {
    use super::{compute_adjacent_penalty, compute_block_penalty, compute_finder_pattern_penalty};
    use crate::common::metadata::Color;

    fn line(s: &str) -> Vec<Color> {
        s.chars().map(|c| Color::from(c == '1')).collect()
    }

    #[test]
    fn test_adjacent_penalty() {
        assert_eq!(compute_adjacent_penalty(&line("1111")), 0);
        assert_eq!(compute_adjacent_penalty(&line("11111")), 3);
        assert_eq!(compute_adjacent_penalty(&line("0111111")), 4);
        assert_eq!(compute_adjacent_penalty(&line("000001111111")), 3 + 5);
        assert_eq!(compute_adjacent_penalty(&line("0101010101")), 0);
    }

    #[test]
    fn test_block_penalty() {
        let rows = vec![line("110"), line("110"), line("111")];
        assert_eq!(compute_block_penalty(&rows), 3 + 3);
        let rows = vec![line("000"), line("000")];
        assert_eq!(compute_block_penalty(&rows), 6);
        let rows = vec![line("01"), line("10")];
        assert_eq!(compute_block_penalty(&rows), 0);
    }

    #[test]
    fn test_finder_pattern_penalty() {
        assert_eq!(compute_finder_pattern_penalty(&line("000010111010000")), 80);
        assert_eq!(compute_finder_pattern_penalty(&line("1111101110101111")), 0);
        assert_eq!(compute_finder_pattern_penalty(&line("10111010000")), 80);
        assert_eq!(compute_finder_pattern_penalty(&line("110111011")), 0);
        assert_eq!(compute_finder_pattern_penalty(&line("0000101110110000")), 40);
    }
}
