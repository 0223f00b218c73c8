use image::{GrayImage, Luma};
use std::ops::Deref;

use crate::common::bit_utils::BitStream;
use crate::common::iter::EncRegionIter;
use crate::common::mask::{compute_total_penalty, MaskPattern};
use crate::common::metadata::*;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Module {
    Empty,
    Func(Color),
    Version(Color),
    Format(Color),
    Data(Color),
}

impl Deref for Module {
    type Target = Color;
    fn deref(&self) -> &Self::Target {
        match self {
            Module::Empty => &Color::Light,
            Module::Func(c) => c,
            Module::Version(c) => c,
            Module::Format(c) => c,
            Module::Data(c) => c,
        }
    }
}

/// Square symbol grid with the version, level and mask it was built with.
#[derive(Debug, Clone)]
pub struct QR {
    grid: Vec<Module>,
    w: usize,
    ver: Version,
    ecl: ECLevel,
    mask: Option<MaskPattern>,
}

// QR type for builder
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn new(ver: Version, ecl: ECLevel) -> Self {
        let w = ver.width();
        Self { grid: vec![Module::Empty; w * w], w, ver, ecl, mask: None }
    }

    pub fn grid(&self) -> &[Module] {
        &self.grid
    }

    pub fn version(&self) -> Version {
        self.ver
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ecl
    }

    pub fn mask(&self) -> Option<MaskPattern> {
        self.mask
    }

    pub fn count_dark_modules(&self) -> usize {
        self.grid.iter().filter(|&m| matches!(**m, Color::Dark)).count()
    }

    /// Total mask penalty of the grid as it stands.
    pub fn penalty(&self) -> u32 {
        compute_total_penalty(self)
    }

    pub fn is_dark(&self, r: i16, c: i16) -> bool {
        *self.get(r, c) == Color::Dark
    }

    /// Rows of the grid, `true` for dark modules.
    pub fn to_bits(&self) -> Vec<Vec<bool>> {
        self.grid.chunks(self.w).map(|row| row.iter().map(|m| **m == Color::Dark).collect()).collect()
    }

    #[cfg(test)]
    pub fn to_debug_str(&self) -> String {
        let w = self.w as i16;
        let mut res = String::with_capacity((w * (w + 1)) as usize);
        res.push('\n');
        for i in 0..w {
            for j in 0..w {
                let c = match self.get(i, j) {
                    Module::Empty => '.',
                    Module::Func(Color::Dark) => 'f',
                    Module::Func(Color::Light) => 'F',
                    Module::Version(Color::Dark) => 'v',
                    Module::Version(Color::Light) => 'V',
                    Module::Format(Color::Dark) => 'm',
                    Module::Format(Color::Light) => 'M',
                    Module::Data(Color::Dark) => 'd',
                    Module::Data(Color::Light) => 'D',
                };
                res.push(c);
            }
            res.push('\n');
        }
        res
    }

    fn coord_to_index(&self, r: i16, c: i16) -> usize {
        let w = self.w as i16;
        debug_assert!(-w <= r && r < w, "row should be greater than or equal to w");
        debug_assert!(-w <= c && c < w, "column should be greater than or equal to w");

        let r = if r < 0 { r + w } else { r };
        let c = if c < 0 { c + w } else { c };
        (r as usize) * self.w + c as usize
    }

    /// Module at row `r` and column `c`. Negative indices count from the far edge.
    pub fn get(&self, r: i16, c: i16) -> Module {
        self.grid[self.coord_to_index(r, c)]
    }

    pub(crate) fn get_mut(&mut self, r: i16, c: i16) -> &mut Module {
        let index = self.coord_to_index(r, c);
        &mut self.grid[index]
    }

    pub(crate) fn set(&mut self, r: i16, c: i16, module: Module) {
        *self.get_mut(r, c) = module;
    }
}

#[cfg(test)]
mod qr_util_tests {
    use crate::builder::{Module, QR};
    use crate::common::metadata::{Color, ECLevel, Version};

    fn qr_v1() -> QR {
        QR::new(Version::MIN, ECLevel::L)
    }

    #[test]
    fn test_index_wrap() {
        let mut qr = qr_v1();
        let w = qr.w as i16;
        qr.set(-1, -1, Module::Func(Color::Dark));
        assert_eq!(qr.get(w - 1, w - 1), Module::Func(Color::Dark));
        qr.set(0, 0, Module::Func(Color::Dark));
        assert_eq!(qr.get(-w, -w), Module::Func(Color::Dark));
    }

    #[test]
    fn test_to_bits() {
        let mut qr = qr_v1();
        qr.set(0, 1, Module::Data(Color::Dark));
        qr.set(2, 0, Module::Func(Color::Dark));
        let bits = qr.to_bits();
        assert_eq!(bits.len(), 21);
        assert!(bits.iter().all(|row| row.len() == 21));
        assert!(bits[0][1] && bits[2][0] && !bits[0][0]);
        assert!(qr.is_dark(0, 1));
        assert_eq!(qr.count_dark_modules(), 2);
    }

    #[test]
    #[should_panic]
    fn test_row_out_of_bound() {
        let qr = qr_v1();
        let w = qr.w as i16;
        qr.get(w, 0);
    }

    #[test]
    #[should_panic]
    fn test_col_out_of_bound() {
        let qr = qr_v1();
        let w = qr.w as i16;
        qr.get(0, w);
    }

    #[test]
    #[should_panic]
    fn test_row_index_overwrap() {
        let qr = qr_v1();
        let w = qr.w as i16;
        qr.get(-(w + 1), 0);
    }
}

// Finder pattern
//------------------------------------------------------------------------------

impl QR {
    fn draw_finder_patterns(&mut self) {
        let far = self.w as i16 - 4;
        for (r, c) in [(3, 3), (3, far), (far, 3)] {
            self.draw_finder_pattern_at(r, c);
        }
    }

    // Rings by distance from the centre: light at 2 and at 4 (separator).
    // The separator ring is clipped at the grid edge.
    fn draw_finder_pattern_at(&mut self, r: i16, c: i16) {
        let w = self.w as i16;
        for i in -4..=4i16 {
            for j in -4..=4i16 {
                let (y, x) = (r + i, c + j);
                if !(0..w).contains(&y) || !(0..w).contains(&x) {
                    continue;
                }
                let ring = i.abs().max(j.abs());
                self.set(y, x, Module::Func(Color::from(ring != 2 && ring != 4)));
            }
        }
    }
}


// Timing pattern
//------------------------------------------------------------------------------

impl QR {
    // Row 6 and column 6 between the finders. Cells already owned by an
    // alignment pattern are left as they are.
    fn draw_timing_pattern(&mut self) {
        let w = self.w as i16;
        for i in 8..w - 8 {
            let module = Module::Func(Color::from(i & 1 == 0));
            for (r, c) in [(6, i), (i, 6)] {
                if self.get(r, c) == Module::Empty {
                    self.set(r, c, module);
                }
            }
        }
    }
}


// Alignment pattern
//------------------------------------------------------------------------------

impl QR {
    fn draw_alignment_patterns(&mut self) {
        let poses = self.ver.alignment_pattern();
        for &r in poses {
            for &c in poses {
                self.draw_alignment_pattern_at(r, c)
            }
        }
    }

    // Drawn only where the whole 5x5 footprint is still free
    fn draw_alignment_pattern_at(&mut self, r: i16, c: i16) {
        let footprint_free =
            (-2..=2).all(|i| (-2..=2).all(|j| self.get(r + i, c + j) == Module::Empty));
        if !footprint_free {
            return;
        }
        for i in -2..=2i16 {
            for j in -2..=2i16 {
                let ring = i.abs().max(j.abs());
                self.set(r + i, c + j, Module::Func(Color::from(ring != 1)));
            }
        }
    }
}


// All function patterns
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn draw_all_function_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_alignment_patterns();
        self.draw_timing_pattern();
    }
}


// Format & version info
//------------------------------------------------------------------------------

impl QR {
    fn reserve_format_area(&mut self) {
        self.draw_format_info((1 << FORMAT_INFO_BIT_LEN) - 1);
    }

    fn draw_format_info(&mut self, format_info: u32) {
        for coords in [&FORMAT_INFO_COORDS_QR_MAIN, &FORMAT_INFO_COORDS_QR_SIDE] {
            self.draw_bits(format_info, coords, Module::Format);
        }
        self.set(-8, 8, Module::Format(Color::Dark));
    }

    fn draw_version_info(&mut self) {
        if *self.ver < 7 {
            return;
        }
        let ver_info = self.ver.info();
        for coords in [&VERSION_INFO_COORDS_BL, &VERSION_INFO_COORDS_TR] {
            self.draw_bits(ver_info, coords, Module::Version);
        }
    }

    // The first coordinate takes the most significant of `coords.len()` bits
    fn draw_bits(&mut self, bits: u32, coords: &[(i16, i16)], kind: fn(Color) -> Module) {
        let top = coords.len() - 1;
        for (i, &(r, c)) in coords.iter().enumerate() {
            let on = (bits >> (top - i)) & 1 == 1;
            self.set(r, c, kind(Color::from(on)));
        }
    }
}


// Encoding region
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn draw_encoding_region(&mut self, payload: BitStream) {
        self.draw_version_info();
        self.reserve_format_area();
        self.draw_payload(payload);

        debug_assert!(!self.grid.contains(&Module::Empty), "Empty module found in debug");
    }

    // Free cells in zigzag order take the payload bits, then light remainder bits
    fn draw_payload(&mut self, mut payload: BitStream) {
        let free = EncRegionIter::new(self.ver)
            .filter(|&(r, c)| self.get(r, c) == Module::Empty)
            .collect::<Vec<_>>();
        debug_assert!(payload.len() <= free.len(), "Payload exceeds encoding region");

        for (r, c) in free {
            let bit = payload.next().unwrap_or(false);
            self.set(r, c, Module::Data(Color::from(bit)));
        }
    }

    /// Flips data modules under `pattern` and writes the matching format info.
    pub(crate) fn apply_mask(&mut self, pattern: MaskPattern) {
        self.mask = Some(pattern);
        let mask_fn = pattern.mask_functions();
        let w = self.w;
        for (i, module) in self.grid.iter_mut().enumerate() {
            if let Module::Data(clr) = module {
                if mask_fn((i % w) as i16, (i / w) as i16) {
                    *clr = !*clr;
                }
            }
        }
        self.draw_format_info(format_info(self.ecl, pattern));
    }
}

#[cfg(test)]
mod encoding_region_tests {
    use crate::builder::{Module, QR};
    use crate::common::bit_utils::BitStream;
    use crate::common::mask::MaskPattern;
    use crate::common::metadata::{Color, ECLevel, Version};

    fn filled(ver: Version, ecl: ECLevel, byte: u8) -> QR {
        let mut qr = QR::new(ver, ecl);
        qr.draw_all_function_patterns();
        let mut payload = BitStream::new(ver.total_codewords() << 3);
        payload.extend(&vec![byte; ver.total_codewords()]);
        qr.draw_encoding_region(payload);
        qr
    }

    #[test]
    fn test_data_module_count() {
        for v in [1, 2, 6, 7, 14, 21, 40] {
            let ver = Version::new(v).unwrap();
            let qr = filled(ver, ECLevel::L, 0xFF);
            let data_cnt = qr.grid().iter().filter(|m| matches!(m, Module::Data(_))).count();
            assert_eq!(data_cnt, ver.total_codewords() * 8 + ver.remainder_bits());
            let dark_data_cnt = qr.grid().iter().filter(|m| **m == Module::Data(Color::Dark)).count();
            assert_eq!(dark_data_cnt, ver.total_codewords() * 8);
        }
    }

    #[test]
    fn test_first_codeword_placement() {
        let qr = filled(Version::MIN, ECLevel::L, 0b1010_0000);
        // First codeword climbs the rightmost column pair from the bottom right
        assert_eq!(qr.get(-1, -1), Module::Data(Color::Dark));
        assert_eq!(qr.get(-1, -2), Module::Data(Color::Light));
        assert_eq!(qr.get(-2, -1), Module::Data(Color::Dark));
        assert_eq!(qr.get(-2, -2), Module::Data(Color::Light));
        assert_eq!(qr.get(-3, -1), Module::Data(Color::Light));
    }

    #[test]
    fn test_apply_mask_flips_only_data() {
        let base = filled(Version::new(2).unwrap(), ECLevel::M, 0);
        let mut masked = base.clone();
        let mask = MaskPattern::new(1).unwrap();
        masked.apply_mask(mask);
        assert_eq!(masked.mask(), Some(mask));
        let w = base.width() as i16;
        for r in 0..w {
            for c in 0..w {
                match (base.get(r, c), masked.get(r, c)) {
                    (Module::Data(a), Module::Data(b)) => assert_eq!(a != b, r & 1 == 0),
                    (Module::Format(_), Module::Format(_)) => {}
                    (a, b) => assert_eq!(a, b),
                }
            }
        }
    }
}

// Render
//------------------------------------------------------------------------------

const QUIET_ZONE: usize = 4;

impl QR {
    /// Grayscale image with `module_sz` pixels per module and a 4 module quiet zone.
    pub fn render(&self, module_sz: u32) -> GrayImage {
        let side = (self.w + 2 * QUIET_ZONE) as u32 * module_sz;
        GrayImage::from_fn(side, side, |x, y| {
            let (r, c) = ((y / module_sz) as usize, (x / module_sz) as usize);
            self.color_at(r, c).select(Luma([255]), Luma([0]))
        })
    }

    /// Block characters for terminals with a dark background: light modules
    /// print as full blocks.
    pub fn to_str(&self, module_sz: usize) -> String {
        let side = (self.w + 2 * QUIET_ZONE) * module_sz;
        let mut canvas = String::with_capacity(side * (side * 3 + 1));
        for y in 0..side {
            let row = (0..side).map(|x| self.color_at(y / module_sz, x / module_sz));
            canvas.extend(row.map(|clr| clr.select('█', ' ')));
            canvas.push('\n');
        }
        canvas
    }

    // Color of a module in quiet zone padded coordinates
    fn color_at(&self, r: usize, c: usize) -> Color {
        let in_symbol = |i: usize| (QUIET_ZONE..QUIET_ZONE + self.w).contains(&i);
        if in_symbol(r) && in_symbol(c) {
            *self.get((r - QUIET_ZONE) as i16, (c - QUIET_ZONE) as i16)
        } else {
            Color::Light
        }
    }
}

#[cfg(test)]
mod render_tests {
    use crate::builder::{Module, QR};
    use crate::common::metadata::{Color, ECLevel, Version};

    #[test]
    fn test_render() {
        let mut qr = QR::new(Version::MIN, ECLevel::L);
        qr.set(0, 0, Module::Func(Color::Dark));
        let img = qr.render(2);
        assert_eq!(img.dimensions(), (58, 58));
        assert_eq!(img.get_pixel(8, 8).0, [0]);
        assert_eq!(img.get_pixel(9, 9).0, [0]);
        assert_eq!(img.get_pixel(10, 8).0, [255]);
        assert_eq!(img.get_pixel(0, 0).0, [255]);
    }

    #[test]
    fn test_to_str() {
        let mut qr = QR::new(Version::MIN, ECLevel::L);
        qr.set(0, 0, Module::Func(Color::Dark));
        let s = qr.to_str(1);
        let lines = s.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 29);
        assert!(lines.iter().all(|l| l.chars().count() == 29));
        assert_eq!(lines[4].chars().nth(4), Some(' '));
        assert_eq!(lines[4].chars().nth(5), Some('█'));
    }
}
