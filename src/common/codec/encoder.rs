pub use assemble::encode;

// Mode encoder
//------------------------------------------------------------------------------

pub mod encode {
    use crate::common::bit_utils::BitStream;
    use crate::common::codec::{Mode, Segment};
    use crate::common::error::{QRError, QRResult};
    use crate::common::metadata::{Version, MODE_INDICATOR_BIT_LEN};

    /// Packs `content` in `mode` without the header.
    pub fn encode_data(content: &str, mode: Mode) -> QRResult<BitStream> {
        let mut out = BitStream::unbounded();
        match mode {
            Mode::Numeric => push_numeric_data(content, &mut out)?,
            Mode::Alphanumeric => push_alphanumeric_data(content, &mut out)?,
            Mode::Byte => push_byte_data(content, &mut out),
        }
        Ok(out)
    }

    /// Mode indicator, character count and packed payload for one segment.
    pub fn encode_segment(content: &str, mode: Mode, ver: Version) -> QRResult<BitStream> {
        let data = encode_data(content, mode)?;
        let count = match mode {
            Mode::Byte => content.len(),
            Mode::Numeric | Mode::Alphanumeric => content.chars().count(),
        };
        let mut out = BitStream::unbounded();
        push_header(mode, count, ver, &mut out)?;
        out.append(&data);
        Ok(out)
    }

    pub fn encode_segmentation(msg: &str, segs: &[Segment], ver: Version) -> QRResult<BitStream> {
        let mut out = BitStream::unbounded();
        for seg in segs {
            out.append(&encode_segment(seg.content(msg), seg.mode, ver)?);
        }
        Ok(out)
    }

    fn push_header(mode: Mode, count: usize, ver: Version, out: &mut BitStream) -> QRResult<()> {
        let bits = ver.char_cnt_bits(mode);
        if count >= 1 << bits {
            return Err(QRError::DataTooLong { count, bits });
        }
        out.push_bits(mode as u8, MODE_INDICATOR_BIT_LEN);
        out.push_bits(count as u16, bits);
        Ok(())
    }

    fn push_numeric_data(data: &str, out: &mut BitStream) -> QRResult<()> {
        if let Some(ch) = data.chars().find(|&c| !Mode::Numeric.contains(c)) {
            return Err(QRError::ModeMismatch(ch, Mode::Numeric));
        }
        for chunk in data.as_bytes().chunks(3) {
            let len = (chunk.len() * 10 + 2) / 3;
            out.push_bits(Mode::Numeric.encode_chunk(chunk), len);
        }
        Ok(())
    }

    fn push_alphanumeric_data(data: &str, out: &mut BitStream) -> QRResult<()> {
        if let Some(ch) = data.chars().find(|&c| !Mode::Alphanumeric.contains(c)) {
            return Err(QRError::ModeMismatch(ch, Mode::Alphanumeric));
        }
        for chunk in data.as_bytes().chunks(2) {
            let len = (chunk.len() * 11 + 1) / 2;
            out.push_bits(Mode::Alphanumeric.encode_chunk(chunk), len);
        }
        Ok(())
    }

    fn push_byte_data(data: &str, out: &mut BitStream) {
        out.extend(data.as_bytes());
    }

}

// Codeword assembler
//------------------------------------------------------------------------------

pub mod assemble {
    use tracing::{debug, trace};

    use crate::common::bit_utils::BitStream;
    use crate::common::codec::{Segment, Segmentation, PADDING_CODEWORDS};
    use crate::common::error::{QRError, QRResult};
    use crate::common::metadata::{ECLevel, Version};

    use super::encode::encode_segmentation;

    // Count field widths change at most twice across 1..=40
    const MAX_FIT_ROUNDS: usize = 3;

    /// Picks the segmentation with the smallest resolved version at `ecl` and
    /// returns it padded to that version's capacity. The resolved version is
    /// never below `requested` but may exceed it.
    pub fn encode(
        msg: &str,
        plans: &[Segmentation],
        ecl: ECLevel,
        requested: Option<Version>,
    ) -> QRResult<(BitStream, Version)> {
        let (_, mut bits, ver) = plans
            .iter()
            .enumerate()
            .filter_map(|(i, segs)| match fit_segmentation(msg, segs, ecl, requested) {
                Ok((bits, ver)) => {
                    trace!("Segmentation {i} fits version {} with {} bits", *ver, bits.len());
                    Some((i, bits, ver))
                }
                Err(e) => {
                    trace!("Segmentation {i} discarded: {e}");
                    None
                }
            })
            .min_by_key(|(i, bits, ver)| (*ver, bits.len(), *i))
            .ok_or(QRError::UnableToEncode)?;

        debug!("Encoded {} bits at version {} level {ecl:?}", bits.len(), *ver);
        bits.set_capacity(ver.data_bit_capacity(ecl));
        push_terminator(&mut bits);
        pad_remaining_capacity(&mut bits);
        Ok((bits, ver))
    }

    // Re-encodes until the count field widths agree with the version the bits
    // fit in, so the returned bits are exactly what that version would carry.
    pub(crate) fn fit_segmentation(
        msg: &str,
        segs: &[Segment],
        ecl: ECLevel,
        requested: Option<Version>,
    ) -> QRResult<(BitStream, Version)> {
        let floor = requested.unwrap_or(Version::MIN).max(count_field_floor(msg, segs)?);
        let mut trial = floor;
        for _ in 0..MAX_FIT_ROUNDS {
            let bits = encode_segmentation(msg, segs, trial)?;
            let fit = Version::version_for(ecl, bits.len()).ok_or(QRError::UnableToEncode)?;
            let fit = fit.max(floor);
            if same_count_widths(fit, trial) {
                return Ok((bits, fit));
            }
            trial = fit;
        }
        Err(QRError::UnableToEncode)
    }

    // Smallest version whose count fields hold every segment's count
    fn count_field_floor(msg: &str, segs: &[Segment]) -> QRResult<Version> {
        [1, 10, 27]
            .into_iter()
            .filter_map(|v| Version::new(v).ok())
            .find(|v| segs.iter().all(|s| s.char_count(msg) < 1 << v.char_cnt_bits(s.mode)))
            .ok_or(QRError::UnableToEncode)
    }

    fn same_count_widths(a: Version, b: Version) -> bool {
        let band = |v: Version| match *v {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        };
        band(a) == band(b)
    }

    pub fn push_terminator(out: &mut BitStream) {
        let bit_len = out.len();
        let bit_capacity = out.capacity();
        if bit_len < bit_capacity {
            let term_len = std::cmp::min(4, bit_capacity - bit_len);
            out.push_bits(0u8, term_len);
        }
    }

    pub fn pad_remaining_capacity(out: &mut BitStream) {
        push_padding_bits(out);
        push_padding_codewords(out);
    }

    fn push_padding_bits(out: &mut BitStream) {
        let offset = out.len() & 7;
        if offset > 0 {
            out.push_bits(0u8, 8 - offset);
        }
    }

    fn push_padding_codewords(out: &mut BitStream) {
        debug_assert!(
            out.len() & 7 == 0,
            "Bit offset should be zero before padding codewords: {}",
            out.len() & 7
        );

        let remain_byte_capacity = (out.capacity() - out.len()) >> 3;
        PADDING_CODEWORDS.iter().copied().cycle().take(remain_byte_capacity).for_each(|pc| {
            out.push_bits(pc, 8);
        });
    }

    #[cfg(test)]
    mod assemble_tests {
        use test_case::test_case;

        use super::{encode, fit_segmentation, pad_remaining_capacity, push_terminator};
        use crate::common::bit_utils::BitStream;
        use crate::common::codec::{plan, Mode, Segment, PADDING_CODEWORDS};
        use crate::common::error::QRError;
        use crate::common::metadata::{ECLevel, Version};

        #[test]
        fn test_push_terminator() {
            let mut bs = BitStream::new(152);
            bs.push_bits(0b1u8, 1);
            push_terminator(&mut bs);
            assert_eq!(bs.data(), [0b10000000]);
            assert_eq!(bs.len(), 5);

            let mut bs = BitStream::new(10);
            bs.push_bits(0b11111111u8, 8);
            push_terminator(&mut bs);
            assert_eq!(bs.len(), 10);
        }

        #[test]
        fn test_pad_remaining_capacity() {
            let mut bs = BitStream::new(152);
            bs.push_bits(0b1u8, 1);
            pad_remaining_capacity(&mut bs);
            let mut output = vec![0b10000000];
            output.extend(PADDING_CODEWORDS.iter().cycle().take(18));
            assert_eq!(bs.data(), output);
            assert_eq!(bs.len(), 152);
        }

        #[test]
        fn test_hello_world_codewords() {
            let msg = "HELLO WORLD";
            let plans = plan(msg).unwrap();
            let (bits, ver) = encode(msg, &plans, ECLevel::Q, None).unwrap();
            assert_eq!(ver, Version::MIN);
            assert_eq!(bits.data(), b" [\x0bx\xd1r\xdcMC@\xec\x11\xec");
        }

        #[test]
        fn test_hello_world_codewords_m() {
            let msg = "HELLO WORLD";
            let plans = plan(msg).unwrap();
            let (bits, _) = encode(msg, &plans, ECLevel::M, None).unwrap();
            assert_eq!(bits.data(), b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11");
        }

        #[test_case("1", ECLevel::H)]
        #[test_case("HELLO WORLD", ECLevel::Q)]
        #[test_case("Hello, world!", ECLevel::L)]
        #[test_case("Tel: 555-1234 ok", ECLevel::M)]
        fn test_padded_len_is_capacity(msg: &str, ecl: ECLevel) {
            let plans = plan(msg).unwrap();
            let (bits, ver) = encode(msg, &plans, ecl, None).unwrap();
            assert_eq!(bits.len(), ver.data_bit_capacity(ecl));
        }

        #[test]
        fn test_picks_smallest_version() {
            // Native runs beat whole byte mode
            let msg = "0".repeat(30) + "abc";
            let plans = plan(&msg).unwrap();
            let (bits, ver) = encode(&msg, &plans, ECLevel::H, None).unwrap();
            assert_eq!(ver, Version::new(3).unwrap());
            assert_eq!(bits.data()[0] >> 4, Mode::Numeric as u8);
        }

        #[test]
        fn test_tie_prefers_shorter_bits() {
            // Both plans fit version 1 at L; native runs are shorter
            let msg = "12345a";
            let plans = plan(msg).unwrap();
            let (bits, ver) = encode(msg, &plans, ECLevel::L, None).unwrap();
            assert_eq!(ver, Version::MIN);
            assert_eq!(bits.data()[0] >> 4, Mode::Numeric as u8);
        }

        #[test]
        fn test_requested_version_promotes() {
            let msg = "HELLO";
            let plans = plan(msg).unwrap();
            let req = Version::new(12).unwrap();
            let (bits, ver) = encode(msg, &plans, ECLevel::L, Some(req)).unwrap();
            assert_eq!(ver, req);
            assert_eq!(bits.len(), req.data_bit_capacity(ECLevel::L));
            // Alphanumeric count field is 11 bits from version 10
            assert_eq!(&bits.to_string()[4..15], "00000000101");
        }

        #[test]
        fn test_requested_version_too_small() {
            let msg = "A".repeat(100);
            let plans = plan(&msg).unwrap();
            let (_, ver) = encode(&msg, &plans, ECLevel::H, Some(Version::MIN)).unwrap();
            assert!(ver > Version::MIN);
        }

        #[test]
        fn test_crosses_count_band() {
            let msg = "1".repeat(552);
            let segs = [Segment::new(Mode::Numeric, 0, msg.len())];
            let (bits, ver) = fit_segmentation(&msg, &segs, ECLevel::L, None).unwrap();
            assert_eq!(bits.len(), 4 + 10 + 552 / 3 * 10);
            assert_eq!(ver, Version::new(9).unwrap());

            // Fits version 10 only once re-encoded with the 12 bit count field
            let msg = "1".repeat(600);
            let segs = [Segment::new(Mode::Numeric, 0, msg.len())];
            let (bits, ver) = fit_segmentation(&msg, &segs, ECLevel::L, None).unwrap();
            assert_eq!(bits.len(), 4 + 12 + 200 * 10);
            assert_eq!(ver, Version::new(10).unwrap());

            // Count alone rules out versions below 10
            let msg = "1".repeat(1024);
            let segs = [Segment::new(Mode::Numeric, 0, msg.len())];
            let (bits, ver) = fit_segmentation(&msg, &segs, ECLevel::L, None).unwrap();
            assert_eq!(bits.len(), 4 + 12 + 341 * 10 + 4);
            assert_eq!(ver, Version::new(14).unwrap());
        }

        #[test]
        fn test_unable_to_encode() {
            let msg = "a".repeat(2954);
            let plans = plan(&msg).unwrap();
            assert_eq!(encode(&msg, &plans, ECLevel::L, None), Err(QRError::UnableToEncode));
            let msg = "a".repeat(2953);
            let plans = plan(&msg).unwrap();
            let (_, ver) = encode(&msg, &plans, ECLevel::L, None).unwrap();
            assert_eq!(ver, Version::MAX);
        }

        #[test]
        fn test_mode_mismatch_is_discarded() {
            let msg = "ab";
            let plans = vec![vec![Segment::new(Mode::Numeric, 0, 2)], vec![Segment::new(Mode::Byte, 0, 2)]];
            let (bits, _) = encode(msg, &plans, ECLevel::L, None).unwrap();
            assert_eq!(bits.data()[0] >> 4, Mode::Byte as u8);
            let plans = vec![vec![Segment::new(Mode::Numeric, 0, 2)]];
            assert_eq!(encode(msg, &plans, ECLevel::L, None), Err(QRError::UnableToEncode));
        }
    }
}
