mod qr;

pub use qr::{Module, QR};

use std::ops::Deref;

use tracing::{debug, trace};

use crate::common::{
    bit_utils::BitStream,
    codec::{encode, plan, SegmentCache, Segmentation},
    ec::ecc,
    error::{QRError, QRResult},
    mask::{apply_best_mask, MaskPattern},
    metadata::{ECLevel, Version},
};

/// Configures and builds a [`QR`] symbol. Any setting left unset is negotiated:
/// the smallest version that fits and the highest level that fits, in that
/// order of preference, and the lowest penalty mask.
pub struct QRBuilder<'a> {
    data: &'a str,
    version: Option<Version>,
    ec_level: Option<ECLevel>,
    mask: Option<MaskPattern>,
}

impl<'a> QRBuilder<'a> {
    pub fn new(data: &'a str) -> Self {
        Self { data, version: None, ec_level: None, mask: None }
    }

    pub fn data(&mut self, data: &'a str) -> &mut Self {
        self.data = data;
        self
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = Some(ec_level);
        self
    }

    pub fn unset_ec_level(&mut self) -> &mut Self {
        self.ec_level = None;
        self
    }

    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    pub fn unset_mask(&mut self) -> &mut Self {
        self.mask = None;
        self
    }

    pub fn metadata(&self) -> String {
        let version = self.version.map_or("None".to_string(), |v| (*v).to_string());
        let ec_level = self.ec_level.map_or("None".to_string(), |l| format!("{l:?}"));
        let mask = self.mask.map_or("None".to_string(), |m| (*m).to_string());
        format!("{{ Version: {version}, Ec level: {ec_level}, Mask: {mask} }}")
    }
}

#[cfg(test)]
mod qrbuilder_util_tests {
    use super::QRBuilder;
    use crate::common::mask::MaskPattern;
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_metadata() {
        let mut qr_builder = QRBuilder::new("Hello, world!");
        assert_eq!(qr_builder.metadata(), "{ Version: None, Ec level: None, Mask: None }");
        qr_builder
            .version(Version::MIN)
            .ec_level(ECLevel::L)
            .mask(MaskPattern::new(3).unwrap());
        assert_eq!(qr_builder.metadata(), "{ Version: 1, Ec level: L, Mask: 3 }");
        qr_builder.unset_version().unset_mask();
        assert_eq!(qr_builder.metadata(), "{ Version: None, Ec level: L, Mask: None }");
        qr_builder.unset_ec_level();
        assert_eq!(qr_builder.metadata(), "{ Version: None, Ec level: None, Mask: None }");
    }
}

impl QRBuilder<'_> {
    pub fn build(&self) -> QRResult<QR> {
        let plans = plan(self.data)?;
        self.build_from_plans(&plans)
    }

    /// Same as [`build`](Self::build), reusing segmentations planned earlier for
    /// the same text.
    pub fn build_with_cache(&self, cache: &mut SegmentCache) -> QRResult<QR> {
        let plans = cache.plan(self.data)?;
        self.build_from_plans(plans)
    }

    fn build_from_plans(&self, plans: &[Segmentation]) -> QRResult<QR> {
        debug!("Generating QR {}", self.metadata());

        let (encoded_data, version, ec_level) = self.negotiate(plans)?;
        debug!("Resolved version {} at level {ec_level:?}", *version);

        let payload = Self::construct_payload(encoded_data.data(), version, ec_level)?;

        let mut qr = QR::new(version, ec_level);
        qr.draw_all_function_patterns();
        qr.draw_encoding_region(payload);

        match self.mask {
            Some(m) => {
                debug!("Applying requested mask {}", *m);
                qr.apply_mask(m);
            }
            None => {
                apply_best_mask(&mut qr);
            }
        }

        debug!(
            "QR generated: width {}, dark modules {}",
            qr.width(),
            qr.count_dark_modules()
        );
        Ok(qr)
    }

    // Walks the candidate levels, most redundant first unless one is pinned
    fn negotiate(&self, plans: &[Segmentation]) -> QRResult<(BitStream, Version, ECLevel)> {
        let levels: &[ECLevel] = match self.ec_level {
            Some(ref ecl) => std::slice::from_ref(ecl),
            None => &ECLevel::DESCENDING,
        };

        let Some(requested) = self.version else {
            for &ecl in levels {
                match encode(self.data, plans, ecl, None) {
                    Ok((bits, ver)) => return Ok((bits, ver, ecl)),
                    Err(e) => trace!("Level {ecl:?} rejected: {e}"),
                }
            }
            return Err(QRError::UnableToEncode);
        };

        let mut required: Option<Version> = None;
        for &ecl in levels {
            match encode(self.data, plans, ecl, Some(requested)) {
                Ok((bits, ver)) if ver == requested => return Ok((bits, ver, ecl)),
                Ok((_, ver)) => {
                    trace!("Level {ecl:?} needs version {}", *ver);
                    required = Some(required.map_or(ver, |r| r.min(ver)));
                }
                Err(e) => trace!("Level {ecl:?} rejected: {e}"),
            }
        }
        match required {
            Some(ver) => Err(QRError::VersionMismatch { requested: *requested, required: *ver }),
            None => Err(QRError::UnableToEncode),
        }
    }

    fn construct_payload(data: &[u8], version: Version, ec_level: ECLevel) -> QRResult<BitStream> {
        let (data_blocks, ecc_blocks) = Self::compute_ecc(data, version, ec_level)?;

        let mut payload = BitStream::new(version.total_codewords() << 3);
        payload.extend(&Self::interleave(&data_blocks));
        payload.extend(&Self::interleave(&ecc_blocks));
        Ok(payload)
    }

    // ECC: Error Correction Codeword generator
    fn compute_ecc(
        data: &[u8],
        version: Version,
        ec_level: ECLevel,
    ) -> QRResult<(Vec<&[u8]>, Vec<Vec<u8>>)> {
        let data_blocks = Self::blockify(data, version, ec_level);

        let ecc_size_per_block = version.ecc_per_block(ec_level);
        let ecc_blocks =
            data_blocks.iter().map(|b| ecc(b, ecc_size_per_block)).collect::<QRResult<Vec<_>>>()?;

        Ok((data_blocks, ecc_blocks))
    }

    pub(crate) fn blockify(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<&[u8]> {
        let (block1_size, block1_count, block2_size, block2_count) =
            version.data_codewords_per_block(ec_level);

        let total_blocks = block1_count + block2_count;
        let total_block1_size = block1_size * block1_count;
        let total_size = total_block1_size + block2_size * block2_count;

        debug_assert!(
            total_size == data.len(),
            "Data len doesn't match total size of blocks: Data len {}, Total block size {}",
            data.len(),
            total_size
        );

        let mut data_blocks = Vec::with_capacity(total_blocks);
        data_blocks.extend(data[..total_block1_size].chunks(block1_size));
        if block2_size > 0 {
            data_blocks.extend(data[total_block1_size..].chunks(block2_size));
        }
        data_blocks
    }

    pub fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
        let max_block_size = blocks.iter().map(|b| b.len()).max().unwrap_or(0);
        let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
        let mut res = Vec::with_capacity(total_size);
        for i in 0..max_block_size {
            for b in blocks {
                if i < b.len() {
                    res.push(b[i]);
                }
            }
        }
        res
    }
}
