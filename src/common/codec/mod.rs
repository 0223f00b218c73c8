pub mod encoder;
pub mod planner;
pub mod types;

pub use encoder::*;
pub use planner::*;
pub use types::*;

// Codec proptesting
//------------------------------------------------------------------------------

#[cfg(test)]
mod codec_proptests {

    use proptest::prelude::*;

    use super::encoder::encode::encode_data;
    use super::{encode, plan, Mode};
    use crate::common::metadata::{ECLevel, Version};

    pub fn ec_level_strategy() -> BoxedStrategy<ECLevel> {
        prop_oneof![Just(ECLevel::L), Just(ECLevel::M), Just(ECLevel::Q), Just(ECLevel::H)].boxed()
    }

    proptest! {
        #[test]
        fn proptest_plans_cover_message(msg in "[0-9A-Z a-z$%*+./:\\-éЖ🌎]{1,80}") {
            for segs in plan(&msg).unwrap() {
                let mut cursor = 0;
                for seg in &segs {
                    prop_assert_eq!(seg.start, cursor);
                    prop_assert!(seg.len > 0);
                    prop_assert!(seg.content(&msg).chars().all(|c| seg.mode.contains(c)));
                    cursor = seg.end();
                }
                prop_assert_eq!(cursor, msg.len());
            }
        }

        #[test]
        fn proptest_encoded_len(msg in "[0-9]{1,60}", alnum in "[0-9A-Z $%*+./:\\-]{1,60}") {
            prop_assert_eq!(encode_data(&msg, Mode::Numeric).unwrap().len(), Mode::Numeric.encoded_len(msg.len()));
            prop_assert_eq!(
                encode_data(&alnum, Mode::Alphanumeric).unwrap().len(),
                Mode::Alphanumeric.encoded_len(alnum.len())
            );
        }

        #[test]
        fn proptest_padded_to_capacity(msg in "\\PC{1,200}", ecl in ec_level_strategy(), ver in 1usize..=40) {
            let plans = plan(&msg).unwrap();
            let requested = Version::new(ver).unwrap();
            let (bits, resolved) = encode(&msg, &plans, ecl, Some(requested)).unwrap();
            prop_assert!(resolved >= requested);
            prop_assert_eq!(bits.len(), resolved.data_bit_capacity(ecl));
        }
    }
}
