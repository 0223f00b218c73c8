mod galois;

pub(crate) use galois::{generator_polynomial, EXP_TABLE, LOG_TABLE};

use super::error::QRResult;

// ECC: Error correction codeword generator
//------------------------------------------------------------------------------

// Systematic Reed-Solomon: the working register starts as the block, zero
// padded to at least `ecc_count` cells. Each step pops the lead value, shifts
// the register left and folds `lead * g(x)` into the first `ecc_count` cells.
// The first `ecc_count` cells left over are the remainder.
pub fn ecc(block: &[u8], ecc_count: usize) -> QRResult<Vec<u8>> {
    let gen_poly = generator_polynomial(ecc_count)?;

    let len = block.len();
    let mut reg = block.to_vec();
    reg.resize(len.max(ecc_count), 0);

    for _ in 0..len {
        let lead = reg[0];
        reg.rotate_left(1);
        if let Some(last) = reg.last_mut() {
            *last = 0;
        }

        // Zero has no logarithm
        if lead == 0 {
            continue;
        }

        let log_lead = LOG_TABLE[lead as usize] as usize;
        for (r, &g) in reg.iter_mut().zip(gen_poly) {
            *r ^= EXP_TABLE[(g as usize + log_lead) % 255];
        }
    }

    reg.truncate(ecc_count);
    Ok(reg)
}
