//! Bit-cost estimates from the frame's entropy probabilities.
//!
//! The ASIC does the real bool coding; the software only needs cost
//! estimates to derive the motion vector penalty tables.

use serde::{Deserialize, Serialize};

use crate::tables::{DEFAULT_MV_PROBS, MV_PROB_COUNT, PROB_COST};

/// Offset of the is-short probability.
const MVP_IS_SHORT: usize = 0;
/// Offset of the sign probability.
const MVP_SIGN: usize = 1;
/// Offset of the short tree probabilities.
const MVP_SHORT: usize = 2;
/// Offset of the long bit probabilities.
const MVP_BITS: usize = 9;
/// Number of bits in a long MV magnitude.
const MV_LONG_BITS: usize = 10;
/// Magnitudes below this use the short tree.
const MV_SHORT_COUNT: i32 = 8;

/// Probabilities the frame header will carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntropyState {
    /// Probability of a macroblock being intra coded in an inter frame.
    pub intra_prob: u8,
    /// MV probabilities, vertical component first.
    pub mv_probs: [[u8; MV_PROB_COUNT]; 2],
}

impl Default for EntropyState {
    fn default() -> Self {
        Self {
            intra_prob: 63,
            mv_probs: DEFAULT_MV_PROBS,
        }
    }
}

/// Cost of coding `bit` with probability `prob`, in 1/256 bit.
#[inline]
pub fn cost_bool(prob: u8, bit: bool) -> i32 {
    if bit {
        PROB_COST[255 - prob as usize]
    } else {
        PROB_COST[prob as usize]
    }
}

/// Cost of a short magnitude (0..8) through the small MV tree.
fn cost_short_tree(value: i32, probs: &[u8]) -> i32 {
    let hi = value & 4 != 0;
    let mid = value & 2 != 0;
    let lo = value & 1 != 0;

    let mut cost = cost_bool(probs[0], hi);
    if hi {
        cost += cost_bool(probs[4], mid);
        cost += cost_bool(if mid { probs[6] } else { probs[5] }, lo);
    } else {
        cost += cost_bool(probs[1], mid);
        cost += cost_bool(if mid { probs[3] } else { probs[2] }, lo);
    }
    cost
}

/// Estimated cost of coding one MV component difference `mvd`.
///
/// `mvd` is in quarter pel; VP8 codes it in half the resolution.
pub fn cost_mv(mvd: i32, probs: &[u8; MV_PROB_COUNT]) -> i32 {
    let value = (mvd >> 1).abs();
    let negative = mvd < 0;

    if value < MV_SHORT_COUNT {
        let mut cost = cost_bool(probs[MVP_IS_SHORT], false);
        cost += cost_short_tree(value, &probs[MVP_SHORT..MVP_BITS]);
        if value == 0 {
            return cost;
        }
        return cost + cost_bool(probs[MVP_SIGN], negative);
    }

    let bit = |i: usize| (value >> i) & 1 != 0;

    let mut cost = cost_bool(probs[MVP_IS_SHORT], true);
    for i in 0..3 {
        cost += cost_bool(probs[MVP_BITS + i], bit(i));
    }
    for i in (4..MV_LONG_BITS).rev() {
        cost += cost_bool(probs[MVP_BITS + i], bit(i));
    }
    // Bit 3 is implied when the magnitude fits in 4 bits.
    if value > 15 {
        cost += cost_bool(probs[MVP_BITS + 3], bit(3));
    }
    cost + cost_bool(probs[MVP_SIGN], negative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_bool_symmetric_at_half() {
        assert_eq!(cost_bool(128, false), PROB_COST[128]);
        assert_eq!(cost_bool(128, true), PROB_COST[127]);
    }

    #[test]
    fn test_zero_mv_has_no_sign() {
        let probs = DEFAULT_MV_PROBS[0];
        let expected = cost_bool(probs[0], false)
            + cost_bool(probs[2], false)
            + cost_bool(probs[3], false)
            + cost_bool(probs[4], false);
        assert_eq!(cost_mv(0, &probs), expected);
        // mvd 1 rounds down to the same magnitude
        assert_eq!(cost_mv(1, &probs), expected);
    }

    #[test]
    fn test_short_mv_cost() {
        let probs = DEFAULT_MV_PROBS[1];
        // magnitude 5: 1 0 1 down the tree
        let expected = cost_bool(probs[0], false)
            + cost_bool(probs[2], true)
            + cost_bool(probs[6], false)
            + cost_bool(probs[7], true)
            + cost_bool(probs[1], false);
        assert_eq!(cost_mv(10, &probs), expected);
    }

    #[test]
    fn test_sign_changes_cost() {
        let probs = DEFAULT_MV_PROBS[0];
        let pos = cost_mv(6, &probs);
        let neg = cost_mv(-6, &probs);
        assert_eq!(
            pos - neg,
            cost_bool(probs[1], false) - cost_bool(probs[1], true)
        );
    }

    #[test]
    fn test_long_mv_bit3_implied() {
        let probs = DEFAULT_MV_PROBS[0];
        let mut expected = cost_bool(probs[0], true);
        // magnitude 9 = 0b1001
        expected += cost_bool(probs[9], true);
        expected += cost_bool(probs[10], false);
        expected += cost_bool(probs[11], false);
        for i in (4..10).rev() {
            expected += cost_bool(probs[9 + i], false);
        }
        expected += cost_bool(probs[1], false);
        assert_eq!(cost_mv(18, &probs), expected);
    }

    #[test]
    fn test_long_mv_bit3_coded() {
        let probs = DEFAULT_MV_PROBS[1];
        // magnitude 16 = 0b10000
        let mut expected = cost_bool(probs[0], true);
        for i in 0..3 {
            expected += cost_bool(probs[9 + i], false);
        }
        for i in (4..10).rev() {
            expected += cost_bool(probs[9 + i], i == 4);
        }
        expected += cost_bool(probs[12], false);
        expected += cost_bool(probs[1], true);
        assert_eq!(cost_mv(-32, &probs), expected);
    }
}
