//! Quantization tables for the ASIC's quantize/dequantize stage.
//!
//! For every quantizer index the hardware wants four constants per
//! coefficient class, each for the DC and the AC coefficients: the reciprocal
//! quant multiplier, the zero-bin threshold, the rounding bias and the
//! dequantizer step.

use serde::Serialize;

use crate::error::{HantroError, Result};
use crate::tables::{AC_Q_LOOKUP, DC_Q_LOOKUP, Q_ROUNDING_FACTORS, Q_ZBIN_FACTORS};
use crate::QINDEX_RANGE;

/// Index of the DC constants in a [`QuantEntry`].
pub const DC: usize = 0;
/// Index of the AC constants in a [`QuantEntry`].
pub const AC: usize = 1;

/// Largest reciprocal the quant register field holds.
const MAX_QUANT: i32 = 0x3FFF;

/// Quantizer constants of one coefficient class at one quantizer index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QuantEntry {
    /// `65536 / step`, saturated to 14 bits.
    pub quant: [u16; 2],
    /// Zero-bin threshold.
    pub zbin: [u16; 2],
    /// Rounding bias.
    pub round: [u16; 2],
    /// Dequantizer step.
    pub dequant: [u16; 2],
}

impl QuantEntry {
    fn set(&mut self, j: usize, qp: usize, step: i32) {
        self.quant[j] = ((1 << 16) / step).min(MAX_QUANT) as u16;
        self.zbin[j] = ((Q_ZBIN_FACTORS[qp] * step + 64) >> 7) as u16;
        self.round[j] = ((Q_ROUNDING_FACTORS[qp] * step) >> 7) as u16;
        self.dequant[j] = step as u16;
    }
}

/// Coefficient class selecting a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoeffClass {
    /// First order luma.
    Y1,
    /// Second order luma (the WHT of the luma DCs).
    Y2,
    /// Chroma.
    Chroma,
}

/// Quantizer constants for every quantizer index and coefficient class.
///
/// Built once per encoder instance and read every frame.
#[derive(Debug, Clone)]
pub struct QuantTables {
    y1: Vec<QuantEntry>,
    y2: Vec<QuantEntry>,
    chroma: Vec<QuantEntry>,
}

impl QuantTables {
    /// Build the tables for all [`QINDEX_RANGE`] quantizer indices.
    pub fn new() -> Self {
        let mut y1 = vec![QuantEntry::default(); QINDEX_RANGE];
        let mut y2 = vec![QuantEntry::default(); QINDEX_RANGE];
        let mut chroma = vec![QuantEntry::default(); QINDEX_RANGE];

        for qp in 0..QINDEX_RANGE {
            let dc = DC_Q_LOOKUP[qp];
            let ac = AC_Q_LOOKUP[qp];

            y1[qp].set(DC, qp, dc);
            y1[qp].set(AC, qp, ac);

            y2[qp].set(DC, qp, dc * 2);
            y2[qp].set(AC, qp, (ac * 155 / 100).max(8));

            chroma[qp].set(DC, qp, dc.min(132));
            chroma[qp].set(AC, qp, ac);
        }

        Self { y1, y2, chroma }
    }

    /// Look up the constants for `class` at quantizer index `qp`.
    pub fn get(&self, class: CoeffClass, qp: i32) -> Result<&QuantEntry> {
        let idx = qp_index(qp)?;
        let table = match class {
            CoeffClass::Y1 => &self.y1,
            CoeffClass::Y2 => &self.y2,
            CoeffClass::Chroma => &self.chroma,
        };
        Ok(&table[idx])
    }

    /// First order luma constants.
    pub fn y1(&self, qp: i32) -> Result<&QuantEntry> {
        self.get(CoeffClass::Y1, qp)
    }

    /// Second order luma constants.
    pub fn y2(&self, qp: i32) -> Result<&QuantEntry> {
        self.get(CoeffClass::Y2, qp)
    }

    /// Chroma constants.
    pub fn chroma(&self, qp: i32) -> Result<&QuantEntry> {
        self.get(CoeffClass::Chroma, qp)
    }
}

impl Default for QuantTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a quantizer index and turn it into a table index.
pub fn qp_index(qp: i32) -> Result<usize> {
    if (0..QINDEX_RANGE as i32).contains(&qp) {
        Ok(qp as usize)
    } else {
        Err(HantroError::InvalidQp(qp))
    }
}
