//! Macroblock segmentation.
//!
//! The ASIC reads a 4-bit segment id per macroblock from memory. Ids are
//! packed eight per 32-bit word in raster order with the first macroblock in
//! the most significant nibble, and the buffer is a multiple of 64 bits.
//! After every software update the buffer is converted to the byte order
//! the ASIC expects.

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::RoiArea;
use crate::error::{HantroError, Result};
use crate::{ROI_COUNT, SGM_CNT};

/// Segment ids per 32-bit map word.
const IDS_PER_WORD: usize = 8;

/// Byte order conversion between CPU and ASIC views of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndianSwap {
    /// Reverse the bytes of every 32-bit word.
    pub bytes: bool,
    /// Swap the two 32-bit halves of every 64-bit word.
    pub words: bool,
}

impl Default for EndianSwap {
    fn default() -> Self {
        Self {
            bytes: true,
            words: true,
        }
    }
}

impl EndianSwap {
    /// No conversion.
    pub const NONE: Self = Self {
        bytes: false,
        words: false,
    };

    /// Convert `buf` in place. Applying the same swap twice is a no-op.
    pub fn apply(&self, buf: &mut [u32]) {
        if self.bytes {
            for word in buf.iter_mut() {
                *word = word.swap_bytes();
            }
        }
        if self.words {
            for pair in buf.chunks_exact_mut(2) {
                pair.swap(0, 1);
            }
        }
    }

    /// Index and value of CPU word `index` inside a converted buffer.
    fn read(&self, buf: &[u32], index: usize) -> u32 {
        let idx = if self.words { index ^ 1 } else { index };
        if self.bytes {
            buf[idx].swap_bytes()
        } else {
            buf[idx]
        }
    }
}

/// Size in bytes of the map for `mb_count` macroblocks, a 64-bit multiple.
pub fn map_size_bytes(mb_count: usize) -> usize {
    mb_count.div_ceil(16) * 8
}

#[inline]
fn nibble_shift(mb: usize) -> u32 {
    28 - 4 * (mb % IDS_PER_WORD) as u32
}

/// Packed per-macroblock segment id map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMap {
    words: Vec<u32>,
    mb_count: usize,
    swap: EndianSwap,
    hw_order: bool,
}

impl SegmentMap {
    /// Create an all-zero map for `mb_count` macroblocks.
    pub fn new(mb_count: usize, swap: EndianSwap) -> Self {
        Self {
            words: vec![0; map_size_bytes(mb_count) / 4],
            mb_count,
            swap,
            hw_order: false,
        }
    }

    /// Number of macroblocks covered.
    pub fn mb_count(&self) -> usize {
        self.mb_count
    }

    /// Buffer size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.words.len() * 4
    }

    /// Raw words in their current order.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Whether the words are currently in ASIC byte order.
    pub fn is_hw_order(&self) -> bool {
        self.hw_order
    }

    /// Memory image of the buffer as a little-endian CPU would lay it out.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.size_bytes()];
        LittleEndian::write_u32_into(&self.words, &mut bytes);
        bytes
    }

    /// Segment id of macroblock `mb`.
    pub fn id(&self, mb: usize) -> Option<u8> {
        if mb >= self.mb_count {
            return None;
        }
        let word = self.cpu_word(mb / IDS_PER_WORD);
        Some(((word >> nibble_shift(mb)) & 0xF) as u8)
    }

    /// Set the segment id of macroblock `mb`.
    pub fn set_id(&mut self, mb: usize, id: u8) -> Result<()> {
        if id as usize >= SGM_CNT {
            return Err(HantroError::InvalidSegmentId(id));
        }
        if mb >= self.mb_count {
            return Err(HantroError::SegmentMapSize {
                expected: self.mb_count,
                actual: mb + 1,
            });
        }
        self.to_cpu_order();
        let shift = nibble_shift(mb);
        let word = &mut self.words[mb / IDS_PER_WORD];
        *word = (*word & !(0xF << shift)) | ((id as u32) << shift);
        Ok(())
    }

    /// Replace the whole map with one id per macroblock.
    pub fn load_ids(&mut self, ids: &[u8]) -> Result<()> {
        if ids.len() != self.mb_count {
            return Err(HantroError::SegmentMapSize {
                expected: self.mb_count,
                actual: ids.len(),
            });
        }
        if let Some(&bad) = ids.iter().find(|&&id| id as usize >= SGM_CNT) {
            return Err(HantroError::InvalidSegmentId(bad));
        }

        self.words.fill(0);
        self.hw_order = false;
        for (mb, &id) in ids.iter().enumerate() {
            self.words[mb / IDS_PER_WORD] |= (id as u32) << nibble_shift(mb);
        }
        Ok(())
    }

    /// Rebuild the map from the regions of interest.
    ///
    /// Region `n` tags its macroblocks with id `n + 1`; the later region wins
    /// where they overlap. Returns the number of macroblocks per id.
    pub fn fill_from_roi(
        &mut self,
        mb_per_row: u32,
        mb_per_col: u32,
        roi: &[Option<RoiArea>; ROI_COUNT],
    ) -> [u32; SGM_CNT] {
        let mut counts = [0u32; SGM_CNT];
        let mut mask = 0u32;
        let mut mb = 0usize;

        self.words.fill(0);
        self.hw_order = false;

        for y in 0..mb_per_col {
            for x in 0..mb_per_row {
                let mut id = 0u32;
                for (n, area) in roi.iter().enumerate() {
                    if let Some(area) = area.filter(|a| a.is_active()) {
                        if area.contains(x, y) {
                            id = n as u32 + 1;
                        }
                    }
                }
                counts[id as usize] += 1;

                mask |= id << nibble_shift(mb);
                if mb % IDS_PER_WORD == IDS_PER_WORD - 1 {
                    self.words[mb / IDS_PER_WORD] = mask;
                    mask = 0;
                }
                mb += 1;
            }
        }
        if mb % IDS_PER_WORD != 0 {
            self.words[mb / IDS_PER_WORD] = mask;
        }

        counts
    }

    /// Count macroblocks per id.
    pub fn count_ids(&self) -> [u32; SGM_CNT] {
        let mut counts = [0u32; SGM_CNT];
        for mb in 0..self.mb_count {
            if let Some(id) = self.id(mb) {
                if let Some(count) = counts.get_mut(id as usize) {
                    *count += 1;
                }
            }
        }
        counts
    }

    /// Convert the buffer to ASIC byte order.
    pub fn to_hw_order(&mut self) {
        if !self.hw_order {
            self.swap.apply(&mut self.words);
            self.hw_order = true;
        }
    }

    fn to_cpu_order(&mut self) {
        if self.hw_order {
            self.swap.apply(&mut self.words);
            self.hw_order = false;
        }
    }

    fn cpu_word(&self, index: usize) -> u32 {
        if self.hw_order {
            self.swap.read(&self.words, index)
        } else {
            self.words[index]
        }
    }
}

/// Per-segment parameters the frame header signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SegmentParams {
    /// Quantizer index per segment.
    pub qp: [i32; SGM_CNT],
    /// Loop filter level per segment.
    pub level: [i32; SGM_CNT],
}

/// Segmentation state of the active picture parameters.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Segmentation signalled in the frame.
    pub enabled: bool,
    /// The map changed since the ASIC last read it.
    pub map_modified: bool,
    /// Macroblocks per segment id in the current map.
    pub id_count: [u32; SGM_CNT],
    /// Current per-segment parameters.
    pub params: SegmentParams,
    /// Parameters of the previously coded frame, `None` when they must be
    /// resent.
    pub previous: Option<SegmentParams>,
    map: SegmentMap,
    mb_per_row: u32,
    mb_per_col: u32,
}

impl Segmentation {
    /// Create segmentation state for a frame of the given macroblock size.
    pub fn new(mb_per_row: u32, mb_per_col: u32, enabled: bool, swap: EndianSwap) -> Self {
        let mb_count = (mb_per_row * mb_per_col) as usize;
        Self {
            enabled,
            map_modified: false,
            id_count: [0; SGM_CNT],
            params: SegmentParams::default(),
            previous: None,
            map: SegmentMap::new(mb_count, swap),
            mb_per_row,
            mb_per_col,
        }
    }

    /// The segment map.
    pub fn map(&self) -> &SegmentMap {
        &self.map
    }

    /// Replace the map with caller-supplied ids; the next frame uploads it.
    pub fn load_map(&mut self, ids: &[u8]) -> Result<()> {
        self.map.load_ids(ids)?;
        self.map_modified = true;
        Ok(())
    }

    /// Change the id of a single macroblock; the next frame uploads the map.
    pub fn set_id(&mut self, mb: usize, id: u8) -> Result<()> {
        self.map.set_id(mb, id)?;
        self.map_modified = true;
        Ok(())
    }

    /// Whether the header must carry the segment parameters.
    pub fn needs_update(&self) -> bool {
        self.previous != Some(self.params)
    }

    /// Apply regions of interest and refresh the map for a new frame.
    pub fn update(
        &mut self,
        qp: i32,
        roi: &[Option<RoiArea>; ROI_COUNT],
        key_frame: bool,
    ) {
        for (n, area) in roi.iter().enumerate() {
            if let Some(area) = area.filter(|a| a.is_active()) {
                self.params.qp[n + 1] = (qp - area.delta_qp).clamp(0, 127);
            }
        }

        if roi.iter().flatten().any(RoiArea::is_active) {
            self.enabled = true;
            self.id_count = self.map.fill_from_roi(self.mb_per_row, self.mb_per_col, roi);
            self.map.to_hw_order();
            self.map_modified = true;
            debug!(counts = ?self.id_count, qp = ?self.params.qp, "Segment map rebuilt from ROI");
        } else if self.enabled && self.map_modified {
            self.map.to_cpu_order();
            self.id_count = self.map.count_ids();
            self.map.to_hw_order();
            debug!(counts = ?self.id_count, "External segment map counted");
        }

        if key_frame || !self.enabled {
            trace!("Segment parameters invalidated");
            self.previous = None;
        }
    }

    /// Remember the coded parameters and mark the map as consumed.
    pub fn frame_done(&mut self) {
        self.map_modified = false;
        self.previous = if self.enabled { Some(self.params) } else { None };
    }
}
