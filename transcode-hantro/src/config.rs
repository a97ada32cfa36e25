//! Encoder configuration.
//!
//! Sequence-level settings that stay fixed across frames. Everything here
//! can be loaded from JSON through `serde`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{HantroError, Result};
use crate::filter::MAX_FILTER_DELTA;
use crate::regs::PenaltyOverrides;
use crate::segmentation::EndianSwap;
use crate::{MAX_DIMENSION, ROI_COUNT};

/// Tri-state switch for motion search features the ASIC can skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MvFeature {
    /// Never used.
    Off,
    /// Used unless the frame is too large for the ASIC's time budget.
    #[default]
    Adaptive,
    /// Always used.
    On,
}

/// How the per-reference and per-mode loop filter deltas are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterDeltaMode {
    /// Deltas are not signalled.
    Disabled,
    /// Deltas derived every frame from the frame type and references.
    #[default]
    Auto,
    /// Deltas from the configuration are used as-is.
    Manual,
}

/// Loop filter type signalled in the frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Normal loop filter.
    #[default]
    Normal,
    /// Simple loop filter.
    Simple,
}

/// Rectangular region of interest in macroblock units, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoiArea {
    /// Leftmost macroblock column.
    pub left: u32,
    /// Topmost macroblock row.
    pub top: u32,
    /// Rightmost macroblock column.
    pub right: u32,
    /// Bottom macroblock row.
    pub bottom: u32,
    /// Quantizer reduction inside the area; 0 disables the area.
    pub delta_qp: i32,
}

impl RoiArea {
    /// Create an area from inclusive macroblock bounds.
    pub fn new(left: u32, top: u32, right: u32, bottom: u32, delta_qp: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            delta_qp,
        }
    }

    /// Whether the macroblock at (`x`, `y`) lies in the area.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    /// Whether the area changes anything.
    pub fn is_active(&self) -> bool {
        self.delta_qp != 0
    }
}

/// Hantro VP8 encoder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Quarter pixel motion vectors.
    pub quarter_pixel_mv: MvFeature,
    /// Split (sub-macroblock) motion vectors.
    pub split_mv: MvFeature,
    /// log2 of the number of DCT token partitions (0-3).
    pub dct_partitions: u8,
    /// Loop filter type.
    pub filter_type: FilterType,
    /// Loop filter level (0-63), used when not automatic.
    pub filter_level: u8,
    /// Loop filter sharpness (0-7), used when not automatic.
    pub filter_sharpness: u8,
    /// Derive the filter level from the quantizer.
    pub auto_filter_level: bool,
    /// Derive the filter sharpness.
    pub auto_filter_sharpness: bool,
    /// Filter delta selection.
    pub filter_delta_mode: FilterDeltaMode,
    /// Reference frame deltas for [`FilterDeltaMode::Manual`].
    pub ref_delta: [i32; 4],
    /// Macroblock mode deltas for [`FilterDeltaMode::Manual`].
    pub mode_delta: [i32; 4],
    /// Enable segmentation with an externally supplied map.
    pub segmentation: bool,
    /// Regions of interest mapped to segments 1 and 2.
    pub roi: [Option<RoiArea>; ROI_COUNT],
    /// Fixed penalties overriding the quantizer-derived defaults.
    pub penalties: PenaltyOverrides,
    /// Byte order conversion applied to the segment map.
    pub segment_map_swap: EndianSwap,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            quarter_pixel_mv: MvFeature::default(),
            split_mv: MvFeature::default(),
            dct_partitions: 0,
            filter_type: FilterType::default(),
            filter_level: 0,
            filter_sharpness: 0,
            auto_filter_level: true,
            auto_filter_sharpness: true,
            filter_delta_mode: FilterDeltaMode::default(),
            ref_delta: [0; 4],
            mode_delta: [0; 4],
            segmentation: false,
            roi: [None; ROI_COUNT],
            penalties: PenaltyOverrides::default(),
            segment_map_swap: EndianSwap::default(),
        }
    }
}

impl EncoderConfig {
    /// Create a new encoder config with dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Set quarter pixel MV mode.
    pub fn quarter_pixel_mv(mut self, mode: MvFeature) -> Self {
        self.quarter_pixel_mv = mode;
        self
    }

    /// Set split MV mode.
    pub fn split_mv(mut self, mode: MvFeature) -> Self {
        self.split_mv = mode;
        self
    }

    /// Set the number of DCT partitions as log2.
    pub fn dct_partitions(mut self, log2: u8) -> Self {
        self.dct_partitions = log2.min(3);
        self
    }

    /// Use a fixed filter level instead of the automatic one.
    pub fn filter_level(mut self, level: u8) -> Self {
        self.filter_level = level.min(63);
        self.auto_filter_level = false;
        self
    }

    /// Use a fixed filter sharpness instead of the automatic one.
    pub fn filter_sharpness(mut self, sharpness: u8) -> Self {
        self.filter_sharpness = sharpness.min(7);
        self.auto_filter_sharpness = false;
        self
    }

    /// Set filter type.
    pub fn filter_type(mut self, filter_type: FilterType) -> Self {
        self.filter_type = filter_type;
        self
    }

    /// Set filter delta mode.
    pub fn filter_delta_mode(mut self, mode: FilterDeltaMode) -> Self {
        self.filter_delta_mode = mode;
        self
    }

    /// Use fixed reference and mode filter deltas.
    pub fn manual_filter_deltas(mut self, ref_delta: [i32; 4], mode_delta: [i32; 4]) -> Self {
        self.filter_delta_mode = FilterDeltaMode::Manual;
        self.ref_delta = ref_delta;
        self.mode_delta = mode_delta;
        self
    }

    /// Enable segmentation driven by an external map.
    pub fn segmentation(mut self, enabled: bool) -> Self {
        self.segmentation = enabled;
        self
    }

    /// Set region of interest `index` (0 or 1, mapped to segment 1 or 2).
    ///
    /// There are only [`ROI_COUNT`] regions; any other index leaves the
    /// configuration unchanged and logs a warning.
    pub fn roi(mut self, index: usize, area: RoiArea) -> Self {
        match self.roi.get_mut(index) {
            Some(slot) => *slot = Some(area),
            None => warn!(index, max = ROI_COUNT - 1, "ROI index out of range, area ignored"),
        }
        self
    }

    /// Set penalty overrides.
    pub fn penalties(mut self, penalties: PenaltyOverrides) -> Self {
        self.penalties = penalties;
        self
    }

    /// Macroblocks per row.
    pub fn mb_per_row(&self) -> u32 {
        self.width.div_ceil(16)
    }

    /// Macroblocks per column.
    pub fn mb_per_col(&self) -> u32 {
        self.height.div_ceil(16)
    }

    /// Macroblocks per frame.
    pub fn mb_per_frame(&self) -> u32 {
        self.mb_per_row() * self.mb_per_col()
    }

    /// Check the configuration against the hardware limits.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0
            || self.height == 0
            || self.width > MAX_DIMENSION
            || self.height > MAX_DIMENSION
        {
            return Err(HantroError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        if self.dct_partitions > 3 {
            return Err(HantroError::Config(format!(
                "dct_partitions {} out of range (0-3)",
                self.dct_partitions
            )));
        }
        if self.filter_level > 63 {
            return Err(HantroError::Config(format!(
                "filter_level {} out of range (0-63)",
                self.filter_level
            )));
        }
        if self.filter_sharpness > 7 {
            return Err(HantroError::Config(format!(
                "filter_sharpness {} out of range (0-7)",
                self.filter_sharpness
            )));
        }

        let delta_range = -MAX_FILTER_DELTA..=MAX_FILTER_DELTA;
        let mut deltas = self.ref_delta.iter().chain(self.mode_delta.iter()).copied();
        if let Some(delta) = deltas.find(|d| !delta_range.contains(d)) {
            return Err(HantroError::Config(format!(
                "filter delta {} out of range (-{max}..={max})",
                delta,
                max = MAX_FILTER_DELTA
            )));
        }

        let (cols, rows) = (self.mb_per_row(), self.mb_per_col());
        for (index, area) in self.roi.iter().enumerate() {
            let Some(area) = area else { continue };
            let invalid = |reason: &str| HantroError::InvalidRoi {
                index,
                reason: reason.to_string(),
            };
            if area.left > area.right || area.top > area.bottom {
                return Err(invalid("bounds are inverted"));
            }
            if area.right >= cols || area.bottom >= rows {
                return Err(invalid("area extends past the frame"));
            }
            if !(-127..=127).contains(&area.delta_qp) {
                return Err(invalid("delta_qp out of range (-127..=127)"));
            }
        }

        Ok(())
    }
}
