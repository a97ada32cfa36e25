//! Loop filter parameter selection.
//!
//! The ASIC applies the loop filter itself; software picks the frame level,
//! the per-segment levels, the sharpness and the per-reference and per-mode
//! level deltas.

use tracing::trace;

use crate::config::{EncoderConfig, FilterDeltaMode};
use crate::error::Result;
use crate::quant::qp_index;
use crate::segmentation::SegmentParams;
use crate::tables::INTER_LEVEL;
use crate::Picture;

/// Largest loop filter level.
pub const MAX_FILTER_LEVEL: i32 = 63;
/// Largest magnitude of a filter delta, 6 bits in the header.
pub const MAX_FILTER_DELTA: i32 = 0x3F;

/// Reference frame deltas: intra, last, golden, altref.
const AUTO_REF_DELTA: [i32; 4] = [2, 0, -2, -2];
/// Mode deltas: BPRED, ZERO, NEWMV, SPLIT.
const AUTO_MODE_DELTA: [i32; 4] = [4, -2, 2, 4];

/// Loop filter state carried between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopFilterParams {
    /// Frame filter level (0-63).
    pub level: i32,
    /// Sharpness (0-7).
    pub sharpness: i32,
    /// Reference frame deltas.
    pub ref_delta: [i32; 4],
    /// Macroblock mode deltas.
    pub mode_delta: [i32; 4],
    /// Deltas of the previous frame.
    pub old_ref_delta: [i32; 4],
    /// Mode deltas of the previous frame.
    pub old_mode_delta: [i32; 4],
}

impl LoopFilterParams {
    /// Initial state from the configuration.
    pub fn new(config: &EncoderConfig) -> Self {
        Self {
            level: config.filter_level as i32,
            sharpness: config.filter_sharpness as i32,
            ref_delta: config.ref_delta,
            mode_delta: config.mode_delta,
            old_ref_delta: config.ref_delta,
            old_mode_delta: config.mode_delta,
        }
    }

    /// Remember the deltas just coded for the next droppable frame.
    pub fn commit_deltas(&mut self) {
        self.old_ref_delta = self.ref_delta;
        self.old_mode_delta = self.mode_delta;
    }
}

/// Automatic filter level for a quantizer.
pub fn auto_level(qp: i32, key_frame: bool) -> Result<i32> {
    let idx = qp_index(qp)?;
    Ok(if key_frame {
        ((qp * 64) / 128 + 8).clamp(0, MAX_FILTER_LEVEL)
    } else {
        INTER_LEVEL[idx]
    })
}

/// Update the filter parameters for a new frame.
///
/// `segments` carries the per-segment quantizers in and the per-segment
/// filter levels out.
pub fn set_filter_parameters(
    lf: &mut LoopFilterParams,
    segments: &mut SegmentParams,
    config: &EncoderConfig,
    qp: i32,
    picture: &Picture,
) -> Result<()> {
    if config.auto_filter_level {
        lf.level = auto_level(qp, picture.key_frame)?;
        for (level, &sgm_qp) in segments.level.iter_mut().zip(segments.qp.iter()) {
            *level = auto_level(sgm_qp, picture.key_frame)?;
        }
        trace!(level = lf.level, levels = ?segments.level, "Automatic filter level");
    }

    if config.auto_filter_sharpness {
        lf.sharpness = 0;
    }

    match config.filter_delta_mode {
        FilterDeltaMode::Disabled => return Ok(()),
        FilterDeltaMode::Manual => {
            // Range checked by `EncoderConfig::validate`.
            lf.ref_delta = config.ref_delta;
            lf.mode_delta = config.mode_delta;
            return Ok(());
        }
        FilterDeltaMode::Auto => {
            if lf.level == 0 {
                // Level zero means filtering is off altogether.
                lf.ref_delta = [0; 4];
                lf.mode_delta = [0; 4];
                return Ok(());
            }

            if picture.is_droppable() {
                lf.ref_delta = lf.old_ref_delta;
                lf.mode_delta = lf.old_mode_delta;
                return Ok(());
            }

            lf.ref_delta = AUTO_REF_DELTA;
            lf.mode_delta = AUTO_MODE_DELTA;
        }
    }

    for delta in lf.ref_delta.iter_mut().chain(lf.mode_delta.iter_mut()) {
        *delta = (*delta).clamp(-MAX_FILTER_DELTA, MAX_FILTER_DELTA);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inter_picture() -> Picture {
        Picture::inter()
    }

    #[test]
    fn test_auto_level_key_frame() {
        assert_eq!(auto_level(0, true).unwrap(), 8);
        assert_eq!(auto_level(64, true).unwrap(), 40);
        assert_eq!(auto_level(127, true).unwrap(), 63);
    }

    #[test]
    fn test_auto_level_inter_frame() {
        assert_eq!(auto_level(0, false).unwrap(), 8);
        assert_eq!(auto_level(50, false).unwrap(), 15);
        assert_eq!(auto_level(127, false).unwrap(), 63);
        assert!(auto_level(128, false).is_err());
    }

    #[test]
    fn test_segment_levels() {
        let config = EncoderConfig::new(64, 64);
        let mut lf = LoopFilterParams::new(&config);
        let mut segments = SegmentParams {
            qp: [64, 0, 127, 64],
            level: [0; 4],
        };
        set_filter_parameters(&mut lf, &mut segments, &config, 64, &Picture::key()).unwrap();
        assert_eq!(lf.level, 40);
        assert_eq!(segments.level, [40, 8, 63, 40]);
        assert_eq!(lf.ref_delta, AUTO_REF_DELTA);
        assert_eq!(lf.mode_delta, AUTO_MODE_DELTA);
    }

    #[test]
    fn test_fixed_level_and_sharpness() {
        let config = EncoderConfig::new(64, 64).filter_level(20).filter_sharpness(5);
        let mut lf = LoopFilterParams::new(&config);
        let mut segments = SegmentParams::default();
        set_filter_parameters(&mut lf, &mut segments, &config, 100, &inter_picture()).unwrap();
        assert_eq!(lf.level, 20);
        assert_eq!(lf.sharpness, 5);
        assert_eq!(segments.level, [0; 4]);
    }

    #[test]
    fn test_auto_sharpness_resets() {
        let config = EncoderConfig::new(64, 64);
        let mut lf = LoopFilterParams::new(&config);
        lf.sharpness = 6;
        set_filter_parameters(&mut lf, &mut SegmentParams::default(), &config, 10, &inter_picture())
            .unwrap();
        assert_eq!(lf.sharpness, 0);
    }

    #[test]
    fn test_zero_level_clears_deltas() {
        let config = EncoderConfig::new(64, 64).filter_level(0);
        let mut lf = LoopFilterParams::new(&config);
        lf.ref_delta = [1, 1, 1, 1];
        lf.mode_delta = [1, 1, 1, 1];
        set_filter_parameters(&mut lf, &mut SegmentParams::default(), &config, 10, &inter_picture())
            .unwrap();
        assert_eq!(lf.ref_delta, [0; 4]);
        assert_eq!(lf.mode_delta, [0; 4]);
    }

    #[test]
    fn test_droppable_frame_keeps_old_deltas() {
        let config = EncoderConfig::new(64, 64);
        let mut lf = LoopFilterParams::new(&config);
        lf.old_ref_delta = [5, 6, 7, 8];
        lf.old_mode_delta = [-1, -2, -3, -4];

        let picture = Picture {
            key_frame: false,
            refresh_last: false,
            refresh_golden: false,
            refresh_altref: false,
        };
        set_filter_parameters(&mut lf, &mut SegmentParams::default(), &config, 10, &picture)
            .unwrap();
        assert_eq!(lf.ref_delta, [5, 6, 7, 8]);
        assert_eq!(lf.mode_delta, [-1, -2, -3, -4]);
    }

    #[test]
    fn test_manual_deltas_kept() {
        let config =
            EncoderConfig::new(64, 64).manual_filter_deltas([63, 0, -63, 3], [1, -2, 3, -4]);
        let mut lf = LoopFilterParams::new(&config);
        lf.old_ref_delta = [9, 9, 9, 9];

        // Droppable frames do not restore over manual deltas.
        let droppable = Picture::inter().with_last(false);
        set_filter_parameters(&mut lf, &mut SegmentParams::default(), &config, 10, &droppable)
            .unwrap();
        assert_eq!(lf.ref_delta, [63, 0, -63, 3]);
        assert_eq!(lf.mode_delta, [1, -2, 3, -4]);
    }

    #[test]
    fn test_out_of_range_manual_deltas_rejected() {
        let config = EncoderConfig::new(64, 64).manual_filter_deltas([100, 0, 0, 0], [0; 4]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disabled_deltas_untouched() {
        let config = EncoderConfig::new(64, 64).filter_delta_mode(FilterDeltaMode::Disabled);
        let mut lf = LoopFilterParams::new(&config);
        lf.ref_delta = [9, 9, 9, 9];
        set_filter_parameters(&mut lf, &mut SegmentParams::default(), &config, 10, &inter_picture())
            .unwrap();
        assert_eq!(lf.ref_delta, [9, 9, 9, 9]);
    }
}
