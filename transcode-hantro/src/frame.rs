//! Per-frame register assembly.
//!
//! [`Vp8HwEncoder`] owns the register block while a frame is being set up. It
//! combines the quantizer tables, the filter and segmentation state and the
//! global configuration into the registers, then hands them to the backend.

use tracing::{debug, trace, warn};

use crate::backend::{AsicBackend, HeaderContext};
use crate::config::{EncoderConfig, FilterType, MvFeature, RoiArea};
use crate::entropy::{cost_mv, EntropyState};
use crate::error::Result;
use crate::filter::{set_filter_parameters, LoopFilterParams};
use crate::quant::{qp_index, QuantTables};
use crate::regs::{FrameCodingType, PenaltyOverrides, RegisterBlock, SegmentQuant};
use crate::segmentation::Segmentation;
use crate::stream::OutputStream;
use crate::tables::{INTRA_16X16_TREE_PENALTY, INTRA_4X4_TREE_PENALTY, QPEL_WEIGHT, SPLIT_PENALTY};
use crate::{Picture, PENALTY_TABLE_SIZE, PROB_COUNT_SIZE, SGM_CNT};

/// Above this many macroblocks (1080p) there is no time for quarter pel search.
pub const QPEL_MAX_MBS: u32 = 8160;
/// Above this many macroblocks (4CIF) split MVs bring no gain.
pub const SPLIT_MV_MAX_MBS: u32 = 1584;

/// VP8 frame setup for one Hantro encoder instance.
///
/// # Example
///
/// ```
/// use transcode_hantro::{CaptureBackend, EncoderConfig, OutputStream, Picture, Vp8HwEncoder};
///
/// let mut encoder = Vp8HwEncoder::new(EncoderConfig::new(640, 480))?;
/// let mut stream = OutputStream::new(64 * 1024, 16 * 1024);
/// let mut backend = CaptureBackend::new(10, 5);
///
/// encoder.code_frame(36, &Picture::key(), &mut stream, &mut backend)?;
/// assert!(backend.last_regs.is_some());
/// # Ok::<(), transcode_hantro::HantroError>(())
/// ```
#[derive(Debug)]
pub struct Vp8HwEncoder {
    config: EncoderConfig,
    quant: QuantTables,
    regs: RegisterBlock,
    entropy: EntropyState,
    filter: LoopFilterParams,
    segmentation: Segmentation,
    prob_count: Vec<u8>,
    mb_per_frame: u32,
    frame_count: u64,
}

impl Vp8HwEncoder {
    /// Create a new encoder instance.
    pub fn new(config: EncoderConfig) -> Result<Self> {
        config.validate()?;

        let mb_per_row = config.mb_per_row();
        let mb_per_col = config.mb_per_col();
        debug!(
            width = config.width,
            height = config.height,
            mbs = mb_per_row * mb_per_col,
            "Creating VP8 frame setup"
        );

        let mbs = mb_per_row * mb_per_col;
        if config.quarter_pixel_mv == MvFeature::Adaptive && mbs > QPEL_MAX_MBS {
            warn!(mbs, "Quarter pixel MVs disabled above 1080p");
        }
        if config.split_mv == MvFeature::Adaptive && mbs > SPLIT_MV_MAX_MBS {
            warn!(mbs, "Split MVs disabled above 4CIF");
        }

        Ok(Self {
            quant: QuantTables::new(),
            regs: RegisterBlock::new(),
            entropy: EntropyState::default(),
            filter: LoopFilterParams::new(&config),
            segmentation: Segmentation::new(
                mb_per_row,
                mb_per_col,
                config.segmentation,
                config.segment_map_swap,
            ),
            prob_count: vec![0; PROB_COUNT_SIZE],
            mb_per_frame: mbs,
            frame_count: 0,
            config,
        })
    }

    /// Get encoder configuration.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Quantizer tables.
    pub fn quant_tables(&self) -> &QuantTables {
        &self.quant
    }

    /// Registers as last assembled.
    pub fn registers(&self) -> &RegisterBlock {
        &self.regs
    }

    /// Entropy probabilities.
    pub fn entropy(&self) -> &EntropyState {
        &self.entropy
    }

    /// Entropy probabilities, mutable for callers adapting them between frames.
    pub fn entropy_mut(&mut self) -> &mut EntropyState {
        &mut self.entropy
    }

    /// Loop filter state.
    pub fn loop_filter(&self) -> &LoopFilterParams {
        &self.filter
    }

    /// Segmentation state.
    pub fn segmentation(&self) -> &Segmentation {
        &self.segmentation
    }

    /// Segmentation state, mutable for loading external maps.
    pub fn segmentation_mut(&mut self) -> &mut Segmentation {
        &mut self.segmentation
    }

    /// Probability counter buffer the ASIC fills during a frame.
    pub fn prob_count(&self) -> &[u8] {
        &self.prob_count
    }

    /// Probability counter buffer, mutable for the backend's readback.
    pub fn prob_count_mut(&mut self) -> &mut [u8] {
        &mut self.prob_count
    }

    /// Frames coded so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Macroblocks per frame.
    pub fn mb_per_frame(&self) -> u32 {
        self.mb_per_frame
    }

    /// Reset the per-segment quantizers and levels to the frame values.
    ///
    /// Regions of interest and the automatic filter level refine them later.
    pub fn set_frame_params(&mut self, qp: i32) -> Result<()> {
        qp_index(qp)?;
        let level = self.filter.level;
        let params = &mut self.segmentation.params;
        params.qp = [qp; SGM_CNT];
        params.level = [level; SGM_CNT];
        Ok(())
    }

    /// Apply regions of interest and refresh the segment map.
    pub fn set_segmentation(&mut self, qp: i32, picture: &Picture) -> Result<()> {
        qp_index(qp)?;
        self.segmentation.update(qp, &self.config.roi, picture.key_frame);
        Ok(())
    }

    /// Derive the loop filter level, sharpness and deltas.
    pub fn set_filter_parameters(&mut self, qp: i32, picture: &Picture) -> Result<()> {
        set_filter_parameters(
            &mut self.filter,
            &mut self.segmentation.params,
            &self.config,
            qp,
            picture,
        )
    }

    /// Fill the register block for the frame about to start.
    ///
    /// The frame headers must already be in `stream`. The segment map and
    /// the filter delta history stay pending until [`Self::code_frame`] has
    /// started the ASIC.
    pub fn set_new_frame(
        &mut self,
        qp: i32,
        picture: &Picture,
        stream: &mut OutputStream,
    ) -> Result<()> {
        let qp_idx = qp_index(qp)?;
        let regs = &mut self.regs;

        stream.hand_over(regs)?;

        regs.disable_quarter_pixel_mv = match self.config.quarter_pixel_mv {
            MvFeature::Off => true,
            MvFeature::Adaptive => self.mb_per_frame > QPEL_MAX_MBS,
            MvFeature::On => false,
        };

        // Tells the ASIC to read the probability tables.
        regs.enable_cabac = true;

        regs.split_mv_mode = match self.config.split_mv {
            MvFeature::Off => false,
            MvFeature::Adaptive => self.mb_per_frame <= SPLIT_MV_MAX_MBS,
            MvFeature::On => true,
        };

        set_mv_penalties(regs, qp_idx, &self.entropy, &self.config.penalties);

        let params = self.segmentation.params;
        for i in 0..SGM_CNT {
            let sgm_qp = params.qp[i];
            regs.segment_quant[i] = SegmentQuant {
                y1: *self.quant.y1(sgm_qp)?,
                y2: *self.quant.y2(sgm_qp)?,
                chroma: *self.quant.chroma(sgm_qp)?,
            };
            regs.filter_level[i] = params.level[i].clamp(0, 63) as u32;
            trace!(segment = i, qp = sgm_qp, level = params.level[i], "Segment registers");
        }

        let bool_state = stream.bool_state;
        regs.bool_enc_value = bool_state.bottom;
        regs.bool_enc_value_bits = (24 - bool_state.bits_left).max(0) as u32;
        regs.bool_enc_range = bool_state.range;

        regs.cp_target = None;

        regs.frame_coding_type = if picture.key_frame {
            FrameCodingType::Intra
        } else {
            FrameCodingType::Inter
        };

        regs.dct_partitions = self.config.dct_partitions as u32;
        regs.filter_disable = match self.config.filter_type {
            FilterType::Normal => 0,
            FilterType::Simple => 1,
        };
        regs.filter_sharpness = self.filter.sharpness as u32;
        regs.segment_enable = self.segmentation.enabled;
        regs.roi = self.config.roi.map(|area| area.filter(RoiArea::is_active));
        regs.segment_map_update = self.segmentation.map_modified;

        regs.lf_ref_delta = self.filter.ref_delta;
        regs.lf_mode_delta = self.filter.mode_delta;

        // Intra penalties follow the last segment's quantizer.
        let intra_qp = qp_index(params.qp[SGM_CNT - 1])?;
        set_intra_prediction_penalties(regs, intra_qp as u32, self.config.penalties.intra16_favor);

        self.prob_count.fill(0);

        debug!(
            frame = self.frame_count,
            qp,
            key_frame = picture.key_frame,
            strm_base = regs.output_strm_base,
            first_free_bit = regs.first_free_bit,
            qpel = !regs.disable_quarter_pixel_mv,
            split_mv = regs.split_mv_mode,
            "Frame registers set"
        );

        Ok(())
    }

    /// Set up and start one frame.
    ///
    /// Derives every frame parameter for quantizer `qp`, lets the backend
    /// write the headers into `stream`, fills the registers and starts the
    /// ASIC.
    pub fn code_frame<B: AsicBackend + ?Sized>(
        &mut self,
        qp: i32,
        picture: &Picture,
        stream: &mut OutputStream,
        backend: &mut B,
    ) -> Result<()> {
        self.set_frame_params(qp)?;

        backend.init_entropy(&mut self.entropy, picture)?;
        self.set_segmentation(qp, picture)?;
        self.set_filter_parameters(qp, picture)?;

        stream.reset();
        let ctx = HeaderContext {
            picture,
            qp,
            filter_level: self.filter.level,
            filter_sharpness: self.filter.sharpness,
            ref_delta: &self.filter.ref_delta,
            mode_delta: &self.filter.mode_delta,
            segmentation: &self.segmentation,
            entropy: &self.entropy,
        };
        backend.write_frame_headers(&ctx, stream)?;

        self.set_new_frame(qp, picture, stream)?;

        backend.write_entropy_tables(&self.entropy)?;
        backend.start_frame(&self.regs)?;

        // Only a started frame consumes the map and the coded deltas.
        self.segmentation.frame_done();
        self.filter.commit_deltas();
        self.frame_count += 1;
        Ok(())
    }
}

/// Resolve the motion related penalties for quantizer index `qp`.
fn set_mv_penalties(
    regs: &mut RegisterBlock,
    qp: usize,
    entropy: &EntropyState,
    overrides: &PenaltyOverrides,
) {
    let q = qp as i32;

    regs.inter_favor = overrides.inter_favor.unwrap_or_else(|| {
        let tmp = 128 - entropy.intra_prob as i32;
        if tmp < 0 {
            // Signed 16-bit register.
            (tmp & 0xFFFF) as u32
        } else {
            (q * 2 - 40).max(0) as u32
        }
    });

    let diff_mv_defaults = [64 / 2, 60 / 2 * 32, 8];
    for (i, default) in diff_mv_defaults.into_iter().enumerate() {
        regs.diff_mv_penalty[i] = overrides.diff_mv[i].unwrap_or(default);
    }

    // Zero/nearest/near.
    regs.skip_penalty = overrides
        .skip
        .unwrap_or(if q >= 100 { (3 * q / 4) as u32 } else { 0 });
    regs.golden_penalty = overrides.golden.unwrap_or((5 * q / 4 - 10).max(0) as u32);

    let split = SPLIT_PENALTY[qp];
    let split_defaults = [
        (split / 2).min(1023),
        ((2 * split + 40) / 4).min(1023),
        0,
        ((8 * split + 500) / 16).min(511),
    ];
    for (i, default) in split_defaults.into_iter().enumerate() {
        regs.split_penalty[i] = overrides.split[i].unwrap_or(default as u32);
    }

    let weight = QPEL_WEIGHT[qp];
    for i in 0..PENALTY_TABLE_SIZE {
        let mvd = (i * 2) as i32;
        regs.dmv_penalty[i] = mvd as u32;
        let y = cost_mv(mvd, &entropy.mv_probs[0]);
        let x = cost_mv(mvd, &entropy.mv_probs[1]);
        regs.dmv_qpel_penalty[i] = (((y + x + 1) / 2 * weight) >> 8).min(255) as u32;
    }
}

/// Intra mode penalties for quantizer `qp`.
pub fn set_intra_prediction_penalties(
    regs: &mut RegisterBlock,
    qp: u32,
    intra16_favor: Option<u32>,
) {
    let scale = qp as i32 * 2 + 8;
    for (penalty, &tree) in regs.intra_bmode_penalty.iter_mut().zip(INTRA_4X4_TREE_PENALTY.iter()) {
        *penalty = ((tree * scale) >> 8) as u32;
    }

    let scale = qp as i32 * 2 + 64;
    for (penalty, &tree) in regs.intra_mode_penalty.iter_mut().zip(INTRA_16X16_TREE_PENALTY.iter()) {
        *penalty = ((tree * scale) >> 8) as u32;
    }

    regs.intra16_favor = intra16_favor.unwrap_or(qp * 1024 / 128);
}
