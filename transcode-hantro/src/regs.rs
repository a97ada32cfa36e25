//! The ASIC's view of one frame's parameters.
//!
//! [`RegisterBlock`] is filled by the frame assembler and handed to the
//! backend when the frame is started. Field names follow the hardware
//! register names; packing them into the actual register words is the
//! backend's job.

use serde::{Deserialize, Serialize};

use crate::config::RoiArea;
use crate::quant::QuantEntry;
use crate::{PENALTY_TABLE_SIZE, ROI_COUNT, SGM_CNT};

/// Frame coding type register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FrameCodingType {
    /// Key frame.
    #[default]
    Intra,
    /// Inter frame.
    Inter,
}

/// Quantizer registers of one segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SegmentQuant {
    /// First order luma.
    pub y1: QuantEntry,
    /// Second order luma.
    pub y2: QuantEntry,
    /// Chroma.
    pub chroma: QuantEntry,
}

/// Caller-fixed penalties.
///
/// A `None` entry is derived from the frame quantizer every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyOverrides {
    /// Bias towards inter prediction, 16-bit two's complement.
    pub inter_favor: Option<u32>,
    /// Bias towards 16x16 intra prediction.
    pub intra16_favor: Option<u32>,
    /// Differential MV penalties.
    pub diff_mv: [Option<u32>; 3],
    /// Skip (zero/nearest/near) penalty.
    pub skip: Option<u32>,
    /// Golden reference penalty.
    pub golden: Option<u32>,
    /// Split MV penalties per partitioning.
    pub split: [Option<u32>; 4],
}

/// Hardware registers for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterBlock {
    /// Size of each DCT partition buffer in 64-bit words, multiple of 8.
    pub output_strm_size: u32,
    /// 64-bit aligned offset where the ASIC continues the stream.
    pub output_strm_base: u32,
    /// Bits of header already present in the word at the stream base.
    pub first_free_bit: u32,
    /// First four header remainder bytes, big endian.
    pub strm_start_msb: u32,
    /// Header remainder bytes 4..7, big endian, left aligned.
    pub strm_start_lsb: u32,

    /// Bool encoder low value left by the header writer.
    pub bool_enc_value: u32,
    /// Bits pending in the bool encoder value.
    pub bool_enc_value_bits: u32,
    /// Bool encoder range.
    pub bool_enc_range: u32,

    /// Skip quarter pixel motion search.
    pub disable_quarter_pixel_mv: bool,
    /// Read probability tables from memory.
    pub enable_cabac: bool,
    /// Search split MVs.
    pub split_mv_mode: bool,

    /// Inter prediction bias, 16-bit two's complement.
    pub inter_favor: u32,
    /// 16x16 intra prediction bias.
    pub intra16_favor: u32,
    /// Differential MV penalties.
    pub diff_mv_penalty: [u32; 3],
    /// Skip penalty.
    pub skip_penalty: u32,
    /// Golden reference penalty.
    pub golden_penalty: u32,
    /// Split MV penalties; entry 2 is only set by an override.
    pub split_penalty: [u32; 4],
    /// Full pel DMV penalty table.
    pub dmv_penalty: Vec<u32>,
    /// Quarter pel DMV penalty table.
    pub dmv_qpel_penalty: Vec<u32>,
    /// 4x4 intra mode penalties.
    pub intra_bmode_penalty: [u32; 10],
    /// 16x16 intra mode penalties.
    pub intra_mode_penalty: [u32; 4],

    /// Quantizer registers per segment.
    pub segment_quant: [SegmentQuant; SGM_CNT],
    /// Loop filter level per segment.
    pub filter_level: [u32; SGM_CNT],
    /// Reference frame loop filter deltas.
    pub lf_ref_delta: [i32; 4],
    /// Macroblock mode loop filter deltas.
    pub lf_mode_delta: [i32; 4],
    /// Filter disable bit, driven by the configured filter type.
    pub filter_disable: u32,
    /// Loop filter sharpness.
    pub filter_sharpness: u32,

    /// Macroblock rate control checkpoints; unused for VP8.
    pub cp_target: Option<Vec<u32>>,
    /// Frame coding type.
    pub frame_coding_type: FrameCodingType,
    /// log2 of the DCT partition count.
    pub dct_partitions: u32,
    /// Segmentation enabled.
    pub segment_enable: bool,
    /// The ASIC must read the segment map.
    pub segment_map_update: bool,
    /// Regions of interest, macroblock rectangles with their qp deltas.
    pub roi: [Option<RoiArea>; ROI_COUNT],
}

impl RegisterBlock {
    /// Create an all-zero register block.
    pub fn new() -> Self {
        Self {
            output_strm_size: 0,
            output_strm_base: 0,
            first_free_bit: 0,
            strm_start_msb: 0,
            strm_start_lsb: 0,
            bool_enc_value: 0,
            bool_enc_value_bits: 0,
            bool_enc_range: 0,
            disable_quarter_pixel_mv: false,
            enable_cabac: false,
            split_mv_mode: false,
            inter_favor: 0,
            intra16_favor: 0,
            diff_mv_penalty: [0; 3],
            skip_penalty: 0,
            golden_penalty: 0,
            split_penalty: [0; 4],
            dmv_penalty: vec![0; PENALTY_TABLE_SIZE],
            dmv_qpel_penalty: vec![0; PENALTY_TABLE_SIZE],
            intra_bmode_penalty: [0; 10],
            intra_mode_penalty: [0; 4],
            segment_quant: [SegmentQuant::default(); SGM_CNT],
            filter_level: [0; SGM_CNT],
            lf_ref_delta: [0; 4],
            lf_mode_delta: [0; 4],
            filter_disable: 0,
            filter_sharpness: 0,
            cp_target: None,
            frame_coding_type: FrameCodingType::default(),
            dct_partitions: 0,
            segment_enable: false,
            segment_map_update: false,
            roi: [None; ROI_COUNT],
        }
    }

    /// Inter favor as the signed value the 16-bit register holds.
    pub fn inter_favor_signed(&self) -> i16 {
        self.inter_favor as u16 as i16
    }
}

impl Default for RegisterBlock {
    fn default() -> Self {
        Self::new()
    }
}
