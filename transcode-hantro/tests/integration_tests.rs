//! Integration tests for Hantro VP8 frame setup.
//!
//! These tests drive whole frames through `Vp8HwEncoder::code_frame` with
//! recording backends and check the register block the ASIC would receive.

use pretty_assertions::assert_eq;
use transcode_hantro::{
    AsicBackend, BoolEncoderState, CaptureBackend, EncoderConfig, EntropyState, FrameCodingType,
    HantroError, HeaderContext, MvFeature, OutputStream, Picture, RegisterBlock, Result, RoiArea,
    Vp8HwEncoder, SGM_CNT,
};

/// Backend writing a short header and leaving a known bool encoder state.
#[derive(Default)]
struct ScriptedBackend {
    fail_start: bool,
    started: u32,
    segment_updates: Vec<bool>,
    headers: Vec<(i32, i32)>,
}

impl AsicBackend for ScriptedBackend {
    fn init_entropy(&mut self, entropy: &mut EntropyState, picture: &Picture) -> Result<()> {
        entropy.intra_prob = if picture.key_frame { 63 } else { 200 };
        Ok(())
    }

    fn write_frame_headers(
        &mut self,
        ctx: &HeaderContext<'_>,
        stream: &mut OutputStream,
    ) -> Result<()> {
        self.segment_updates.push(ctx.segmentation.needs_update());
        self.headers.push((ctx.qp, ctx.filter_level));

        stream.write_header(&[0x50, 0x42, 0x00])?;
        stream.write_partition(&[0xAB; 9])?;
        stream.bool_state = BoolEncoderState {
            bottom: 0x00AB_CD00,
            bits_left: 10,
            range: 200,
        };
        Ok(())
    }

    fn start_frame(&mut self, _regs: &RegisterBlock) -> Result<()> {
        if self.fail_start {
            return Err(HantroError::Backend("device busy".to_string()));
        }
        self.started += 1;
        Ok(())
    }
}

fn code(
    encoder: &mut Vp8HwEncoder,
    qp: i32,
    picture: Picture,
    backend: &mut CaptureBackend,
) -> RegisterBlock {
    let mut stream = OutputStream::new(64 * 1024, 16 * 1024);
    encoder
        .code_frame(qp, &picture, &mut stream, backend)
        .unwrap();
    backend.last_regs.clone().unwrap()
}

// ============================================================================
// Stream Hand-over Tests
// ============================================================================

#[test]
fn test_stream_registers_after_header() {
    let mut encoder = Vp8HwEncoder::new(EncoderConfig::new(640, 480)).unwrap();
    let mut stream = OutputStream::new(64 * 1024, 16 * 1024);
    let mut backend = CaptureBackend::new(10, 5);

    encoder
        .code_frame(36, &Picture::key(), &mut stream, &mut backend)
        .unwrap();
    let regs = backend.last_regs.unwrap();

    assert_eq!(regs.output_strm_size, 2048);
    assert_eq!(regs.output_strm_base, 8);
    assert_eq!(regs.first_free_bit, 56);
    assert_eq!(regs.strm_start_msb, 0x9D9D_2424);
    assert_eq!(regs.strm_start_lsb, 0x2424_2400);

    // Untouched header writer state.
    assert_eq!(regs.bool_enc_value, 0);
    assert_eq!(regs.bool_enc_value_bits, 0);
    assert_eq!(regs.bool_enc_range, 255);
}

#[test]
fn test_bool_encoder_state_handed_over() {
    let mut encoder = Vp8HwEncoder::new(EncoderConfig::new(176, 144)).unwrap();
    let mut stream = OutputStream::new(4096, 1024);
    let mut backend = ScriptedBackend::default();

    encoder
        .code_frame(20, &Picture::key(), &mut stream, &mut backend)
        .unwrap();
    let regs = encoder.registers();

    assert_eq!(regs.bool_enc_value, 0x00AB_CD00);
    assert_eq!(regs.bool_enc_value_bits, 14);
    assert_eq!(regs.bool_enc_range, 200);

    // 12 bytes written: half a word pending.
    assert_eq!(regs.output_strm_base, 8);
    assert_eq!(regs.first_free_bit, 32);
    assert_eq!(regs.strm_start_msb, 0xABAB_ABAB);
    assert_eq!(regs.strm_start_lsb, 0);
    assert_eq!(backend.started, 1);
}

// ============================================================================
// Multi-frame Tests
// ============================================================================

#[test]
fn test_key_then_inter_frames() {
    let mut encoder = Vp8HwEncoder::new(EncoderConfig::new(640, 480)).unwrap();
    let mut backend = CaptureBackend::new(10, 0);

    let regs = code(&mut encoder, 36, Picture::key(), &mut backend);
    assert_eq!(regs.frame_coding_type, FrameCodingType::Intra);
    assert_eq!(regs.filter_level, [26; SGM_CNT]);
    assert_eq!(regs.lf_ref_delta, [2, 0, -2, -2]);
    assert_eq!(regs.lf_mode_delta, [4, -2, 2, 4]);
    assert!(regs.enable_cabac);
    assert!(regs.cp_target.is_none());

    let regs = code(&mut encoder, 50, Picture::inter(), &mut backend);
    assert_eq!(regs.frame_coding_type, FrameCodingType::Inter);
    assert_eq!(regs.filter_level, [15; SGM_CNT]);
    assert_eq!(encoder.frame_count(), 2);
    assert_eq!(backend.frames_started, 2);
}

#[test]
fn test_segment_parameters_resent_only_on_change() {
    let config = EncoderConfig::new(320, 240).roi(1, RoiArea::new(0, 0, 3, 3, 10));
    let mut encoder = Vp8HwEncoder::new(config).unwrap();
    let mut stream = OutputStream::new(4096, 1024);
    let mut backend = ScriptedBackend::default();

    for picture in [Picture::key(), Picture::inter(), Picture::inter()] {
        encoder
            .code_frame(60, &picture, &mut stream, &mut backend)
            .unwrap();
    }

    // Key frame, then the level change to inter, then nothing new.
    assert_eq!(backend.segment_updates, vec![true, true, false]);
    assert_eq!(encoder.segmentation().params.qp, [60, 60, 50, 60]);
    assert_eq!(backend.headers[0], (60, 38));
}

#[test]
fn test_inter_favor_follows_intra_probability() {
    let mut encoder = Vp8HwEncoder::new(EncoderConfig::new(176, 144)).unwrap();
    let mut stream = OutputStream::new(4096, 1024);
    let mut backend = ScriptedBackend::default();

    encoder
        .code_frame(80, &Picture::key(), &mut stream, &mut backend)
        .unwrap();
    assert_eq!(encoder.registers().inter_favor, 120);

    encoder
        .code_frame(80, &Picture::inter(), &mut stream, &mut backend)
        .unwrap();
    assert_eq!(encoder.registers().inter_favor, 0xFFB8);
    assert_eq!(encoder.registers().inter_favor_signed(), -72);
}

#[test]
fn test_intra_penalties_follow_frame_qp() {
    let mut encoder = Vp8HwEncoder::new(EncoderConfig::new(176, 144)).unwrap();
    let mut backend = CaptureBackend::new(4, 4);

    let regs = code(&mut encoder, 40, Picture::key(), &mut backend);
    assert_eq!(regs.intra16_favor, 320);
    assert_eq!(regs.intra_bmode_penalty[0], (280 * 88) >> 8);
    assert_eq!(regs.intra_mode_penalty[1], (841 * 144) >> 8);
}

// ============================================================================
// Feature Selection Tests
// ============================================================================

#[test]
fn test_adaptive_features_at_1080p() {
    let mut backend = CaptureBackend::new(10, 0);

    let mut encoder = Vp8HwEncoder::new(EncoderConfig::new(1920, 1080)).unwrap();
    assert_eq!(encoder.mb_per_frame(), 8160);
    let regs = code(&mut encoder, 30, Picture::key(), &mut backend);
    assert!(!regs.disable_quarter_pixel_mv);
    assert!(!regs.split_mv_mode);

    let mut encoder = Vp8HwEncoder::new(EncoderConfig::new(2048, 1088)).unwrap();
    let regs = code(&mut encoder, 30, Picture::key(), &mut backend);
    assert!(regs.disable_quarter_pixel_mv);

    let mut encoder = Vp8HwEncoder::new(EncoderConfig::new(704, 576)).unwrap();
    assert_eq!(encoder.mb_per_frame(), 1584);
    let regs = code(&mut encoder, 30, Picture::key(), &mut backend);
    assert!(regs.split_mv_mode);
}

#[test]
fn test_forced_features_at_1080p() {
    let config = EncoderConfig::new(2048, 1088)
        .quarter_pixel_mv(MvFeature::On)
        .split_mv(MvFeature::On)
        .dct_partitions(3);
    let mut encoder = Vp8HwEncoder::new(config).unwrap();
    let mut backend = CaptureBackend::new(10, 0);

    let regs = code(&mut encoder, 30, Picture::key(), &mut backend);
    assert!(!regs.disable_quarter_pixel_mv);
    assert!(regs.split_mv_mode);
    assert_eq!(regs.dct_partitions, 3);
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_penalty_overrides_from_json() {
    let config: EncoderConfig = serde_json::from_str(
        r#"{
            "width": 176,
            "height": 144,
            "filter_type": "simple",
            "penalties": {"skip": 5, "golden": 6, "intra16_favor": 77}
        }"#,
    )
    .unwrap();
    let mut encoder = Vp8HwEncoder::new(config).unwrap();
    let mut backend = CaptureBackend::new(10, 0);

    let regs = code(&mut encoder, 100, Picture::key(), &mut backend);
    assert_eq!(regs.skip_penalty, 5);
    assert_eq!(regs.golden_penalty, 6);
    assert_eq!(regs.intra16_favor, 77);
    assert_eq!(regs.inter_favor, 160);
    assert_eq!(regs.diff_mv_penalty, [32, 960, 8]);
    assert_eq!(regs.filter_disable, 1);

    // Overrides stay in force for later frames.
    let regs = code(&mut encoder, 20, Picture::inter(), &mut backend);
    assert_eq!(regs.skip_penalty, 5);
    assert_eq!(regs.golden_penalty, 6);
}

#[test]
fn test_fixed_filter_settings() {
    let config = EncoderConfig::new(176, 144)
        .filter_level(12)
        .filter_sharpness(4);
    let mut encoder = Vp8HwEncoder::new(config).unwrap();
    let mut backend = CaptureBackend::new(10, 0);

    let regs = code(&mut encoder, 90, Picture::key(), &mut backend);
    assert_eq!(regs.filter_level, [12; SGM_CNT]);
    assert_eq!(regs.filter_sharpness, 4);
    assert_eq!(regs.filter_disable, 0);
}

// ============================================================================
// Segmentation Tests
// ============================================================================

#[test]
fn test_external_segment_map() {
    let config = EncoderConfig::new(64, 64).segmentation(true);
    let mut encoder = Vp8HwEncoder::new(config).unwrap();
    let mut backend = CaptureBackend::new(10, 0);

    encoder.segmentation_mut().set_id(5, 2).unwrap();
    let regs = code(&mut encoder, 40, Picture::key(), &mut backend);

    assert!(regs.segment_enable);
    assert!(regs.segment_map_update);
    assert_eq!(encoder.segmentation().id_count, [15, 0, 1, 0]);
    assert!(encoder.segmentation().map().is_hw_order());
    assert_eq!(encoder.segmentation().map().id(5), Some(2));

    let regs = code(&mut encoder, 40, Picture::inter(), &mut backend);
    assert!(!regs.segment_map_update);
}

#[test]
fn test_two_regions_of_interest() {
    let config = EncoderConfig::new(128, 64)
        .roi(0, RoiArea::new(0, 0, 3, 3, 8))
        .roi(1, RoiArea::new(2, 1, 5, 2, -8));
    let mut encoder = Vp8HwEncoder::new(config).unwrap();
    let mut backend = CaptureBackend::new(10, 0);

    let regs = code(&mut encoder, 126, Picture::key(), &mut backend);

    let segmentation = encoder.segmentation();
    assert_eq!(segmentation.params.qp, [126, 118, 127, 126]);
    // Region 1 overlaps region 0 on four macroblocks.
    assert_eq!(segmentation.id_count, [12, 12, 8, 0]);
    assert_eq!(regs.segment_quant[0], regs.segment_quant[3]);
    assert_eq!(
        regs.segment_quant[1].y1,
        *encoder.quant_tables().y1(118).unwrap()
    );
    assert_eq!(
        regs.segment_quant[2].chroma,
        *encoder.quant_tables().chroma(127).unwrap()
    );
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[test]
fn test_backend_failure_propagates() {
    let mut encoder = Vp8HwEncoder::new(EncoderConfig::new(176, 144)).unwrap();
    let mut stream = OutputStream::new(4096, 1024);
    let mut backend = ScriptedBackend {
        fail_start: true,
        ..Default::default()
    };

    let result = encoder.code_frame(30, &Picture::key(), &mut stream, &mut backend);
    assert!(matches!(result, Err(HantroError::Backend(_))));
    assert_eq!(encoder.frame_count(), 0);
}

#[test]
fn test_invalid_qp_rejected() {
    let mut encoder = Vp8HwEncoder::new(EncoderConfig::new(176, 144)).unwrap();
    let mut stream = OutputStream::new(4096, 1024);
    let mut backend = CaptureBackend::new(10, 0);

    let result = encoder.code_frame(128, &Picture::key(), &mut stream, &mut backend);
    assert!(matches!(result, Err(HantroError::InvalidQp(128))));
    assert_eq!(backend.frames_started, 0);
}

#[test]
fn test_probability_counters_cleared() {
    let mut encoder = Vp8HwEncoder::new(EncoderConfig::new(176, 144)).unwrap();
    let mut backend = CaptureBackend::new(10, 0);

    encoder.prob_count_mut().fill(0xFF);
    code(&mut encoder, 30, Picture::key(), &mut backend);
    assert!(encoder.prob_count().iter().all(|&b| b == 0));
}

#[test]
fn test_registers_serialize() {
    let mut encoder = Vp8HwEncoder::new(EncoderConfig::new(176, 144)).unwrap();
    let mut backend = CaptureBackend::new(10, 0);
    let regs = code(&mut encoder, 30, Picture::inter(), &mut backend);

    let value = serde_json::to_value(&regs).unwrap();
    assert_eq!(value["frame_coding_type"], "Inter");
    assert_eq!(value["dmv_penalty"].as_array().unwrap().len(), 128);
    assert_eq!(value["segment_quant"].as_array().unwrap().len(), SGM_CNT);
}
