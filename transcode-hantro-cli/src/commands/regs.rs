//! Register dump command.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use console::style;
use serde::Serialize;
use tracing::debug;
use transcode_hantro::{
    CaptureBackend, EncoderConfig, OutputStream, Picture, RegisterBlock, Vp8HwEncoder,
};

/// Registers of one coded frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameDump {
    /// Frame number.
    pub frame: u32,
    /// Key frame.
    pub key_frame: bool,
    /// Frame quantizer index.
    pub qp: i32,
    /// Register block handed to the ASIC.
    pub registers: RegisterBlock,
    /// Segment map as the ASIC reads it, when segmentation is on.
    pub segment_map: Option<Vec<u8>>,
}

/// Code frames and print the resulting registers.
#[derive(Args, Debug)]
pub struct CmdRegs {
    /// JSON encoder configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Frame width, ignored with --config.
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Frame height, ignored with --config.
    #[arg(long, default_value_t = 480)]
    pub height: u32,

    /// Quantizer index (0-127).
    #[arg(short, long, default_value_t = 36)]
    pub qp: i32,

    /// Frames to code; the first one is a key frame.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub frames: u32,

    /// Frame tag bytes the emulated header writer emits.
    #[arg(long, default_value_t = 10)]
    pub header_bytes: usize,

    /// First partition bytes the emulated header writer emits.
    #[arg(long, default_value_t = 0)]
    pub partition_bytes: usize,

    /// Output in JSON format.
    #[arg(long)]
    pub json: bool,
}

impl CmdRegs {
    /// Execute the regs command.
    pub fn run(&self) -> anyhow::Result<()> {
        let config = self.load_config()?;
        let mut encoder =
            Vp8HwEncoder::new(config).context("Invalid encoder configuration")?;

        // Dimensions are validated, one byte per pixel cannot overflow.
        let config = encoder.config();
        let stream_size = (config.width as usize * config.height as usize).max(64 * 1024);
        let partition_size = u32::try_from(stream_size / 4)?;
        let mut stream = OutputStream::new(stream_size, partition_size);
        let mut backend = CaptureBackend::new(self.header_bytes, self.partition_bytes);

        let mut dumps = Vec::with_capacity(self.frames as usize);
        for frame in 0..self.frames {
            let picture = if frame == 0 {
                Picture::key()
            } else {
                Picture::inter()
            };
            encoder
                .code_frame(self.qp, &picture, &mut stream, &mut backend)
                .with_context(|| format!("Frame {} setup failed", frame))?;
            debug!(frame, "Frame coded");

            dumps.push(FrameDump {
                frame,
                key_frame: picture.key_frame,
                qp: self.qp,
                registers: encoder.registers().clone(),
                segment_map: encoder
                    .registers()
                    .segment_enable
                    .then(|| encoder.segmentation().map().to_bytes()),
            });
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&dumps)?);
        } else {
            for dump in &dumps {
                print_frame(dump);
            }
        }

        Ok(())
    }

    /// Encoder configuration from `--config`, or from the size flags.
    pub fn load_config(&self) -> anyhow::Result<EncoderConfig> {
        match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Cannot read {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Cannot parse {}", path.display()))
            }
            None => Ok(EncoderConfig::new(self.width, self.height)),
        }
    }
}

fn print_frame(dump: &FrameDump) {
    let regs = &dump.registers;
    let kind = if dump.key_frame { "key" } else { "inter" };

    println!();
    println!(
        "{} {} ({}, qp {})",
        style("Frame").cyan().bold(),
        style(dump.frame).cyan().bold(),
        kind,
        dump.qp
    );
    println!("{}", style("-".repeat(50)).dim());

    print_row("Stream base", format!("{:#x}", regs.output_strm_base));
    print_row("Stream size", regs.output_strm_size);
    print_row("First free bit", regs.first_free_bit);
    print_row(
        "Stream start",
        format!("{:#010x} {:#010x}", regs.strm_start_msb, regs.strm_start_lsb),
    );
    print_row(
        "Bool encoder",
        format!(
            "value {:#x}, bits {}, range {}",
            regs.bool_enc_value, regs.bool_enc_value_bits, regs.bool_enc_range
        ),
    );
    print_row("Quarter pel MV", !regs.disable_quarter_pixel_mv);
    print_row("Split MV", regs.split_mv_mode);
    print_row("Inter favor", regs.inter_favor_signed());
    print_row("Intra16 favor", regs.intra16_favor);
    print_row("Skip / golden", format!("{} / {}", regs.skip_penalty, regs.golden_penalty));
    print_row("Split penalty", format!("{:?}", regs.split_penalty));
    print_row("Filter level", format!("{:?}", regs.filter_level));
    print_row("Filter sharpness", regs.filter_sharpness);
    print_row("Ref deltas", format!("{:?}", regs.lf_ref_delta));
    print_row("Mode deltas", format!("{:?}", regs.lf_mode_delta));
    print_row(
        "Segmentation",
        format!(
            "{} (map update: {})",
            regs.segment_enable, regs.segment_map_update
        ),
    );
    for (i, quant) in regs.segment_quant.iter().enumerate() {
        print_row(
            &format!("Segment {} dequant", i),
            format!(
                "y1 {:?} y2 {:?} uv {:?}",
                quant.y1.dequant, quant.y2.dequant, quant.chroma.dequant
            ),
        );
    }
}

fn print_row(label: &str, value: impl std::fmt::Display) {
    println!("  {:<20} {}", style(label).white().bold(), value);
}
