//! Hooks into the hardware-facing side of frame coding.
//!
//! Entropy bootstrap, frame header writing, probability table upload and the
//! ASIC trigger all depend on the device. [`AsicBackend`] is the seam the
//! frame assembler calls them through.

use crate::entropy::EntropyState;
use crate::error::Result;
use crate::regs::RegisterBlock;
use crate::segmentation::Segmentation;
use crate::stream::OutputStream;
use crate::Picture;

/// Frame parameters visible to the header writer.
#[derive(Debug, Clone, Copy)]
pub struct HeaderContext<'a> {
    /// Picture being coded.
    pub picture: &'a Picture,
    /// Frame quantizer index.
    pub qp: i32,
    /// Frame loop filter level.
    pub filter_level: i32,
    /// Loop filter sharpness.
    pub filter_sharpness: i32,
    /// Reference frame filter deltas.
    pub ref_delta: &'a [i32; 4],
    /// Mode filter deltas.
    pub mode_delta: &'a [i32; 4],
    /// Segmentation state; the header writer decides from
    /// [`Segmentation::needs_update`] whether to resend segment data.
    pub segmentation: &'a Segmentation,
    /// Probabilities for the frame.
    pub entropy: &'a EntropyState,
}

/// Device side of VP8 frame coding.
pub trait AsicBackend {
    /// Prepare the frame's probabilities before any parameter is derived.
    fn init_entropy(&mut self, _entropy: &mut EntropyState, _picture: &Picture) -> Result<()> {
        Ok(())
    }

    /// Write the frame tag and the software part of the first partition.
    ///
    /// Must leave the first partition's bool encoder state in
    /// [`OutputStream::bool_state`].
    fn write_frame_headers(&mut self, ctx: &HeaderContext<'_>, stream: &mut OutputStream)
        -> Result<()>;

    /// Upload the final probability tables for the ASIC.
    fn write_entropy_tables(&mut self, _entropy: &EntropyState) -> Result<()> {
        Ok(())
    }

    /// Program the registers and start the ASIC.
    fn start_frame(&mut self, regs: &RegisterBlock) -> Result<()>;
}

/// Backend that records what it is handed instead of driving hardware.
///
/// Writes a fixed number of placeholder header bytes so stream alignment
/// handling is exercised.
#[derive(Debug, Clone, Default)]
pub struct CaptureBackend {
    /// Frame tag bytes to emit.
    pub header_len: usize,
    /// First partition bytes to emit.
    pub partition_len: usize,
    /// Registers of the last started frame.
    pub last_regs: Option<RegisterBlock>,
    /// Number of frames started.
    pub frames_started: u64,
}

impl CaptureBackend {
    /// Create a backend emitting the given header sizes.
    pub fn new(header_len: usize, partition_len: usize) -> Self {
        Self {
            header_len,
            partition_len,
            ..Default::default()
        }
    }
}

impl AsicBackend for CaptureBackend {
    fn write_frame_headers(
        &mut self,
        ctx: &HeaderContext<'_>,
        stream: &mut OutputStream,
    ) -> Result<()> {
        let tag = if ctx.picture.key_frame { 0x9D } else { 0x01 };
        stream.write_header(&vec![tag; self.header_len])?;
        stream.write_partition(&vec![ctx.qp as u8; self.partition_len])?;
        Ok(())
    }

    fn start_frame(&mut self, regs: &RegisterBlock) -> Result<()> {
        self.last_regs = Some(regs.clone());
        self.frames_started += 1;
        Ok(())
    }
}
