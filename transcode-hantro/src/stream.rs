//! Output stream bookkeeping between the software header writer and the ASIC.
//!
//! Software writes the frame tag and the start of the first partition; the
//! ASIC continues the first partition from a 64-bit aligned address. The
//! header bytes sitting in the last partial 64-bit word are handed to the
//! ASIC through registers so it can rewrite that word.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{HantroError, Result};
use crate::regs::RegisterBlock;

/// Bool encoder state left behind by the software header writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolEncoderState {
    /// Low end of the coding interval.
    pub bottom: u32,
    /// Bits left before the next byte is flushed.
    pub bits_left: i32,
    /// Current range.
    pub range: u32,
}

impl Default for BoolEncoderState {
    fn default() -> Self {
        Self {
            bottom: 0,
            bits_left: 24,
            range: 255,
        }
    }
}

/// Linear output buffer shared by software and the ASIC.
///
/// The buffer start is assumed to be 64-bit aligned in device memory.
#[derive(Debug, Clone)]
pub struct OutputStream {
    data: Vec<u8>,
    /// Bytes written for the frame tag (first software buffer).
    pub header_bytes: usize,
    /// Bytes written for the first partition (second software buffer).
    pub partition_bytes: usize,
    /// Bool encoder state of the first partition writer.
    pub bool_state: BoolEncoderState,
    /// Size in bytes of each DCT partition buffer.
    pub dct_partition_size: u32,
}

impl OutputStream {
    /// Create a zeroed stream buffer of `capacity` bytes.
    pub fn new(capacity: usize, dct_partition_size: u32) -> Self {
        Self {
            data: vec![0; capacity],
            header_bytes: 0,
            partition_bytes: 0,
            bool_state: BoolEncoderState::default(),
            dct_partition_size,
        }
    }

    /// Whole buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whole buffer, mutable.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Reset the write positions for a new frame.
    pub fn reset(&mut self) {
        self.header_bytes = 0;
        self.partition_bytes = 0;
        self.bool_state = BoolEncoderState::default();
    }

    /// Append frame tag bytes.
    pub fn write_header(&mut self, bytes: &[u8]) -> Result<()> {
        if self.partition_bytes != 0 {
            return Err(HantroError::Stream(
                "frame tag written after the first partition".to_string(),
            ));
        }
        let start = self.header_bytes;
        self.put(start, bytes)?;
        self.header_bytes += bytes.len();
        Ok(())
    }

    /// Append first partition bytes.
    pub fn write_partition(&mut self, bytes: &[u8]) -> Result<()> {
        let start = self.header_bytes + self.partition_bytes;
        self.put(start, bytes)?;
        self.partition_bytes += bytes.len();
        Ok(())
    }

    fn put(&mut self, start: usize, bytes: &[u8]) -> Result<()> {
        let end = start + bytes.len();
        if end > self.data.len() {
            return Err(HantroError::Stream(format!(
                "write of {} bytes at {} overflows {} byte buffer",
                bytes.len(),
                start,
                self.data.len()
            )));
        }
        self.data[start..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Hand the stream over to the ASIC.
    ///
    /// Fills the stream size, base and header remainder registers and clears
    /// the unused bytes of the last partial 64-bit word.
    pub fn hand_over(&mut self, regs: &mut RegisterBlock) -> Result<()> {
        // Partition buffers are addressed in 64-bit units, 8 word multiple.
        regs.output_strm_size = (self.dct_partition_size / 8) & !0x07;

        let written = self.header_bytes + self.partition_bytes;
        let base = u32::try_from(written)
            .map_err(|_| HantroError::Stream(format!("stream offset {} too large", written)))?;

        regs.first_free_bit = (base & 0x07) * 8;
        regs.output_strm_base = base & !0x07;

        if regs.first_free_bit == 0 {
            regs.strm_start_msb = 0;
            regs.strm_start_lsb = 0;
            return Ok(());
        }

        let aligned = regs.output_strm_base as usize;
        if aligned + 8 > self.data.len() {
            return Err(HantroError::Stream(format!(
                "header remainder at {} lies past the {} byte buffer",
                aligned,
                self.data.len()
            )));
        }

        let word = &mut self.data[aligned..aligned + 8];
        let used = (regs.first_free_bit / 8) as usize;
        // Byte 7 is never part of the remainder, at most 7 bytes are pending.
        word[used..7].fill(0);

        regs.strm_start_msb = BigEndian::read_u32(&word[0..4]);
        regs.strm_start_lsb = if regs.first_free_bit > 32 {
            BigEndian::read_u24(&word[4..7]) << 8
        } else {
            0
        };

        Ok(())
    }
}
