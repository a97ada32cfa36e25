//! Error types for VP8 hardware frame setup.

use thiserror::Error;

/// Hantro VP8 encoder setup error.
#[derive(Debug, Error)]
pub enum HantroError {
    /// Frame dimensions the encoder cannot handle.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Quantizer index outside 0..=127.
    #[error("Quantizer index {0} out of range (0-127)")]
    InvalidQp(i32),

    /// Region of interest rectangle that does not fit the frame.
    #[error("Invalid ROI {index}: {reason}")]
    InvalidRoi { index: usize, reason: String },

    /// Segment id that does not fit in a map nibble slot.
    #[error("Segment id {0} out of range (0-3)")]
    InvalidSegmentId(u8),

    /// Externally supplied segment map of the wrong size.
    #[error("Segment map holds {actual} macroblocks, frame has {expected}")]
    SegmentMapSize { expected: usize, actual: usize },

    /// Invalid encoder configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Output stream bookkeeping does not fit the buffer.
    #[error("Stream buffer error: {0}")]
    Stream(String),

    /// Failure reported by the ASIC backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for Hantro frame setup.
pub type Result<T> = std::result::Result<T, HantroError>;
