//! VP8 frame-parameter setup for Hantro H1 hardware encoders.
//!
//! The Hantro H1 VPU encodes VP8 frames in silicon. Software only decides the
//! parameters for each frame and hands them over in a register block. This
//! crate derives those parameters: quantizer constants, loop filter levels
//! and deltas, motion vector penalties and the segment map.
//!
//! ## Features
//!
//! - Quantizer tables for every quantizer index and coefficient class
//! - Automatic or fixed loop filter level, sharpness and deltas
//! - Region of interest segmentation and external segment maps
//! - Quantizer-derived penalties with caller overrides
//! - Output stream hand-over to the ASIC at 64-bit alignment
//!
//! Writing the frame header, uploading probability tables and programming
//! the device go through the [`AsicBackend`] trait.
//!
//! ## Example
//!
//! ```
//! use transcode_hantro::{CaptureBackend, EncoderConfig, OutputStream, Picture, Vp8HwEncoder};
//!
//! let config = EncoderConfig::new(1280, 720).dct_partitions(2);
//! let mut encoder = Vp8HwEncoder::new(config)?;
//! let mut stream = OutputStream::new(256 * 1024, 64 * 1024);
//! let mut backend = CaptureBackend::new(10, 7);
//!
//! encoder.code_frame(40, &Picture::key(), &mut stream, &mut backend)?;
//! encoder.code_frame(42, &Picture::inter(), &mut stream, &mut backend)?;
//!
//! let regs = backend.last_regs.as_ref().unwrap();
//! assert!(regs.enable_cabac);
//! # Ok::<(), transcode_hantro::HantroError>(())
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod config;
pub mod entropy;
pub mod error;
pub mod filter;
pub mod frame;
pub mod quant;
pub mod regs;
pub mod segmentation;
pub mod stream;
pub mod tables;

pub use backend::{AsicBackend, CaptureBackend, HeaderContext};
pub use config::{EncoderConfig, FilterDeltaMode, FilterType, MvFeature, RoiArea};
pub use entropy::EntropyState;
pub use error::{HantroError, Result};
pub use filter::LoopFilterParams;
pub use frame::{set_intra_prediction_penalties, Vp8HwEncoder};
pub use quant::{CoeffClass, QuantEntry, QuantTables};
pub use regs::{FrameCodingType, PenaltyOverrides, RegisterBlock, SegmentQuant};
pub use segmentation::{EndianSwap, SegmentMap, SegmentParams, Segmentation};
pub use stream::{BoolEncoderState, OutputStream};

/// Number of quantizer indices.
pub const QINDEX_RANGE: usize = 128;

/// Number of segments.
pub const SGM_CNT: usize = 4;

/// Number of regions of interest; region `n` uses segment `n + 1`.
pub const ROI_COUNT: usize = 2;

/// Entries in each DMV penalty table.
pub const PENALTY_TABLE_SIZE: usize = 128;

/// Largest frame width or height in pixels.
pub const MAX_DIMENSION: u32 = 4080;

/// Size in bytes of the probability counter buffer.
pub const PROB_COUNT_SIZE: usize = 244 * 2;

/// The picture about to be coded and the references it refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Picture {
    /// Key frame.
    pub key_frame: bool,
    /// Refresh the last frame buffer.
    pub refresh_last: bool,
    /// Refresh the golden frame buffer.
    pub refresh_golden: bool,
    /// Refresh the alternate reference buffer.
    pub refresh_altref: bool,
}

impl Picture {
    /// Key frame refreshing every reference.
    pub fn key() -> Self {
        Self {
            key_frame: true,
            refresh_last: true,
            refresh_golden: true,
            refresh_altref: true,
        }
    }

    /// Inter frame refreshing only the last frame.
    pub fn inter() -> Self {
        Self {
            key_frame: false,
            refresh_last: true,
            refresh_golden: false,
            refresh_altref: false,
        }
    }

    /// Set golden frame refresh.
    pub fn with_golden(mut self, refresh: bool) -> Self {
        self.refresh_golden = refresh;
        self
    }

    /// Set alternate reference refresh.
    pub fn with_altref(mut self, refresh: bool) -> Self {
        self.refresh_altref = refresh;
        self
    }

    /// Set last frame refresh.
    pub fn with_last(mut self, refresh: bool) -> Self {
        self.refresh_last = refresh;
        self
    }

    /// No reference is refreshed, nothing depends on this frame.
    pub fn is_droppable(&self) -> bool {
        !self.key_frame && !self.refresh_last && !self.refresh_golden && !self.refresh_altref
    }
}

impl Default for Picture {
    fn default() -> Self {
        Self::key()
    }
}
