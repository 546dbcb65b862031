//! Codec adapters and per-worker codec caching.
//!
//! Each supported media type gets one adapter exposing the same narrow
//! contract: hand it a compressed buffer, get back raw pixels plus the frame
//! geometry the decoder actually observed. The adapters wrap native decoder
//! crates (`image` for baseline JPEG, `jpeg2k`/OpenJPEG for JPEG 2000, CharLS
//! for JPEG-LS); their bitstream internals are not this crate's concern.
//!
//! # Initialization
//!
//! Decoder instances are created lazily, once per worker, through
//! [`CodecCache`]. The cache memoizes the initialization future, so callers
//! that arrive while initialization is still in flight all await the same
//! attempt instead of racing a second load. A failed initialization
//! propagates to every waiter and leaves the cell empty, so the adapter is
//! never wedged in a half-initialized state.

mod jpeg;
mod jpeg2000;
mod jpegls;

pub use jpeg::JpegCodec;
pub use jpeg2000::Jpeg2000Codec;
pub use jpegls::JpegLsCodec;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::error::CodecError;

// =============================================================================
// PixelRepresentation
// =============================================================================

/// Signedness of stored sample values (DICOM Pixel Representation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelRepresentation {
    /// Unsigned integer samples (Pixel Representation 0).
    Unsigned,

    /// Two's-complement signed samples (Pixel Representation 1).
    Signed,
}

impl PixelRepresentation {
    /// Whether samples are signed.
    pub const fn is_signed(&self) -> bool {
        matches!(self, PixelRepresentation::Signed)
    }

    /// Numeric DICOM value (0 = unsigned, 1 = signed), used in mismatch
    /// reporting.
    pub const fn as_u32(&self) -> u32 {
        match self {
            PixelRepresentation::Unsigned => 0,
            PixelRepresentation::Signed => 1,
        }
    }
}

// =============================================================================
// FrameInfo
// =============================================================================

/// Frame geometry as reported by a decoder or declared by metadata.
///
/// Every field is explicitly optional: a decoder reports what it knows and
/// nothing more, and declared metadata may omit any hint. Cross-validation
/// treats the four presence combinations totally — a mismatch exists only
/// when both sides carry a value and the values differ. Decoder output is
/// used for validation only and is never trusted blindly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    /// Bits allocated per sample.
    pub bits_per_sample: Option<u16>,

    /// Frame width in pixels (DICOM Columns).
    pub columns: Option<u32>,

    /// Frame height in pixels (DICOM Rows).
    pub rows: Option<u32>,

    /// Samples per pixel (1 = grayscale, 3 = color).
    pub samples_per_pixel: Option<u32>,

    /// Signedness of sample values.
    pub pixel_representation: Option<PixelRepresentation>,
}

impl FrameInfo {
    /// Merge decoder-reported values over declared values, preferring the
    /// decoder's where both are present.
    ///
    /// Only meaningful after cross-validation has established that present
    /// fields agree.
    pub fn merged_with(&self, declared: &FrameInfo) -> FrameInfo {
        FrameInfo {
            bits_per_sample: self.bits_per_sample.or(declared.bits_per_sample),
            columns: self.columns.or(declared.columns),
            rows: self.rows.or(declared.rows),
            samples_per_pixel: self.samples_per_pixel.or(declared.samples_per_pixel),
            pixel_representation: self.pixel_representation.or(declared.pixel_representation),
        }
    }
}

// =============================================================================
// FrameCodec
// =============================================================================

/// A decoded frame: raw pixel bytes plus the geometry the decoder achieved.
///
/// Pixels are held as [`Bytes`] so the passthrough path can hand the caller's
/// buffer onward without copying it.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Raw little-endian pixel bytes, sample-interleaved.
    pub pixels: Bytes,

    /// Geometry reported by the decoder.
    pub info: FrameInfo,
}

/// Uniform decode contract over the native decoder backends.
#[async_trait]
pub trait FrameCodec: Send + Sync {
    /// Decode one compressed frame into raw pixels.
    async fn decode(&self, bytes: &[u8]) -> Result<DecodedFrame, CodecError>;
}

// =============================================================================
// CodecCache
// =============================================================================

/// Per-worker cache of lazily-initialized codec adapters.
///
/// One instance per media type, created on first use and reused for the
/// worker's lifetime. The set of media types is closed, so the cache is a
/// fixed struct rather than a map.
#[derive(Default)]
pub struct CodecCache {
    jpeg: OnceCell<Arc<JpegCodec>>,
    jpeg_ls: OnceCell<Arc<JpegLsCodec>>,
    jpeg2000: OnceCell<Arc<Jpeg2000Codec>>,
}

impl CodecCache {
    /// Create an empty cache; no decoder is loaded until first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the baseline JPEG adapter, initializing it on first call.
    pub async fn jpeg(&self) -> Result<Arc<JpegCodec>, CodecError> {
        self.jpeg
            .get_or_try_init(|| async { JpegCodec::load().map(Arc::new) })
            .await
            .map(Arc::clone)
    }

    /// Get the JPEG-LS adapter, initializing it on first call.
    pub async fn jpeg_ls(&self) -> Result<Arc<JpegLsCodec>, CodecError> {
        self.jpeg_ls
            .get_or_try_init(|| async { JpegLsCodec::load().map(Arc::new) })
            .await
            .map(Arc::clone)
    }

    /// Get the JPEG 2000 adapter, initializing it on first call.
    pub async fn jpeg2000(&self) -> Result<Arc<Jpeg2000Codec>, CodecError> {
        self.jpeg2000
            .get_or_try_init(|| async { Jpeg2000Codec::load().map(Arc::new) })
            .await
            .map(Arc::clone)
    }
}

// =============================================================================
// Tests
// =============================================================================
