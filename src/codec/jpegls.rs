//! JPEG-LS codec adapter.
//!
//! Backed by the CharLS native library through the `charls` crate, gated
//! behind the `jpegls` cargo feature because it needs a C++ toolchain at
//! build time. Without the feature the adapter still exists, but its
//! initialization fails with a descriptive error that propagates to every
//! caller awaiting it — the same path a genuine native load failure takes.

use async_trait::async_trait;

use crate::error::CodecError;

use super::{DecodedFrame, FrameCodec};

const MEDIA: &str = "JPEG-LS";

/// JPEG-LS decoder adapter.
#[derive(Debug, Default)]
pub struct JpegLsCodec {}

#[cfg(feature = "jpegls")]
impl JpegLsCodec {
    /// Create the decoder instance.
    pub fn load() -> Result<Self, CodecError> {
        Ok(Self {})
    }
}

#[cfg(feature = "jpegls")]
#[async_trait]
impl FrameCodec for JpegLsCodec {
    async fn decode(&self, bytes: &[u8]) -> Result<DecodedFrame, CodecError> {
        use super::FrameInfo;

        let mut decoder = charls::CharLS::default();
        let pixels = decoder.decode(bytes).map_err(|e| CodecError::Decode {
            media: MEDIA,
            message: format!("{e:?}"),
        })?;

        // CharLS does not surface frame geometry through this call path;
        // validation falls back on the declared metadata plus the
        // expected-length check.
        Ok(DecodedFrame {
            pixels: pixels.into(),
            info: FrameInfo::default(),
        })
    }
}

#[cfg(not(feature = "jpegls"))]
impl JpegLsCodec {
    /// Fail initialization: the CharLS backend is not compiled in.
    pub fn load() -> Result<Self, CodecError> {
        Err(CodecError::Init {
            media: MEDIA,
            message: "CharLS backend not compiled in; enable the `jpegls` feature".to_string(),
        })
    }
}

#[cfg(not(feature = "jpegls"))]
#[async_trait]
impl FrameCodec for JpegLsCodec {
    async fn decode(&self, _bytes: &[u8]) -> Result<DecodedFrame, CodecError> {
        // Unreachable in practice: `load` never hands out an instance.
        Err(CodecError::Decode {
            media: MEDIA,
            message: "CharLS backend not compiled in".to_string(),
        })
    }
}
