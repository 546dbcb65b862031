//! Baseline JPEG codec adapter.
//!
//! Wraps the `image` crate's JPEG decoder. Baseline JPEG carries unsigned
//! 8-bit samples, so the reported frame info is always fully populated.

use std::io::Cursor;

use async_trait::async_trait;
use image::ImageReader;

use crate::error::CodecError;

use super::{DecodedFrame, FrameCodec, FrameInfo, PixelRepresentation};

const MEDIA: &str = "baseline JPEG";

/// Baseline JPEG decoder adapter.
#[derive(Debug, Default)]
pub struct JpegCodec {
    // Currently stateless; the struct is the unit the per-worker cache
    // memoizes, and allows future decoder configuration.
}

impl JpegCodec {
    /// Create the decoder instance.
    pub fn load() -> Result<Self, CodecError> {
        Ok(Self {})
    }
}

#[async_trait]
impl FrameCodec for JpegCodec {
    async fn decode(&self, bytes: &[u8]) -> Result<DecodedFrame, CodecError> {
        let reader = ImageReader::with_format(Cursor::new(bytes), image::ImageFormat::Jpeg);
        let img = reader.decode().map_err(|e| CodecError::Decode {
            media: MEDIA,
            message: e.to_string(),
        })?;

        let color = img.color();
        let channels = u32::from(color.channel_count());
        let bits = color.bits_per_pixel() / u16::from(color.channel_count());

        let info = FrameInfo {
            bits_per_sample: Some(bits),
            columns: Some(img.width()),
            rows: Some(img.height()),
            samples_per_pixel: Some(channels),
            pixel_representation: Some(PixelRepresentation::Unsigned),
        };

        Ok(DecodedFrame {
            pixels: img.into_bytes().into(),
            info,
        })
    }
}
