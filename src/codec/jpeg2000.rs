//! JPEG 2000 codec adapter.
//!
//! Wraps the `jpeg2k` crate (OpenJPEG bindings). Both JP2 containers and raw
//! codestreams are accepted. Component precision decides whether samples are
//! returned as 8-bit or little-endian 16-bit; OpenJPEG does not expose a
//! signedness flag through this path, so `pixel_representation` is left
//! unreported and validation falls back to the declared value.

use async_trait::async_trait;
use jpeg2k::Image as J2kImage;

use crate::error::CodecError;

use super::{DecodedFrame, FrameCodec, FrameInfo};

const MEDIA: &str = "JPEG 2000";

/// JPEG 2000 decoder adapter.
#[derive(Debug, Default)]
pub struct Jpeg2000Codec {}

impl Jpeg2000Codec {
    /// Create the decoder instance.
    pub fn load() -> Result<Self, CodecError> {
        Ok(Self {})
    }
}

#[async_trait]
impl FrameCodec for Jpeg2000Codec {
    async fn decode(&self, bytes: &[u8]) -> Result<DecodedFrame, CodecError> {
        let img = J2kImage::from_bytes(bytes).map_err(|e| CodecError::Decode {
            media: MEDIA,
            message: e.to_string(),
        })?;

        let width = img.width();
        let height = img.height();
        let num_components = img.num_components();

        let components = img.components();
        let precision = components.first().map(|c| c.precision()).unwrap_or(8);

        let pixels = img.get_pixels(None).map_err(|e| CodecError::Decode {
            media: MEDIA,
            message: format!("pixel extraction: {e}"),
        })?;

        let (buffer, bits): (Vec<u8>, u16) = if precision <= 8 {
            (pixels.data.iter().map(|&v| v as u8).collect(), 8)
        } else {
            (
                pixels
                    .data
                    .iter()
                    .flat_map(|&v| (v as u16).to_le_bytes())
                    .collect(),
                16,
            )
        };

        let info = FrameInfo {
            bits_per_sample: Some(bits),
            columns: Some(width),
            rows: Some(height),
            samples_per_pixel: Some(num_components as u32),
            pixel_representation: None,
        };

        Ok(DecodedFrame {
            pixels: buffer.into(),
            info,
        })
    }
}
