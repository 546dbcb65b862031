//! Decode task orchestration.
//!
//! One task carries one frame from compressed bytes to display-ready pixels:
//! classify the payload, decode it with the matching codec adapter,
//! cross-validate decoder-reported geometry against the declared metadata,
//! check the buffer length, then color-correct. Each stage either refines the
//! frame or fails the task; nothing is silently patched up.

use bytes::Bytes;
use tracing::debug;

use crate::codec::{DecodedFrame, FrameInfo, FrameCodec};
use crate::color::ProfileDescriptor;
use crate::error::DecodeError;
use crate::format::{classify, MediaType};
use crate::pixel::{reinterpret, TypedPixels};
use crate::pool::WorkerContext;

// =============================================================================
// DecodeRequest
// =============================================================================

/// One frame decode request.
#[derive(Debug, Clone)]
pub struct DecodeRequest {
    /// Compressed (or raw) frame bytes.
    pub frame_data: Bytes,

    /// Geometry declared by the image metadata. Fields the metadata does not
    /// carry stay `None` and are excluded from cross-validation.
    pub declared: FrameInfo,

    /// Identity of the image the frame belongs to, used to key the color
    /// transform.
    pub sop_instance_uid: String,

    /// ICC profiles known to the caller; an empty set skips color correction.
    pub icc_profiles: Vec<ProfileDescriptor>,
}

impl DecodeRequest {
    /// Build a request with no declared geometry and no color correction.
    pub fn new(frame_data: Bytes, sop_instance_uid: impl Into<String>) -> Self {
        Self {
            frame_data,
            declared: FrameInfo::default(),
            sop_instance_uid: sop_instance_uid.into(),
            icc_profiles: Vec::new(),
        }
    }

    /// Attach declared frame geometry.
    pub fn with_declared(mut self, declared: FrameInfo) -> Self {
        self.declared = declared;
        self
    }

    /// Attach the caller's ICC profile set.
    pub fn with_profiles(mut self, profiles: Vec<ProfileDescriptor>) -> Self {
        self.icc_profiles = profiles;
        self
    }
}

/// Work item accepted by the pool. The set of task kinds is closed; new
/// pipelines get a new variant rather than an out-of-band string tag.
#[derive(Debug, Clone)]
pub enum TaskPayload {
    /// Full decode + color-correction pipeline.
    DecodeAndTransform(DecodeRequest),

    /// Panics on execution with the given message. Exists to exercise the
    /// pool's fault containment.
    #[cfg(test)]
    Fault(String),
}

// =============================================================================
// DecodeOutput
// =============================================================================

/// Settled result of a successful decode task.
#[derive(Debug, Clone)]
pub struct DecodeOutput {
    /// Display-ready pixel bytes. `Bytes` keeps the hand-off to the caller
    /// zero-copy; cloning shares the buffer.
    pub frame_data: Bytes,

    /// Fully merged frame geometry (decoder values where reported, declared
    /// values elsewhere).
    pub frame_info: FrameInfo,
}

impl DecodeOutput {
    /// View the pixels at the frame's bit depth.
    ///
    /// Falls back to unsigned 8-bit when the merged geometry carries no bit
    /// depth, which matches how an unclassifiable octet-stream payload with
    /// no declared metadata should be treated.
    pub fn typed_pixels(&self) -> Result<TypedPixels, crate::error::PixelError> {
        let bits = self.frame_info.bits_per_sample.unwrap_or(8);
        let signed = self
            .frame_info
            .pixel_representation
            .map(|r| r.is_signed())
            .unwrap_or(false);
        reinterpret(&self.frame_data, bits, signed)
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Run the full decode pipeline for one frame on the calling worker.
pub async fn decode_and_transform(
    ctx: &mut WorkerContext,
    request: DecodeRequest,
) -> Result<DecodeOutput, DecodeError> {
    let classification = classify(&request.frame_data);
    debug!(
        media_type = classification.media_type.name(),
        payload_len = classification.payload_len,
        identity = %request.sop_instance_uid,
        "classified frame"
    );

    // Trailing pad bytes are not part of the bitstream.
    let payload = request.frame_data.slice(..classification.payload_len);

    let decoded = match classification.media_type {
        MediaType::OctetStream => {
            // Raw data carries no self-describing geometry; the declared
            // metadata is all there is, and validation reduces to the
            // expected-length check. The payload slice shares the caller's
            // buffer, so this path never copies.
            DecodedFrame {
                pixels: payload,
                info: request.declared,
            }
        }
        MediaType::Jpeg => {
            let codec = ctx.codecs.jpeg().await?;
            codec.decode(&payload).await?
        }
        MediaType::JpegLs => {
            let codec = ctx.codecs.jpeg_ls().await?;
            codec.decode(&payload).await?
        }
        MediaType::Jpeg2000 => {
            let codec = ctx.codecs.jpeg2000().await?;
            codec.decode(&payload).await?
        }
    };

    validate_geometry(&request.declared, &decoded.info)?;
    let frame_info = decoded.info.merged_with(&request.declared);
    validate_length(&frame_info, decoded.pixels.len())?;

    let pixels = ctx.transformer.transform(
        &request.icc_profiles,
        &request.sop_instance_uid,
        decoded.pixels,
    )?;

    Ok(DecodeOutput {
        frame_data: pixels,
        frame_info,
    })
}

/// Cross-validate declared metadata against decoder-reported geometry.
///
/// Comparison is per-field and total over presence: a mismatch exists only
/// when both sides carry a value and the values differ. The error names the
/// offending DICOM keyword so the caller can see at a glance which attribute
/// its metadata got wrong.
fn validate_geometry(declared: &FrameInfo, decoded: &FrameInfo) -> Result<(), DecodeError> {
    check_field(
        "BitsAllocated",
        declared.bits_per_sample.map(u32::from),
        decoded.bits_per_sample.map(u32::from),
    )?;
    check_field("Rows", declared.rows, decoded.rows)?;
    check_field("Columns", declared.columns, decoded.columns)?;
    check_field(
        "SamplesPerPixel",
        declared.samples_per_pixel,
        decoded.samples_per_pixel,
    )?;
    check_field(
        "PixelRepresentation",
        declared.pixel_representation.map(|r| r.as_u32()),
        decoded.pixel_representation.map(|r| r.as_u32()),
    )?;
    Ok(())
}

fn check_field(
    field: &'static str,
    declared: Option<u32>,
    decoded: Option<u32>,
) -> Result<(), DecodeError> {
    match (declared, decoded) {
        (Some(declared), Some(decoded)) if declared != decoded => {
            Err(DecodeError::GeometryMismatch {
                field,
                declared,
                decoded,
            })
        }
        _ => Ok(()),
    }
}

/// Check the decoded buffer against the length the merged geometry implies.
///
/// Only enforceable when every contributing field is known and the bit depth
/// is a whole number of bytes; sub-byte frames pack pixels and are checked by
/// the codec itself.
fn validate_length(info: &FrameInfo, actual: usize) -> Result<(), DecodeError> {
    let (Some(bits), Some(rows), Some(columns), Some(samples)) = (
        info.bits_per_sample,
        info.rows,
        info.columns,
        info.samples_per_pixel,
    ) else {
        return Ok(());
    };
    if bits % 8 != 0 {
        return Ok(());
    }

    let expected = (rows as usize)
        .checked_mul(columns as usize)
        .and_then(|n| n.checked_mul(samples as usize))
        .and_then(|n| n.checked_mul(bits as usize / 8))
        .ok_or(DecodeError::FrameTooLarge {
            rows,
            columns,
            samples,
            bits,
        })?;
    if actual != expected {
        return Err(DecodeError::LengthMismatch { expected, actual });
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
