//! ICC color correction keyed by image identity.
//!
//! Whole-slide images can each carry their own ICC profile, so transforms are
//! cached per SOP Instance UID rather than per worker. Each worker owns its
//! own [`ColorTransformer`]; transformer state is never shared across workers
//! and never evicted (the working set is bounded by the images currently
//! open in the viewer).
//!
//! Transforms are built with Little CMS using a `ThreadContext`, which makes
//! them `Send` so a worker task may migrate between runtime threads. Output
//! is sRGB at perceptual intent, matching what the viewer's canvas expects.

use std::collections::HashMap;

use bytes::Bytes;
use lcms2::{AllowCache, Intent, PixelFormat, Profile, ThreadContext, Transform};
use serde::{Deserialize, Serialize};

use crate::error::TransformError;

// =============================================================================
// PlanarConfiguration
// =============================================================================

/// Sample layout of a color frame (DICOM Planar Configuration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlanarConfiguration {
    /// Color-by-pixel: R1 G1 B1 R2 G2 B2 … (value 0).
    Interleaved,

    /// Color-by-plane: R1 R2 … G1 G2 … B1 B2 … (value 1).
    Planar,
}

impl TryFrom<u8> for PlanarConfiguration {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Interleaved),
            1 => Ok(Self::Planar),
            other => Err(format!("invalid Planar Configuration value {other}")),
        }
    }
}

impl From<PlanarConfiguration> for u8 {
    fn from(v: PlanarConfiguration) -> u8 {
        match v {
            PlanarConfiguration::Interleaved => 0,
            PlanarConfiguration::Planar => 1,
        }
    }
}

// =============================================================================
// ProfileDescriptor
// =============================================================================

/// ICC profile metadata for one image, as supplied by the DICOM metadata
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProfileDescriptor {
    /// Image identity the profile belongs to.
    #[serde(rename = "SOPInstanceUID")]
    pub sop_instance_uid: String,

    /// Frame width in pixels.
    pub columns: u32,

    /// Frame height in pixels.
    pub rows: u32,

    /// Bits allocated per sample.
    pub bits_allocated: u16,

    /// Samples per pixel.
    pub samples_per_pixel: u32,

    /// Sample layout.
    pub planar_configuration: PlanarConfiguration,

    /// Raw ICC profile bytes.
    #[serde(rename = "iccProfile")]
    pub icc_profile: Vec<u8>,
}

// =============================================================================
// PixelTransform
// =============================================================================

/// One compiled color transform for a specific image.
struct PixelTransform {
    /// lcms2 transform over raw bytes; the pixel format describes the actual
    /// sample layout, the `u8` element type just matches the buffer.
    inner: Transform<u8, u8, ThreadContext, AllowCache>,

    /// Bytes per whole pixel, for buffer-shape validation.
    pixel_size: usize,
}

impl PixelTransform {
    fn build(descriptor: &ProfileDescriptor) -> Result<Self, TransformError> {
        let (format, pixel_size) = pixel_format_for(descriptor)?;

        let context = ThreadContext::new();
        let input =
            Profile::new_icc_context(&context, &descriptor.icc_profile).map_err(|e| {
                TransformError::Profile {
                    identity: descriptor.sop_instance_uid.clone(),
                    message: e.to_string(),
                }
            })?;
        let output = Profile::new_srgb_context(&context);

        let inner = Transform::new_context(
            context,
            &input,
            format,
            &output,
            format,
            Intent::Perceptual,
        )
        .map_err(|e| TransformError::Profile {
            identity: descriptor.sop_instance_uid.clone(),
            message: e.to_string(),
        })?;

        Ok(Self { inner, pixel_size })
    }

    fn apply(&mut self, identity: &str, pixels: Bytes) -> Result<Bytes, TransformError> {
        if pixels.len() % self.pixel_size != 0 {
            return Err(TransformError::BufferShape {
                identity: identity.to_string(),
                pixel_size: self.pixel_size,
                actual: pixels.len(),
            });
        }

        let mut buffer = pixels.to_vec();
        self.inner.transform_in_place(&mut buffer);
        Ok(Bytes::from(buffer))
    }
}

/// Map a profile's declared layout to an lcms2 pixel format.
///
/// The viewer's color path only corrects color frames; grayscale and exotic
/// layouts are a setup error rather than a silent skip.
fn pixel_format_for(
    descriptor: &ProfileDescriptor,
) -> Result<(PixelFormat, usize), TransformError> {
    match (
        descriptor.samples_per_pixel,
        descriptor.bits_allocated,
        descriptor.planar_configuration,
    ) {
        (3, 8, PlanarConfiguration::Interleaved) => Ok((PixelFormat::RGB_8, 3)),
        (3, 8, PlanarConfiguration::Planar) => Ok((PixelFormat::RGB_8_PLANAR, 3)),
        (3, 16, PlanarConfiguration::Interleaved) => Ok((PixelFormat::RGB_16, 6)),
        (3, 16, PlanarConfiguration::Planar) => Ok((PixelFormat::RGB_16_PLANAR, 6)),
        (samples, bits, _) => Err(TransformError::UnsupportedLayout {
            identity: descriptor.sop_instance_uid.clone(),
            samples,
            bits,
        }),
    }
}

// =============================================================================
// ColorTransformer
// =============================================================================

/// Per-worker cache of per-image color transforms.
///
/// Transforms are built lazily from the descriptors accompanying each
/// request: an identity's transform is compiled at most once per worker and
/// reused for every later frame of that image. A malformed profile fails the
/// request that carried it (and is retried, and fails again, on any later
/// request carrying it) instead of being silently dropped.
#[derive(Default)]
pub struct ColorTransformer {
    transforms: HashMap<String, PixelTransform>,
}

impl ColorTransformer {
    /// Create an empty transformer; nothing is compiled until first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of image identities with a compiled transform.
    pub fn transform_count(&self) -> usize {
        self.transforms.len()
    }

    /// Color-correct one frame.
    ///
    /// Fast paths, both zero cost: an empty profile set returns the input
    /// unchanged, as does an identity with no associated profile.
    pub fn transform(
        &mut self,
        profiles: &[ProfileDescriptor],
        identity: &str,
        pixels: Bytes,
    ) -> Result<Bytes, TransformError> {
        if profiles.is_empty() {
            return Ok(pixels);
        }

        for descriptor in profiles {
            if !self.transforms.contains_key(&descriptor.sop_instance_uid) {
                let transform = PixelTransform::build(descriptor)?;
                self.transforms
                    .insert(descriptor.sop_instance_uid.clone(), transform);
            }
        }

        match self.transforms.get_mut(identity) {
            Some(transform) => transform.apply(identity, pixels),
            None => Ok(pixels),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
