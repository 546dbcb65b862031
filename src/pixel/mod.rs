//! Pixel reinterpretation: typed views over raw frame bytes.
//!
//! Decoded frames travel through the pipeline as flat little-endian byte
//! buffers. This module maps a buffer to the numeric type its metadata
//! declares (bit depth + signedness). Multi-byte samples are read explicitly
//! little-endian, so behavior does not depend on host endianness or on how
//! the buffer happens to be aligned.

use serde::{Deserialize, Serialize};

use crate::error::PixelError;

// =============================================================================
// TypedPixels
// =============================================================================

/// A frame buffer reinterpreted at its declared bit depth.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedPixels {
    /// 1-bit packed data, unpacked LSB-first to one byte (0 or 1) per pixel.
    Bits(Vec<u8>),

    /// Unsigned 8-bit samples.
    U8(Vec<u8>),

    /// Signed 8-bit samples.
    I8(Vec<i8>),

    /// Unsigned 16-bit samples.
    U16(Vec<u16>),

    /// Signed 16-bit samples.
    I16(Vec<i16>),

    /// 32-bit floating point samples.
    F32(Vec<f32>),

    /// 64-bit floating point samples.
    F64(Vec<f64>),
}

impl TypedPixels {
    /// Number of samples in the buffer.
    pub fn len(&self) -> usize {
        match self {
            TypedPixels::Bits(v) => v.len(),
            TypedPixels::U8(v) => v.len(),
            TypedPixels::I8(v) => v.len(),
            TypedPixels::U16(v) => v.len(),
            TypedPixels::I16(v) => v.len(),
            TypedPixels::F32(v) => v.len(),
            TypedPixels::F64(v) => v.len(),
        }
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Reinterpretation
// =============================================================================

/// Reinterpret raw frame bytes at the declared bit depth and signedness.
///
/// Supported depths are 1, 8, 16, 32 and 64 bits; 32- and 64-bit data are
/// floating point regardless of the signedness flag. Any other depth fails
/// with [`PixelError::UnsupportedBitDepth`], and a buffer that does not
/// divide into whole samples fails with [`PixelError::TruncatedBuffer`]
/// rather than being silently truncated.
pub fn reinterpret(bytes: &[u8], bits_allocated: u16, signed: bool) -> Result<TypedPixels, PixelError> {
    match (bits_allocated, signed) {
        (1, _) => Ok(TypedPixels::Bits(unpack_bits(bytes))),
        (8, false) => Ok(TypedPixels::U8(bytes.to_vec())),
        (8, true) => Ok(TypedPixels::I8(bytes.iter().map(|&b| b as i8).collect())),
        (16, false) => Ok(TypedPixels::U16(read_elements(bytes, u16::from_le_bytes)?)),
        (16, true) => Ok(TypedPixels::I16(read_elements(bytes, i16::from_le_bytes)?)),
        (32, _) => Ok(TypedPixels::F32(read_elements(bytes, f32::from_le_bytes)?)),
        (64, _) => Ok(TypedPixels::F64(read_elements(bytes, f64::from_le_bytes)?)),
        (bits, _) => Err(PixelError::UnsupportedBitDepth { bits }),
    }
}

/// Read little-endian elements of size `N` out of a byte buffer.
fn read_elements<const N: usize, T>(
    bytes: &[u8],
    from_le: fn([u8; N]) -> T,
) -> Result<Vec<T>, PixelError> {
    if bytes.len() % N != 0 {
        return Err(PixelError::TruncatedBuffer {
            element_size: N,
            actual: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(N)
        .map(|chunk| {
            let mut array = [0u8; N];
            array.copy_from_slice(chunk);
            from_le(array)
        })
        .collect())
}

/// Unpack 1-bit data LSB-first (DICOM bit order) into one byte per pixel.
fn unpack_bits(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit in 0..8 {
            out.push((byte >> bit) & 1);
        }
    }
    out
}

// =============================================================================
// WindowLevel
// =============================================================================

/// A window/level (VOI) setting as a named-field pair.
///
/// Center and width are easy to transpose when passed positionally; keeping
/// them in one struct makes that mistake unrepresentable at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowLevel {
    /// Window center (level).
    pub center: f32,

    /// Window width. Must be at least 1.
    pub width: f32,
}

impl WindowLevel {
    /// Map one stored value to display range [0, 255] using the DICOM
    /// linear VOI function.
    pub fn apply(&self, value: f32) -> u8 {
        let width = self.width.max(1.0);
        let normalized = (value - (self.center - 0.5)) / (width - 1.0).max(1.0) + 0.5;
        (normalized.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

/// Window a grayscale frame to 8-bit display values.
///
/// Intended for single-sample frames; multi-sample buffers are windowed
/// sample-wise, which is rarely what a caller wants.
pub fn windowed_to_u8(pixels: &TypedPixels, window: WindowLevel) -> Vec<u8> {
    match pixels {
        TypedPixels::Bits(v) => v.iter().map(|&p| window.apply(p as f32)).collect(),
        TypedPixels::U8(v) => v.iter().map(|&p| window.apply(p as f32)).collect(),
        TypedPixels::I8(v) => v.iter().map(|&p| window.apply(p as f32)).collect(),
        TypedPixels::U16(v) => v.iter().map(|&p| window.apply(p as f32)).collect(),
        TypedPixels::I16(v) => v.iter().map(|&p| window.apply(p as f32)).collect(),
        TypedPixels::F32(v) => v.iter().map(|&p| window.apply(p)).collect(),
        TypedPixels::F64(v) => v.iter().map(|&p| window.apply(p as f32)).collect(),
    }
}

// =============================================================================
// Tests
// =============================================================================
