//! Media-type sniffing for compressed frame buffers.
//!
//! Frames extracted from encapsulated DICOM pixel data carry no per-frame
//! content type, so the encoding has to be recovered from the bytes
//! themselves. Detection is based on magic bytes plus two non-standard rules
//! observed in the wild:
//!
//! - **JPEG-LS vs baseline JPEG**: both start with the SOI marker `FF D8 FF`,
//!   so the marker at byte offset 3 disambiguates (`F7` = SOF55, `E8` = APP8
//!   as emitted by JPEG-LS encoders).
//! - **Trailer fallback for JPEG 2000**: some encoders emit raw codestreams
//!   with no recognizable header, optionally padded with a single trailing
//!   zero byte after the EOC marker `FF D9`. Buffers ending in `FF D9 00` are
//!   classified as JPEG 2000 with the pad byte stripped.
//!
//! Classification is pure and never fails; anything unrecognized is treated
//! as uncompressed octet-stream data and deferred to the passthrough path.

use serde::{Deserialize, Serialize};

// =============================================================================
// MediaType
// =============================================================================

/// Detected encoding of a frame's compressed bytes.
///
/// This is a closed set: adapter selection matches it exhaustively, so an
/// unhandled encoding cannot silently fall through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    /// Baseline JPEG (ISO/IEC 10918-1)
    Jpeg,

    /// JPEG-LS (ISO/IEC 14495-1)
    JpegLs,

    /// JPEG 2000 codestream or JP2 container (ISO/IEC 15444)
    Jpeg2000,

    /// Uncompressed pixel data (or unrecognized; trusted as raw bytes)
    OctetStream,
}

impl MediaType {
    /// Get a human-readable name for the media type.
    pub const fn name(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "baseline JPEG",
            MediaType::JpegLs => "JPEG-LS",
            MediaType::Jpeg2000 => "JPEG 2000",
            MediaType::OctetStream => "octet-stream",
        }
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Result of sniffing a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The detected media type.
    pub media_type: MediaType,

    /// Number of leading bytes that form the actual payload.
    ///
    /// Equal to the buffer length except for the trailing-pad-byte case,
    /// where it is one less.
    pub payload_len: usize,
}

// =============================================================================
// Magic numbers
// =============================================================================

/// JPEG-family Start of Image marker prefix.
const JPEG_SOI: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// JP2 container signature box (first 8 bytes).
const JP2_SIGNATURE: [u8; 8] = [0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20];

/// Raw JPEG 2000 codestream Start of Codestream + SIZ marker.
const J2K_SOC: [u8; 4] = [0xFF, 0x4F, 0xFF, 0x51];

/// SOF55 marker low byte: JPEG-LS start of frame.
const JPEG_LS_SOF55: u8 = 0xF7;

/// APP8 marker low byte, used by JPEG-LS (SPIFF) streams.
const JPEG_LS_APP8: u8 = 0xE8;

/// End of Image / End of Codestream marker.
const EOI: [u8; 2] = [0xFF, 0xD9];

// =============================================================================
// Classification logic
// =============================================================================

/// Classify a compressed frame buffer by its magic bytes.
///
/// # Detection order
///
/// 1. JPEG-family SOI prefix, with byte offset 3 disambiguating JPEG-LS
///    from baseline JPEG.
/// 2. JP2 signature box or raw codestream SOC marker.
/// 3. Trailer inspection: `FF D9 00` (JPEG 2000, one pad byte stripped),
///    then `FF D9` (JPEG 2000).
/// 4. Everything else is octet-stream.
pub fn classify(bytes: &[u8]) -> Classification {
    let full = Classification {
        media_type: MediaType::OctetStream,
        payload_len: bytes.len(),
    };

    if bytes.len() >= 4 && bytes[..3] == JPEG_SOI {
        let media_type = if bytes[3] == JPEG_LS_SOF55 || bytes[3] == JPEG_LS_APP8 {
            MediaType::JpegLs
        } else {
            MediaType::Jpeg
        };
        return Classification {
            media_type,
            payload_len: bytes.len(),
        };
    }

    if bytes.starts_with(&JP2_SIGNATURE) || bytes.starts_with(&J2K_SOC) {
        return Classification {
            media_type: MediaType::Jpeg2000,
            payload_len: bytes.len(),
        };
    }

    // No leading signature matched; fall back to trailer inspection.
    if bytes.len() >= 3 && bytes[bytes.len() - 3..] == [EOI[0], EOI[1], 0x00] {
        return Classification {
            media_type: MediaType::Jpeg2000,
            payload_len: bytes.len() - 1,
        };
    }
    if bytes.len() >= 2 && bytes[bytes.len() - 2..] == EOI {
        return Classification {
            media_type: MediaType::Jpeg2000,
            payload_len: bytes.len(),
        };
    }

    full
}

// =============================================================================
// Tests
// =============================================================================
