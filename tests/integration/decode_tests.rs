//! Decode pipeline integration tests.
//!
//! Tests verify:
//! - End-to-end decode of real baseline JPEG frames through the pool
//! - Octet-stream passthrough for uncompressed payloads
//! - Geometry cross-validation (per-field, presence-aware)
//! - Expected-length enforcement
//! - Codec initialization failure propagation

use frame_decoder::config::PoolConfig;
use frame_decoder::error::CodecError;
use frame_decoder::pixel::TypedPixels;
use frame_decoder::pool::WorkerContext;
use frame_decoder::task::decode_and_transform;
use frame_decoder::{DecodeError, DecodePool, DecodeRequest, FrameInfo, TaskPayload};

use bytes::Bytes;

use super::test_utils::{declared, gray_jpeg, raw_frame, rgb_jpeg};

// =============================================================================
// End-to-End Decoding
// =============================================================================

#[tokio::test]
async fn test_gray_jpeg_decodes_through_pool() {
    let pool = DecodePool::new(PoolConfig::with_workers(2));

    let request = DecodeRequest::new(gray_jpeg(16, 16), "1.2.3.4")
        .with_declared(declared(16, 16, 1));
    let handle = pool
        .add_task(TaskPayload::DecodeAndTransform(request), 0)
        .unwrap();

    let output = handle.promise().await.unwrap();
    assert_eq!(output.frame_data.len(), 16 * 16);
    assert_eq!(output.frame_info.rows, Some(16));
    assert_eq!(output.frame_info.columns, Some(16));
    assert_eq!(output.frame_info.samples_per_pixel, Some(1));
    assert!(matches!(
        output.typed_pixels().unwrap(),
        TypedPixels::U8(_)
    ));

    pool.shutdown().await;
}

#[tokio::test]
async fn test_rgb_jpeg_reports_three_samples() {
    let mut ctx = WorkerContext::new(0);

    let request = DecodeRequest::new(rgb_jpeg(8, 8), "1.2.3.4");
    let output = decode_and_transform(&mut ctx, request).await.unwrap();

    assert_eq!(output.frame_info.samples_per_pixel, Some(3));
    assert_eq!(output.frame_data.len(), 8 * 8 * 3);
}

// =============================================================================
// Octet-Stream Passthrough
// =============================================================================

#[tokio::test]
async fn test_uncompressed_frame_passes_through_unchanged() {
    let mut ctx = WorkerContext::new(0);

    let payload = raw_frame(512 * 512);
    let request = DecodeRequest::new(payload.clone(), "1.2.3.4")
        .with_declared(declared(512, 512, 1));
    let output = decode_and_transform(&mut ctx, request).await.unwrap();

    assert_eq!(output.frame_data.len(), 262_144);
    assert_eq!(output.frame_data, payload);
    assert_eq!(output.frame_info.rows, Some(512));

    // Same backing allocation, not a copy.
    assert_eq!(output.frame_data.as_ptr(), payload.as_ptr());
}

#[tokio::test]
async fn test_unrecognized_frame_without_metadata_is_returned_raw() {
    let mut ctx = WorkerContext::new(0);

    let payload = raw_frame(10);
    let request = DecodeRequest::new(payload.clone(), "1.2.3.4");
    let output = decode_and_transform(&mut ctx, request).await.unwrap();

    assert_eq!(output.frame_data, payload);
    assert_eq!(output.frame_info, FrameInfo::default());
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_declared_rows_mismatch_fails_the_task() {
    let mut ctx = WorkerContext::new(0);

    // The encoded frame is 16 rows tall; the metadata claims 512.
    let mut info = declared(512, 16, 1);
    info.pixel_representation = None;
    let request = DecodeRequest::new(gray_jpeg(16, 16), "1.2.3.4").with_declared(info);

    let err = decode_and_transform(&mut ctx, request).await.unwrap_err();
    assert!(matches!(
        err,
        DecodeError::GeometryMismatch { field: "Rows", .. }
    ));
    let message = err.to_string();
    assert!(message.contains("Rows"));
    assert!(message.contains("512"));
    assert!(message.contains("16"));
}

#[tokio::test]
async fn test_uncompressed_length_mismatch_fails_the_task() {
    let mut ctx = WorkerContext::new(0);

    let request = DecodeRequest::new(raw_frame(1000), "1.2.3.4")
        .with_declared(declared(512, 512, 1));

    let err = decode_and_transform(&mut ctx, request).await.unwrap_err();
    assert!(matches!(
        err,
        DecodeError::LengthMismatch {
            expected: 262_144,
            actual: 1000
        }
    ));
}

#[tokio::test]
async fn test_partial_metadata_skips_length_check() {
    let mut ctx = WorkerContext::new(0);

    // Rows unknown: the expected length cannot be computed, so an arbitrary
    // buffer length is accepted.
    let info = FrameInfo {
        bits_per_sample: Some(8),
        columns: Some(512),
        ..FrameInfo::default()
    };
    let request = DecodeRequest::new(raw_frame(1000), "1.2.3.4").with_declared(info);

    assert!(decode_and_transform(&mut ctx, request).await.is_ok());
}

// =============================================================================
// Codec Initialization Failures
// =============================================================================

#[cfg(not(feature = "jpegls"))]
#[tokio::test]
async fn test_jpeg_ls_frame_fails_without_backend() {
    let mut ctx = WorkerContext::new(0);

    // SOI followed by SOF55 classifies as JPEG-LS.
    let payload = Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xF7, 0x00, 0x0B, 0x08]);
    let request = DecodeRequest::new(payload, "1.2.3.4");

    let err = decode_and_transform(&mut ctx, request).await.unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Codec(CodecError::Init { .. })
    ));
}

#[tokio::test]
async fn test_corrupt_jpeg_fails_with_decode_error() {
    let mut ctx = WorkerContext::new(0);

    // Valid SOI prefix, garbage after it.
    let payload = Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0, 0xDE, 0xAD, 0xBE, 0xEF]);
    let request = DecodeRequest::new(payload, "1.2.3.4");

    let err = decode_and_transform(&mut ctx, request).await.unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Codec(CodecError::Decode { .. })
    ));
}
