//! ICC color correction integration tests.
//!
//! Tests verify:
//! - Color correction applies to frames whose identity has a profile
//! - Frames without a matching profile pass through untouched
//! - A malformed profile fails the task that carried it
//! - Transforms stay isolated per image identity

use bytes::Bytes;

use frame_decoder::error::TransformError;
use frame_decoder::pool::WorkerContext;
use frame_decoder::task::decode_and_transform;
use frame_decoder::{DecodeError, DecodeRequest};

use super::test_utils::{declared, linear_rgb_profile, raw_frame, rgb_jpeg, rgb_profile};

// =============================================================================
// Transform Application
// =============================================================================

#[tokio::test]
async fn test_color_corrected_frame_keeps_its_shape() {
    let mut ctx = WorkerContext::new(0);

    let uid = "1.2.840.113654.2.3";
    let request = DecodeRequest::new(rgb_jpeg(8, 8), uid)
        .with_profiles(vec![rgb_profile(uid, 8, 8)]);

    let output = decode_and_transform(&mut ctx, request).await.unwrap();
    assert_eq!(output.frame_data.len(), 8 * 8 * 3);
    assert_eq!(ctx.transformer.transform_count(), 1);
}

#[tokio::test]
async fn test_identity_without_profile_passes_through() {
    let mut ctx = WorkerContext::new(0);

    let payload = raw_frame(4 * 4 * 3);
    let request = DecodeRequest::new(payload.clone(), "9.9.9")
        .with_declared(declared(4, 4, 3))
        .with_profiles(vec![rgb_profile("1.2.3", 4, 4)]);

    let output = decode_and_transform(&mut ctx, request).await.unwrap();
    assert_eq!(output.frame_data, payload);
}

// =============================================================================
// Failure Paths
// =============================================================================

#[tokio::test]
async fn test_malformed_profile_fails_the_task() {
    let mut ctx = WorkerContext::new(0);

    let uid = "1.2.3";
    let mut profile = rgb_profile(uid, 4, 4);
    profile.icc_profile = b"not an ICC profile".to_vec();

    let request = DecodeRequest::new(raw_frame(4 * 4 * 3), uid)
        .with_declared(declared(4, 4, 3))
        .with_profiles(vec![profile]);

    let err = decode_and_transform(&mut ctx, request).await.unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Transform(TransformError::Profile { .. })
    ));
}

// =============================================================================
// Identity Isolation
// =============================================================================

#[tokio::test]
async fn test_each_identity_gets_its_own_profile() {
    let mut ctx = WorkerContext::new(0);

    // Two images with genuinely different profiles: sRGB (near-identity when
    // converted to sRGB) and linear gamma (strong mid-tone shift). Feeding
    // both identities the same pixels must produce different corrections, so
    // a keying bug that served image A's transform for image B would fail
    // these assertions.
    let profiles = vec![
        rgb_profile("1.1.1", 4, 4),
        linear_rgb_profile("2.2.2", 4, 4),
    ];
    let pixels: Vec<u8> = [200u8, 64, 32].repeat(16);
    let payload = Bytes::from(pixels);

    let srgb_request = DecodeRequest::new(payload.clone(), "1.1.1")
        .with_declared(declared(4, 4, 3))
        .with_profiles(profiles.clone());
    let out_srgb = decode_and_transform(&mut ctx, srgb_request).await.unwrap();

    let linear_request = DecodeRequest::new(payload.clone(), "2.2.2")
        .with_declared(declared(4, 4, 3))
        .with_profiles(profiles);
    let out_linear = decode_and_transform(&mut ctx, linear_request)
        .await
        .unwrap();

    assert_eq!(ctx.transformer.transform_count(), 2);
    assert_eq!(out_srgb.frame_data.len(), payload.len());
    assert_eq!(out_linear.frame_data.len(), payload.len());
    // Linear-to-sRGB visibly rewrites the samples; sRGB-to-sRGB does not.
    assert_ne!(out_linear.frame_data, payload);
    assert_ne!(out_srgb.frame_data, out_linear.frame_data);
}

#[tokio::test]
async fn test_transforms_stay_isolated_per_identity() {
    let mut ctx = WorkerContext::new(0);

    // Two images, only the first carries a profile. The second's frames must
    // come back byte-identical even after the first's transform is compiled.
    let profiles = vec![rgb_profile("1.1.1", 4, 4)];

    let first = DecodeRequest::new(raw_frame(4 * 4 * 3), "1.1.1")
        .with_declared(declared(4, 4, 3))
        .with_profiles(profiles.clone());
    decode_and_transform(&mut ctx, first).await.unwrap();

    let payload = Bytes::from(vec![42u8; 4 * 4 * 3]);
    let second = DecodeRequest::new(payload.clone(), "2.2.2")
        .with_declared(declared(4, 4, 3))
        .with_profiles(profiles);
    let output = decode_and_transform(&mut ctx, second).await.unwrap();

    assert_eq!(output.frame_data, payload);
    assert_eq!(ctx.transformer.transform_count(), 1);
}
