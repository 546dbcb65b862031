//! Pool dispatch and settlement integration tests.
//!
//! Tests verify:
//! - Every accepted task settles exactly once
//! - Teardown settles still-queued tasks instead of abandoning them
//! - Submissions after teardown are rejected synchronously
//! - Queue and occupancy statistics

use frame_decoder::config::PoolConfig;
use frame_decoder::error::PoolError;
use frame_decoder::{DecodeError, DecodePool, DecodeRequest, FrameInfo, TaskPayload};

use super::test_utils::{declared, raw_frame};

fn raw_task(rows: u32, columns: u32) -> TaskPayload {
    let request = DecodeRequest::new(raw_frame((rows * columns) as usize), "1.2.3.4")
        .with_declared(declared(rows, columns, 1));
    TaskPayload::DecodeAndTransform(request)
}

// =============================================================================
// Settlement
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_task_settles_exactly_once() {
    let pool = DecodePool::new(PoolConfig::with_workers(4));

    // Mixed priorities, more tasks than workers.
    let handles: Vec<_> = (0..32)
        .map(|i| pool.add_task(raw_task(8, 8), (i % 5) as i32).unwrap())
        .collect();

    for handle in handles {
        let output = handle.promise().await.unwrap();
        assert_eq!(output.frame_data.len(), 64);
    }

    pool.shutdown().await;
    let stats = pool.stats();
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.in_flight, 0);
}

#[tokio::test]
async fn test_dropped_handle_does_not_stall_the_pool() {
    let pool = DecodePool::new(PoolConfig::with_workers(1));

    // Forfeit the first result, then verify the worker still serves the next.
    drop(pool.add_task(raw_task(4, 4), 0).unwrap());
    let handle = pool.add_task(raw_task(4, 4), 0).unwrap();

    assert!(handle.promise().await.is_ok());
    pool.shutdown().await;
}

// =============================================================================
// Teardown
// =============================================================================

#[tokio::test]
async fn test_shutdown_settles_pending_tasks_with_closed() {
    let pool = DecodePool::new(PoolConfig::with_workers(2));

    // On a current-thread runtime the workers have not been polled yet, so
    // every submission is still queued when teardown starts.
    let handles: Vec<_> = (0..8)
        .map(|_| pool.add_task(raw_task(4, 4), 0).unwrap())
        .collect();
    pool.shutdown().await;

    for handle in handles {
        let err = handle.promise().await.unwrap_err();
        assert!(matches!(err, DecodeError::Pool(PoolError::Closed)));
    }
}

#[tokio::test]
async fn test_submission_after_shutdown_is_rejected_synchronously() {
    let pool = DecodePool::new(PoolConfig::with_workers(2));
    pool.shutdown().await;

    let result = pool.add_task(raw_task(4, 4), 0);
    assert!(matches!(result, Err(PoolError::Closed)));
}

// =============================================================================
// Statistics
// =============================================================================

#[tokio::test]
async fn test_stats_reflect_queue_depth_before_dispatch() {
    let pool = DecodePool::new(PoolConfig::with_workers(2));

    // No await between submissions, so on a current-thread runtime nothing
    // has been dispatched yet.
    let handles: Vec<_> = (0..3)
        .map(|_| pool.add_task(raw_task(4, 4), 0).unwrap())
        .collect();

    let stats = pool.stats();
    assert_eq!(stats.pending, 3);
    assert_eq!(stats.in_flight, 0);
    assert_eq!(stats.idle, 2);

    for handle in handles {
        handle.promise().await.unwrap();
    }
    pool.shutdown().await;

    let stats = pool.stats();
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.idle, 0);
}

// =============================================================================
// Hostile Metadata
// =============================================================================

#[tokio::test]
async fn test_overflowing_geometry_fails_task_but_not_pool() {
    let pool = DecodePool::new(PoolConfig::with_workers(1));

    // Declared dimensions whose product overflows any frame size. The task
    // must settle with an error; the worker must keep serving afterwards.
    let hostile = FrameInfo {
        bits_per_sample: Some(64),
        columns: Some(u32::MAX),
        rows: Some(u32::MAX),
        samples_per_pixel: Some(u32::MAX),
        pixel_representation: None,
    };
    let request = DecodeRequest::new(raw_frame(16), "1.2.3.4").with_declared(hostile);
    let handle = pool
        .add_task(TaskPayload::DecodeAndTransform(request), 0)
        .unwrap();

    let err = handle.promise().await.unwrap_err();
    assert!(matches!(err, DecodeError::FrameTooLarge { .. }));

    let next = pool.add_task(raw_task(4, 4), 0).unwrap();
    assert!(next.promise().await.is_ok());

    let stats = pool.stats();
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.in_flight, 0);

    pool.shutdown().await;
}
