//! Worker loop.
//!
//! Each worker owns a [`WorkerContext`] with its private codec cache and
//! color transformer, so workers never contend over decoder state. The loop
//! arms its wakeup before re-checking the queue, so a task enqueued between
//! the check and the await can never be missed.
//!
//! A panic inside the pipeline must not take the worker down with it: the
//! pipeline runs in its own task, a panic there is converted into
//! [`DecodeError::Panicked`] and settled like any other failure, and the
//! slot bookkeeping is released by a drop guard on every exit path.

use std::sync::Arc;

use tokio::task::JoinError;
use tracing::{debug, warn};

use crate::codec::CodecCache;
use crate::color::ColorTransformer;
use crate::error::DecodeError;
use crate::task::{decode_and_transform, TaskPayload};

use super::queue::QueuedTask;
use super::PoolShared;

// =============================================================================
// WorkerContext
// =============================================================================

/// Per-worker state threaded through the decode pipeline.
///
/// Public so the pipeline can be driven directly in tests without standing up
/// a pool.
pub struct WorkerContext {
    /// Slot index within the pool.
    pub id: usize,

    /// Lazily-initialized codec adapters, private to this worker.
    pub codecs: CodecCache,

    /// Per-image color transforms, private to this worker.
    pub transformer: ColorTransformer,
}

impl WorkerContext {
    /// Create a fresh context; codecs and transforms initialize on first use.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            codecs: CodecCache::new(),
            transformer: ColorTransformer::new(),
        }
    }
}

// =============================================================================
// Worker loop
// =============================================================================

/// Releases a worker's slot assignment and in-flight count when the task
/// ends, whatever the exit path.
struct SlotGuard<'a> {
    shared: &'a PoolShared,
    worker: usize,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.slots[self.worker].assignment = None;
        state.in_flight -= 1;
    }
}

pub(crate) async fn run(shared: Arc<PoolShared>, mut ctx: WorkerContext) {
    debug!(worker = ctx.id, "worker started");

    loop {
        // Arm the wakeup before looking at the queue. `enable` registers this
        // waiter immediately, so a notify_one fired after the queue check
        // below still lands here instead of being lost.
        let notified = shared.task_available.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let claimed = {
            let mut state = shared.state.lock();
            match state.queue.pop() {
                Some(task) => {
                    state.slots[ctx.id].assignment = Some(task.id);
                    state.in_flight += 1;
                    Some(task)
                }
                None if state.closed => {
                    debug!(worker = ctx.id, "worker stopping");
                    return;
                }
                None => None,
            }
        };

        match claimed {
            Some(task) => {
                let _release = SlotGuard {
                    shared: &shared,
                    worker: ctx.id,
                };
                ctx = execute(ctx, task).await;
            }
            None => notified.await,
        }
    }
}

/// Run one task and settle its channel, returning the worker's context.
///
/// The pipeline runs in a task of its own so a panic unwinds that task
/// instead of the worker loop. The context travels with the pipeline and
/// comes back on the normal path; after a panic it is rebuilt fresh, dropping
/// the worker's caches (they re-initialize on the next task).
async fn execute(ctx: WorkerContext, task: QueuedTask) -> WorkerContext {
    let QueuedTask {
        id, payload, settle, ..
    } = task;
    let worker_id = ctx.id;

    let pipeline = tokio::spawn(async move {
        let mut ctx = ctx;
        let result = match payload {
            TaskPayload::DecodeAndTransform(request) => {
                decode_and_transform(&mut ctx, request).await
            }
            #[cfg(test)]
            TaskPayload::Fault(message) => panic!("{message}"),
        };
        (ctx, result)
    });

    let (ctx, result) = match pipeline.await {
        Ok((ctx, result)) => (ctx, result),
        Err(join_err) => {
            let message = panic_message(join_err);
            warn!(worker = worker_id, task = id.0, %message, "decode task panicked");
            (
                WorkerContext::new(worker_id),
                Err(DecodeError::Panicked { message }),
            )
        }
    };

    if let Err(err) = &result {
        warn!(worker = ctx.id, task = id.0, error = %err, "decode task failed");
    } else {
        debug!(worker = ctx.id, task = id.0, "decode task completed");
    }

    // The receiver may have dropped its handle; that forfeits the result but
    // is not a worker error.
    let _ = settle.send(result);

    ctx
}

/// Recover a human-readable message from a pipeline task that did not return.
fn panic_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(panic) => {
            if let Some(message) = panic.downcast_ref::<&'static str>() {
                (*message).to_string()
            } else if let Some(message) = panic.downcast_ref::<String>() {
                message.clone()
            } else {
                "non-string panic payload".to_string()
            }
        }
        Err(err) => err.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
