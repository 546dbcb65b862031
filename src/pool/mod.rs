//! Decode worker pool.
//!
//! A fixed set of workers pulls tasks off a shared priority queue. Callers
//! get a [`TaskHandle`] back at submission; awaiting it yields the task's
//! settled result. The settlement contract is strict: every accepted task
//! settles exactly once, with a [`DecodeOutput`] or a [`DecodeError`], and
//! teardown settles everything still pending rather than leaving callers
//! hanging forever.

mod queue;
mod worker;

pub use queue::TaskId;
pub use worker::WorkerContext;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::PoolConfig;
use crate::error::{DecodeError, PoolError};
use crate::task::{DecodeOutput, TaskPayload};

use queue::{PendingQueue, QueuedTask};

// =============================================================================
// Shared state
// =============================================================================

/// One worker's dispatch slot, visible through [`PoolStats`].
#[derive(Default)]
pub(crate) struct WorkerSlot {
    /// Task the worker is currently executing, if any.
    pub assignment: Option<TaskId>,
}

pub(crate) struct PoolState {
    pub queue: PendingQueue,
    pub slots: Vec<WorkerSlot>,
    pub closed: bool,
    pub next_seq: u64,
    pub in_flight: usize,
}

/// State shared between the pool handle and its workers.
pub(crate) struct PoolShared {
    pub state: Mutex<PoolState>,
    /// Wakes one idle worker per enqueued task, all workers at teardown.
    pub task_available: Notify,
}

// =============================================================================
// TaskHandle
// =============================================================================

/// Receipt for one submitted task.
pub struct TaskHandle {
    id: TaskId,
    rx: oneshot::Receiver<Result<DecodeOutput, DecodeError>>,
}

impl TaskHandle {
    /// Identifier the pool assigned to this task.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Await the task's settled result.
    ///
    /// Resolves exactly once. If the pool is torn down first, the task
    /// settles with [`PoolError::Closed`]; a worker vanishing mid-task
    /// surfaces as [`PoolError::WorkerLost`].
    pub async fn promise(self) -> Result<DecodeOutput, DecodeError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(DecodeError::Pool(PoolError::WorkerLost)),
        }
    }
}

// =============================================================================
// PoolStats
// =============================================================================

/// Point-in-time queue and worker occupancy, for scheduling decisions and
/// debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Tasks waiting in the queue.
    pub pending: usize,

    /// Tasks currently executing on a worker.
    pub in_flight: usize,

    /// Workers with no assignment.
    pub idle: usize,
}

// =============================================================================
// DecodePool
// =============================================================================

/// Handle to a running decode pool.
pub struct DecodePool {
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    next_id: Mutex<u64>,
}

impl DecodePool {
    /// Start a pool with the configured number of workers.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: PoolConfig) -> Self {
        let worker_count = config.workers;

        let shared = Arc::new(PoolShared {
            state: Mutex::new(PoolState {
                queue: PendingQueue::default(),
                slots: (0..worker_count).map(|_| WorkerSlot::default()).collect(),
                closed: false,
                next_seq: 0,
                in_flight: 0,
            }),
            task_available: Notify::new(),
        });

        let workers = (0..worker_count)
            .map(|id| tokio::spawn(worker::run(Arc::clone(&shared), WorkerContext::new(id))))
            .collect();

        info!(workers = worker_count, "decode pool started");

        Self {
            shared,
            workers: Mutex::new(workers),
            next_id: Mutex::new(0),
        }
    }

    /// Submit a task at the given priority.
    ///
    /// Higher priorities dispatch first; equal priorities dispatch in
    /// submission order. Submission is synchronous and never blocks on a
    /// worker. Fails immediately with [`PoolError::Closed`] once
    /// [`shutdown`](Self::shutdown) has begun.
    pub fn add_task(&self, payload: TaskPayload, priority: i32) -> Result<TaskHandle, PoolError> {
        let id = {
            let mut next_id = self.next_id.lock();
            let id = TaskId(*next_id);
            *next_id += 1;
            id
        };

        let (settle, rx) = oneshot::channel();

        {
            let mut state = self.shared.state.lock();
            if state.closed {
                return Err(PoolError::Closed);
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.queue.push(QueuedTask {
                id,
                payload,
                priority,
                seq,
                settle,
            });
        }
        self.shared.task_available.notify_one();
        debug!(task = id.0, priority, "task enqueued");

        Ok(TaskHandle { id, rx })
    }

    /// Current queue and worker occupancy.
    ///
    /// After [`shutdown`](Self::shutdown) the workers are gone, so `idle`
    /// reports zero rather than counting capacity that no longer exists.
    pub fn stats(&self) -> PoolStats {
        let state = self.shared.state.lock();
        let idle = if state.closed {
            0
        } else {
            state
                .slots
                .iter()
                .filter(|slot| slot.assignment.is_none())
                .count()
        };
        PoolStats {
            pending: state.queue.len(),
            in_flight: state.in_flight,
            idle,
        }
    }

    /// Tear the pool down.
    ///
    /// Rejects further submissions, settles every still-queued task with
    /// [`PoolError::Closed`], lets in-flight tasks finish, and joins all
    /// workers. Idempotent; a second call is a no-op.
    pub async fn shutdown(&self) {
        let drained = {
            let mut state = self.shared.state.lock();
            if state.closed {
                Vec::new()
            } else {
                state.closed = true;
                state.queue.drain()
            }
        };

        let drained_count = drained.len();
        for task in drained {
            let _ = task.settle.send(Err(DecodeError::Pool(PoolError::Closed)));
        }
        self.shared.task_available.notify_waiters();

        let handles = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            let _ = handle.await;
        }

        info!(drained = drained_count, "decode pool stopped");
    }
}

// =============================================================================
// Tests
// =============================================================================
