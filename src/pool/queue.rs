//! Priority queue of pending decode tasks.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tokio::sync::oneshot;

use crate::error::DecodeError;
use crate::task::{DecodeOutput, TaskPayload};

/// Opaque task identifier, unique within one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub(crate) u64);

/// One enqueued task: the work to do plus the channel that settles it.
pub(crate) struct QueuedTask {
    pub id: TaskId,
    pub payload: TaskPayload,
    pub priority: i32,
    /// Monotonic submission counter, for FIFO order within a priority.
    pub seq: u64,
    pub settle: oneshot::Sender<Result<DecodeOutput, DecodeError>>,
}

impl PartialEq for QueuedTask {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedTask {}

impl Ord for QueuedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: higher priority first, then earlier submission (lower
        // seq) first within a priority.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pending tasks ordered by priority, FIFO within equal priorities.
#[derive(Default)]
pub(crate) struct PendingQueue {
    heap: BinaryHeap<QueuedTask>,
}

impl PendingQueue {
    pub fn push(&mut self, task: QueuedTask) {
        self.heap.push(task);
    }

    pub fn pop(&mut self) -> Option<QueuedTask> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Remove and return every pending task, in no particular order. Used at
    /// teardown, where each drained task is settled with an error.
    pub fn drain(&mut self) -> Vec<QueuedTask> {
        std::mem::take(&mut self.heap).into_vec()
    }
}
