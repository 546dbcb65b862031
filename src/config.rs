//! Pool configuration.
//!
//! The pool size is fixed at creation. The default follows the machine's
//! available parallelism (which respects cgroup CPU quotas), clamped to a
//! sane range so a misconfigured container cannot spawn hundreds of workers.

// =============================================================================
// Constants
// =============================================================================

/// Minimum number of decode workers.
pub const MIN_WORKERS: usize = 1;

/// Maximum number of decode workers.
///
/// Decoding is CPU-bound; more workers than cores only adds scheduling churn.
pub const MAX_WORKERS: usize = 64;

// =============================================================================
// PoolConfig
// =============================================================================

/// Configuration for a [`DecodePool`](crate::pool::DecodePool).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of parallel decode workers.
    pub workers: usize,
}

impl PoolConfig {
    /// Create a configuration with an explicit worker count.
    ///
    /// The count is clamped to `[MIN_WORKERS, MAX_WORKERS]`.
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.clamp(MIN_WORKERS, MAX_WORKERS),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_worker_count(),
        }
    }
}

/// Detect a reasonable default worker count.
///
/// Uses `std::thread::available_parallelism` so container CPU quotas are
/// respected; falls back to a single worker when detection fails.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_WORKERS)
        .clamp(MIN_WORKERS, MAX_WORKERS)
}

// =============================================================================
// Tests
// =============================================================================
