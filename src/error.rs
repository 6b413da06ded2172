//! Error types for trapbench

use thiserror::Error;

/// Result type for worker-group and integration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for worker-group and integration operations
#[derive(Error, Debug)]
pub enum Error {
    /// A worker group needs at least one worker
    #[error("worker group must have at least one worker")]
    InvalidWorkerCount,

    /// Rank out of range for the group
    #[error("rank {rank} out of range for {size} workers")]
    InvalidRank {
        /// The offending ordinal
        rank: usize,
        /// Total worker count of the group
        size: usize,
    },

    /// Root rank out of range for the group
    #[error("invalid root rank: {0}")]
    InvalidRoot(usize),

    /// Integration interval is empty or reversed
    #[error("invalid interval: x0 = {x0} must lie strictly below xn = {xn}")]
    InvalidInterval {
        /// Lower bound as given
        x0: f64,
        /// Upper bound as given
        xn: f64,
    },

    /// Subdivision count must be positive
    #[error("subdivision count must be positive")]
    InvalidSubdivisions,

    /// Integer division left a worker with zero subdivisions (`size > n`)
    #[error("empty partition for rank {rank}: {n} subdivisions across {size} workers leave no work per worker")]
    EmptyPartition {
        /// The worker whose share is empty
        rank: usize,
        /// Total worker count
        size: usize,
        /// Global subdivision count
        n: u64,
    },

    /// Workers disagreed at a rendezvous (different collective, parameters,
    /// element counts, or element types)
    #[error("collective mismatch across workers: {0}")]
    CollectiveMismatch(&'static str),

    /// A worker panicked while holding the rendezvous lock
    #[error("a worker panicked inside a collective; the group is unusable")]
    Poisoned,

    /// A worker thread panicked
    #[error("worker {rank} panicked")]
    WorkerPanicked {
        /// The worker that panicked
        rank: usize,
    },

    /// Failed to write the timing report
    #[error("failed to write timing report")]
    Report(#[from] csv::Error),
}
