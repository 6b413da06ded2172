//! # trapbench
//!
//! A demonstration/benchmark of data-parallel numerical integration: the
//! composite trapezoidal rule over a fixed cubic polynomial, partitioned
//! across a group of cooperating workers and combined with a sum-reduction
//! at a designated worker.
//!
//! The crate has two halves:
//!
//! - MPI-style collectives over OS threads: a [`WorkerGroup`] launches one
//!   worker per thread, each holding a [`Communicator`] with an explicit
//!   ordinal and total count, and the group coordinates exclusively through
//!   blocking collectives (barrier, broadcast, reduce, all-reduce, gather).
//! - The partitioned integrator itself: [`Integral`] splits its domain into
//!   contiguous per-worker slices, folds partial sums together, and hands
//!   the finished estimate to the designated worker only.
//!
//! ## Quick Start
//!
//! ```
//! use trapbench::{Integral, WorkerGroup, ROOT};
//!
//! fn main() -> Result<(), trapbench::Error> {
//!     let integral = Integral::new(0.0, 1.0, 1_000)?;
//!     let group = WorkerGroup::new(4)?;
//!
//!     // Every worker runs the same closure; only the designated worker
//!     // gets a result back.
//!     let results = group.run(|comm| integral.estimate(comm))?;
//!
//!     assert!(results[ROOT].is_some());
//!     assert!(results.iter().skip(1).all(Option::is_none));
//!     Ok(())
//! }
//! ```
//!
//! ## Capabilities
//!
//! - **Collectives**: barrier, broadcast, reduce, all-reduce, gather — each
//!   a hard rendezvous every worker must reach, in the same relative order
//! - **Typed transport**: operations are generic over [`CollectiveScalar`]
//!   (`f32`, `f64`, `i32`, `i64`, `u32`, `u64`)
//! - **Root-only results**: reduce and gather return `Option` — `Some` at
//!   the chosen root, `None` elsewhere, never a placeholder zero
//! - **Scaling reports**: timing samples flow through a pluggable
//!   [`ReportSink`] (console table or CSV), instead of an interactive plot

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

mod comm;
mod error;
mod integrate;
mod rendezvous;
mod report;
mod scalar;

pub use comm::Communicator;
pub use error::{Error, Result};
pub use integrate::{integrand, Integral, Partition, ROOT};
pub use report::{ConsoleSink, CsvSink, ReportSink, TimingSample};
pub use scalar::CollectiveScalar;

use std::sync::Arc;
use std::thread;

use rendezvous::Rendezvous;

/// Reduction operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Sum of values
    Sum,
    /// Maximum value
    Max,
    /// Minimum value
    Min,
    /// Product of values
    Prod,
}

/// A fixed-size group of workers, one OS thread each.
///
/// This is the launcher: it assigns each worker its ordinal, wires all
/// workers to one shared rendezvous, and joins them when the entry point
/// returns. Rank and size reach the workers as explicit values on their
/// [`Communicator`] — nothing is ambient.
///
/// # Example
///
/// ```
/// use trapbench::{ReduceOp, WorkerGroup};
///
/// let group = WorkerGroup::new(3)?;
/// let ranks = group.run(|comm| Ok(comm.rank()))?;
/// assert_eq!(ranks, vec![0, 1, 2]);
/// # Ok::<(), trapbench::Error>(())
/// ```
pub struct WorkerGroup {
    size: usize,
}

impl WorkerGroup {
    /// Create a group of `size` workers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWorkerCount`] when `size` is zero.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidWorkerCount);
        }
        Ok(WorkerGroup { size })
    }

    /// Get the number of workers this group launches.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `f` once per worker and collect the outputs, ordered by rank.
    ///
    /// Every worker executes the same entry point with its own
    /// [`Communicator`]. The call returns once all workers have finished.
    /// If any worker returns an error, the lowest-ranked failure is
    /// reported; a panicking worker surfaces as
    /// [`Error::WorkerPanicked`] after the remaining workers have been
    /// joined.
    ///
    /// Workers proceed independently between collectives; there is no
    /// ordering guarantee except at the collectives themselves.
    pub fn run<F, R>(&self, f: F) -> Result<Vec<R>>
    where
        F: Fn(&Communicator) -> Result<R> + Sync,
        R: Send,
    {
        let rendezvous = Arc::new(Rendezvous::new(self.size));
        let f = &f;

        thread::scope(|scope| {
            let handles: Vec<_> = (0..self.size)
                .map(|rank| {
                    let comm = Communicator::new(rank, self.size, Arc::clone(&rendezvous));
                    scope.spawn(move || f(&comm))
                })
                .collect();

            // Join every worker before reporting, so a failure in one does
            // not leave the others detached mid-collective.
            let mut outcomes = Vec::with_capacity(self.size);
            for (rank, handle) in handles.into_iter().enumerate() {
                outcomes.push(match handle.join() {
                    Ok(outcome) => outcome,
                    Err(_) => Err(Error::WorkerPanicked { rank }),
                });
            }
            outcomes.into_iter().collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_workers_is_rejected() {
        assert!(matches!(WorkerGroup::new(0), Err(Error::InvalidWorkerCount)));
    }

    #[test]
    fn outputs_are_ordered_by_rank() {
        let group = WorkerGroup::new(6).unwrap();
        let ranks = group.run(|comm| Ok(comm.rank())).unwrap();
        assert_eq!(ranks, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn every_worker_sees_the_group_size() {
        let group = WorkerGroup::new(3).unwrap();
        let sizes = group.run(|comm| Ok(comm.size())).unwrap();
        assert_eq!(sizes, vec![3, 3, 3]);
    }

    #[test]
    fn worker_errors_propagate() {
        let group = WorkerGroup::new(3).unwrap();
        let err = group
            .run(|comm| {
                if comm.rank() == 1 {
                    Err(Error::InvalidRoot(99))
                } else {
                    Ok(())
                }
            })
            .unwrap_err();

        assert!(matches!(err, Error::InvalidRoot(99)));
    }

    #[test]
    fn worker_panics_are_reported_with_their_rank() {
        let group = WorkerGroup::new(2).unwrap();
        let err = group
            .run(|comm| {
                if comm.rank() == 1 {
                    panic!("boom");
                }
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, Error::WorkerPanicked { rank: 1 }));
    }
}
