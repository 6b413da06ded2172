//! Collective operations between the workers of a group.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::rendezvous::{Fault, PhaseKind, Rendezvous};
use crate::scalar::CollectiveScalar;
use crate::ReduceOp;

/// A worker's handle into its group.
///
/// Each worker receives its own `Communicator` carrying an explicitly
/// assigned ordinal and the total worker count — there is no ambient global
/// identity. All cross-worker coordination goes through the collective
/// methods below.
///
/// Every collective is a synchronization point: all workers in the group
/// must call it, and must issue their collectives in the same relative
/// order. No worker returns from a collective before every worker has
/// entered it. A worker that never reaches a collective leaves the rest of
/// the group blocked indefinitely.
///
/// # Example
///
/// ```
/// use trapbench::{ReduceOp, WorkerGroup};
///
/// let group = WorkerGroup::new(4)?;
/// group.run(|comm| {
///     let sum = comm.allreduce_scalar(comm.rank() as f64, ReduceOp::Sum)?;
///     assert_eq!(sum, 6.0); // 0 + 1 + 2 + 3
///     Ok(())
/// })?;
/// # Ok::<(), trapbench::Error>(())
/// ```
pub struct Communicator {
    rank: usize,
    size: usize,
    rendezvous: Arc<Rendezvous>,
}

impl Communicator {
    pub(crate) fn new(rank: usize, size: usize, rendezvous: Arc<Rendezvous>) -> Self {
        Communicator {
            rank,
            size,
            rendezvous,
        }
    }

    /// Get the ordinal of the calling worker in this group.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Get the number of workers in this group.
    pub fn size(&self) -> usize {
        self.size
    }

    fn check_root(&self, root: usize) -> Result<()> {
        if root >= self.size {
            // Every worker sees the same size, so all of them fail here
            // uniformly instead of desynchronizing at the rendezvous.
            return Err(Error::InvalidRoot(root));
        }
        Ok(())
    }

    // ========================================================================
    // Synchronization
    // ========================================================================

    /// Barrier synchronization.
    ///
    /// All workers in the group must call this method. No worker returns
    /// until all workers have entered the barrier.
    pub fn barrier(&self) -> Result<()> {
        self.rendezvous.join(
            PhaseKind::Barrier,
            |slot| {
                if slot.is_none() {
                    *slot = Some(Box::new(()));
                }
                Ok(())
            },
            |_| Ok(()),
        )
    }

    // ========================================================================
    // Collectives
    // ========================================================================

    /// Broadcast the root's buffer to every worker.
    ///
    /// On the root, `data` is the source; on every other worker it is
    /// overwritten with the root's values. All workers must pass buffers of
    /// the same length.
    pub fn broadcast<T: CollectiveScalar>(&self, data: &mut [T], root: usize) -> Result<()> {
        self.check_root(root)?;
        let payload = if self.rank == root {
            Some(data.to_vec())
        } else {
            None
        };
        self.rendezvous.join(
            PhaseKind::Broadcast { root },
            move |slot| {
                if let Some(payload) = payload {
                    *slot = Some(Box::new(payload));
                }
                Ok(())
            },
            |published| {
                let values = published.downcast_ref::<Vec<T>>().ok_or(Fault::Type)?;
                if values.len() != data.len() {
                    return Err(Fault::Count);
                }
                data.copy_from_slice(values);
                Ok(())
            },
        )
    }

    /// Reduce values element-wise onto the root worker.
    ///
    /// Returns `Some(combined)` on `root` and `None` on every other worker —
    /// an absent result, deliberately distinct from any numeric value. All
    /// workers must pass slices of the same length.
    ///
    /// Values combine in worker arrival order, which is unspecified;
    /// floating-point results are numerically close but not bitwise
    /// reproducible across different group sizes.
    pub fn reduce<T: CollectiveScalar>(
        &self,
        send: &[T],
        op: ReduceOp,
        root: usize,
    ) -> Result<Option<Vec<T>>> {
        self.check_root(root)?;
        let rank = self.rank;
        self.rendezvous.join(
            PhaseKind::Reduce { op, root },
            |slot| fold_into(slot, send, op),
            move |published| {
                if rank != root {
                    return Ok(None);
                }
                let values = published.downcast_ref::<Vec<T>>().ok_or(Fault::Type)?;
                Ok(Some(values.clone()))
            },
        )
    }

    /// Reduce a single value onto the root worker.
    ///
    /// Convenience wrapper around [`reduce`](Self::reduce) for one scalar.
    pub fn reduce_scalar<T: CollectiveScalar>(
        &self,
        value: T,
        op: ReduceOp,
        root: usize,
    ) -> Result<Option<T>> {
        Ok(self.reduce(&[value], op, root)?.map(|values| values[0]))
    }

    /// Reduce values element-wise and hand the result to every worker.
    pub fn allreduce<T: CollectiveScalar>(&self, send: &[T], op: ReduceOp) -> Result<Vec<T>> {
        self.rendezvous.join(
            PhaseKind::Allreduce { op },
            |slot| fold_into(slot, send, op),
            |published| {
                let values = published.downcast_ref::<Vec<T>>().ok_or(Fault::Type)?;
                Ok(values.clone())
            },
        )
    }

    /// Reduce a single value and hand the result to every worker.
    pub fn allreduce_scalar<T: CollectiveScalar>(&self, value: T, op: ReduceOp) -> Result<T> {
        Ok(self.allreduce(&[value], op)?[0])
    }

    /// Gather one value per worker at the root, ordered by worker ordinal.
    ///
    /// Returns `Some(values)` on `root` with `values[r]` holding worker
    /// `r`'s contribution, and `None` on every other worker.
    pub fn gather_scalar<T: CollectiveScalar>(&self, value: T, root: usize) -> Result<Option<Vec<T>>> {
        self.check_root(root)?;
        let (rank, size) = (self.rank, self.size);
        self.rendezvous.join(
            PhaseKind::Gather { root },
            move |slot| {
                if slot.is_none() {
                    *slot = Some(Box::new(vec![None::<T>; size]));
                }
                let cells = slot
                    .as_mut()
                    .and_then(|boxed| boxed.downcast_mut::<Vec<Option<T>>>())
                    .ok_or(Fault::Type)?;
                cells[rank] = Some(value);
                Ok(())
            },
            move |published| {
                if rank != root {
                    return Ok(None);
                }
                let cells = published
                    .downcast_ref::<Vec<Option<T>>>()
                    .ok_or(Fault::Type)?;
                let mut values = Vec::with_capacity(cells.len());
                for cell in cells {
                    match cell {
                        Some(value) => values.push(*value),
                        None => return Err(Fault::Count),
                    }
                }
                Ok(Some(values))
            },
        )
    }
}

/// Seed the slot with the first worker's values, or fold `send` into the
/// accumulator element-wise.
fn fold_into<T: CollectiveScalar>(
    slot: &mut Option<Box<dyn std::any::Any + Send>>,
    send: &[T],
    op: ReduceOp,
) -> std::result::Result<(), Fault> {
    if slot.is_none() {
        *slot = Some(Box::new(send.to_vec()));
        return Ok(());
    }
    let acc = slot
        .as_mut()
        .and_then(|boxed| boxed.downcast_mut::<Vec<T>>())
        .ok_or(Fault::Type)?;
    if acc.len() != send.len() {
        return Err(Fault::Count);
    }
    for (acc_value, value) in acc.iter_mut().zip(send.iter().copied()) {
        *acc_value = T::combine(op, *acc_value, value);
    }
    Ok(())
}
