//! The rendezvous cell backing every collective operation.
//!
//! All workers of a group share one [`Rendezvous`]. Each collective call is a
//! *phase*: workers arrive one by one under the lock, fold their contribution
//! into a shared slot, and block until the last worker arrives. The last
//! arrival publishes the assembled value, opens the next generation, and
//! wakes everyone. A phase therefore acts as a barrier — no worker leaves a
//! collective before every worker has entered it.
//!
//! Generations make the cell reusable: a worker still draining phase `g`
//! cannot observe phase `g + 1`'s result, because `g + 1` can only complete
//! after every worker has left `g` and arrived again.
//!
//! There are no timeouts. A worker that never arrives leaves the rest of the
//! group blocked — that is a fatal whole-program condition by design.

use std::any::Any;
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::ReduceOp;

/// Identifies the collective a worker is entering, including the parameters
/// that must agree across the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PhaseKind {
    Barrier,
    Broadcast { root: usize },
    Reduce { op: ReduceOp, root: usize },
    Allreduce { op: ReduceOp },
    Gather { root: usize },
}

/// A disagreement detected while assembling a phase.
///
/// Faults complete the phase like a value would, so every participant
/// returns an error instead of some workers hanging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    /// Workers entered different collectives, or the same collective with
    /// different parameters.
    Order,
    /// Element counts differ across workers.
    Count,
    /// Element types differ across workers.
    Type,
}

impl From<Fault> for Error {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::Order => {
                Error::CollectiveMismatch("workers issued different collectives or parameters")
            }
            Fault::Count => Error::CollectiveMismatch("element counts differ across workers"),
            Fault::Type => Error::CollectiveMismatch("element types differ across workers"),
        }
    }
}

/// Type-erased payload being assembled or published by a phase.
pub(crate) type Slot = Option<Box<dyn Any + Send>>;

struct PhaseState {
    /// Bumped when a phase completes; waiters watch this, not `arrived`.
    generation: u64,
    /// Workers that have entered the current phase.
    arrived: usize,
    /// Stamped by the first arrival; later arrivals must match it.
    kind: Option<PhaseKind>,
    /// Payload under assembly for the current phase.
    slot: Slot,
    /// Fault raised while assembling the current phase.
    fault: Option<Fault>,
    /// Payload of the last completed phase.
    published: Slot,
    /// Fault of the last completed phase.
    published_fault: Option<Fault>,
}

/// Shared join point for one worker group.
pub(crate) struct Rendezvous {
    size: usize,
    state: Mutex<PhaseState>,
    arrivals: Condvar,
}

impl Rendezvous {
    pub(crate) fn new(size: usize) -> Self {
        Rendezvous {
            size,
            state: Mutex::new(PhaseState {
                generation: 0,
                arrived: 0,
                kind: None,
                slot: None,
                fault: None,
                published: None,
                published_fault: None,
            }),
            arrivals: Condvar::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, PhaseState>> {
        self.state.lock().map_err(|_| Error::Poisoned)
    }

    /// Enter a phase of kind `kind`.
    ///
    /// `contribute` folds the caller's data into the slot (seeding it on
    /// first arrival). `collect` extracts the caller's view of the published
    /// payload once the phase completes. Both run under the lock and must
    /// stay cheap.
    pub(crate) fn join<R>(
        &self,
        kind: PhaseKind,
        contribute: impl FnOnce(&mut Slot) -> std::result::Result<(), Fault>,
        collect: impl FnOnce(&(dyn Any + Send)) -> std::result::Result<R, Fault>,
    ) -> Result<R> {
        let mut st = self.lock()?;
        let generation = st.generation;

        if st.arrived == 0 {
            st.kind = Some(kind);
        } else if st.kind != Some(kind) {
            st.fault = Some(Fault::Order);
        }

        if st.fault.is_none() {
            if let Err(fault) = contribute(&mut st.slot) {
                st.fault = Some(fault);
            }
        }

        st.arrived += 1;
        if st.arrived == self.size {
            st.published = st.slot.take();
            st.published_fault = st.fault.take();
            st.kind = None;
            st.arrived = 0;
            st.generation = st.generation.wrapping_add(1);
            self.arrivals.notify_all();
        } else {
            while st.generation == generation {
                st = self.arrivals.wait(st).map_err(|_| Error::Poisoned)?;
            }
        }

        if let Some(fault) = st.published_fault {
            return Err(fault.into());
        }
        match st.published.as_deref() {
            Some(payload) => collect(payload).map_err(Error::from),
            // Every phase kind seeds its slot before completion.
            None => Err(Fault::Type.into()),
        }
    }
}
