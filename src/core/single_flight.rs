//! Single-flight admission per resource class
//!
//! The guard prevents two concurrent fetches of the same logical resource
//! class within one session. It protects against logically redundant
//! requests, not data races: shared state has a single logical writer.
//!
//! Entry semantics:
//! - **SkipIfBusy**: a caller finding the class occupied backs off (poll
//!   ticks, background secondary refreshes).
//! - **Force**: a caller finding the class occupied cancels the incumbent's
//!   handle and takes the slot (manual and post-mutation refreshes). The
//!   forced entry always wins; the incumbent is the one cancelled, never the
//!   reverse.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::core::fetch_task::ResourceClass;

/// How a caller wants to be admitted when the class is occupied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    /// Silently skip if a task of this class is already alive
    SkipIfBusy,
    /// Cancel the incumbent task and take the slot
    Force,
}

struct FlightSlot {
    generation: u64,
    cancel: CancellationToken,
}

struct GuardInner {
    slots: DashMap<ResourceClass, FlightSlot>,
    generations: AtomicU64,
}

/// Admission guard for one session's outstanding fetches
///
/// Cheap to clone; all clones share the same slot table. Slots are keyed by
/// [`ResourceClass`] and released when the admitted caller's
/// [`FlightPermit`] drops.
#[derive(Clone)]
pub struct SingleFlightGuard {
    inner: Arc<GuardInner>,
}

impl Default for SingleFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SingleFlightGuard {
    pub fn new() -> Self {
        SingleFlightGuard {
            inner: Arc::new(GuardInner {
                slots: DashMap::new(),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Request admission for a task of `class`
    ///
    /// `cancel` is the handle a forced successor (or session teardown) will
    /// use to kill the task; the guard keeps a clone in the slot for exactly
    /// that purpose.
    ///
    /// Returns `None` when the caller must skip. Holding the returned permit
    /// is what keeps the slot occupied — drop it once the task settles.
    pub fn try_enter(
        &self,
        class: ResourceClass,
        mode: EntryMode,
        cancel: CancellationToken,
    ) -> Option<FlightPermit> {
        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let slot = FlightSlot { generation, cancel };

        match self.inner.slots.entry(class) {
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
            }
            Entry::Occupied(mut occupied) => match mode {
                EntryMode::SkipIfBusy => return None,
                EntryMode::Force => {
                    occupied.get().cancel.cancel();
                    occupied.insert(slot);
                }
            },
        }

        Some(FlightPermit {
            guard: self.clone(),
            class,
            generation,
        })
    }

    /// Whether a task of `class` is currently alive
    pub fn is_busy(&self, class: ResourceClass) -> bool {
        self.inner.slots.contains_key(&class)
    }

    /// Cancel every outstanding task; used on session teardown
    pub fn cancel_all(&self) {
        for slot in self.inner.slots.iter() {
            slot.cancel.cancel();
        }
    }

    fn leave(&self, class: ResourceClass, generation: u64) {
        // Generation check: a superseded task settling late must not evict
        // the successor that forced it out.
        self.inner
            .slots
            .remove_if(&class, |_, slot| slot.generation == generation);
    }
}

/// Occupancy of one resource-class slot
///
/// Dropping the permit releases the slot — but only if it still belongs to
/// this permit's admission; a forced successor's slot is left untouched.
pub struct FlightPermit {
    guard: SingleFlightGuard,
    class: ResourceClass,
    generation: u64,
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.guard.leave(self.class, self.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> CancellationToken {
        CancellationToken::new()
    }

    #[test]
    fn test_non_forced_entries_admit_exactly_one() {
        let guard = SingleFlightGuard::new();

        let winner = guard.try_enter(ResourceClass::Poll, EntryMode::SkipIfBusy, token());
        assert!(winner.is_some());

        for _ in 0..4 {
            let loser = guard.try_enter(ResourceClass::Poll, EntryMode::SkipIfBusy, token());
            assert!(loser.is_none());
        }
    }

    #[test]
    fn test_distinct_classes_do_not_contend() {
        let guard = SingleFlightGuard::new();
        let a = guard.try_enter(ResourceClass::Critical, EntryMode::SkipIfBusy, token());
        let b = guard.try_enter(ResourceClass::Secondary, EntryMode::SkipIfBusy, token());
        assert!(a.is_some() && b.is_some());
    }

    #[test]
    fn test_dropping_the_permit_frees_the_slot() {
        let guard = SingleFlightGuard::new();
        let permit = guard.try_enter(ResourceClass::Poll, EntryMode::SkipIfBusy, token());
        assert!(guard.is_busy(ResourceClass::Poll));

        drop(permit);
        assert!(!guard.is_busy(ResourceClass::Poll));
        assert!(guard
            .try_enter(ResourceClass::Poll, EntryMode::SkipIfBusy, token())
            .is_some());
    }

    #[test]
    fn test_forced_entry_cancels_the_incumbent() {
        let guard = SingleFlightGuard::new();
        let incumbent_cancel = token();
        let _incumbent = guard
            .try_enter(ResourceClass::Poll, EntryMode::SkipIfBusy, incumbent_cancel.clone())
            .expect("slot was free");

        let successor_cancel = token();
        let successor = guard.try_enter(ResourceClass::Poll, EntryMode::Force, successor_cancel.clone());

        assert!(successor.is_some());
        assert!(incumbent_cancel.is_cancelled());
        assert!(!successor_cancel.is_cancelled());
    }

    #[test]
    fn test_superseded_permit_drop_does_not_evict_successor() {
        let guard = SingleFlightGuard::new();
        let incumbent = guard
            .try_enter(ResourceClass::Poll, EntryMode::SkipIfBusy, token())
            .expect("slot was free");
        let _successor = guard
            .try_enter(ResourceClass::Poll, EntryMode::Force, token())
            .expect("forced entry always wins");

        // The cancelled incumbent settles late and releases its permit.
        drop(incumbent);

        // The successor still owns the slot: a third non-forced caller skips.
        assert!(guard.is_busy(ResourceClass::Poll));
        assert!(guard
            .try_enter(ResourceClass::Poll, EntryMode::SkipIfBusy, token())
            .is_none());
    }

    #[test]
    fn test_cancel_all_hits_every_outstanding_task() {
        let guard = SingleFlightGuard::new();
        let poll_cancel = token();
        let secondary_cancel = token();
        let _a = guard.try_enter(ResourceClass::Poll, EntryMode::SkipIfBusy, poll_cancel.clone());
        let _b = guard.try_enter(
            ResourceClass::Secondary,
            EntryMode::SkipIfBusy,
            secondary_cancel.clone(),
        );

        guard.cancel_all();
        assert!(poll_cancel.is_cancelled());
        assert!(secondary_cancel.is_cancelled());
    }
}
