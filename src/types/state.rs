//! Shared view-model state
//!
//! `SharedState` is the single store a screen renders from. It is written
//! only by the staged loader and the post-mutation refresh path — never
//! directly by UI actions — and is reset whenever its owning session is
//! destroyed.
//!
//! All merges run synchronously after a fetch task resumes, so there is only
//! ever one logical writer; the mutex exists because tasks may live on a
//! multi-threaded runtime, not because concurrent merges are expected.

use std::sync::{Arc, Mutex, PoisonError};

/// Loading/refreshing/error indicators shared by every screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFlags {
    /// The blocking indicator: raised until the critical group settles
    pub loading: bool,
    /// The non-blocking indicator: raised while a refresh is in flight
    pub refreshing: bool,
    /// The screen's error slot; `None` when the last surfaced path succeeded
    pub error: Option<String>,
}

/// A point-in-time copy of a screen's state, handed to the view layer
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot<S> {
    pub data: S,
    pub flags: StatusFlags,
}

struct StateCell<S> {
    data: S,
    flags: StatusFlags,
}

/// The merged view model for one screen
///
/// Cheap to clone (`Arc` inside); every clone observes the same state. The
/// payload type `S` is the screen's own struct (wallet or admin), so each
/// fetch group can merge only the fields it owns.
pub struct SharedState<S> {
    inner: Arc<Mutex<StateCell<S>>>,
}

impl<S> Clone for SharedState<S> {
    fn clone(&self) -> Self {
        SharedState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Default> Default for SharedState<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Default> SharedState<S> {
    /// Create an empty store with all flags lowered
    pub fn new() -> Self {
        SharedState {
            inner: Arc::new(Mutex::new(StateCell {
                data: S::default(),
                flags: StatusFlags::default(),
            })),
        }
    }

    /// Discard all data and raise the loading flag for a fresh session
    pub fn reset_for_session(&self) {
        let mut cell = self.lock();
        cell.data = S::default();
        cell.flags = StatusFlags {
            loading: true,
            refreshing: false,
            error: None,
        };
    }

    /// Discard all data and lower every flag (no session bound)
    pub fn clear(&self) {
        let mut cell = self.lock();
        cell.data = S::default();
        cell.flags = StatusFlags::default();
    }
}

impl<S> SharedState<S> {
    fn lock(&self) -> std::sync::MutexGuard<'_, StateCell<S>> {
        // A panicked merge leaves prior values; recover rather than poison
        // the whole screen.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a merge closure to the payload
    ///
    /// Callers must have checked session liveness immediately before this,
    /// not merely before dispatching the fetch.
    pub fn merge(&self, f: impl FnOnce(&mut S)) {
        f(&mut self.lock().data)
    }

    /// Read the payload without copying it
    pub fn read<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        f(&self.lock().data)
    }

    pub fn set_loading(&self, loading: bool) {
        self.lock().flags.loading = loading;
    }

    pub fn set_refreshing(&self, refreshing: bool) {
        self.lock().flags.refreshing = refreshing;
    }

    /// Set or clear the error slot
    pub fn set_error(&self, error: Option<String>) {
        self.lock().flags.error = error;
    }

    pub fn flags(&self) -> StatusFlags {
        self.lock().flags.clone()
    }
}

impl<S: Clone> SharedState<S> {
    /// Copy out the current data and flags for rendering
    pub fn snapshot(&self) -> StateSnapshot<S> {
        let cell = self.lock();
        StateSnapshot {
            data: cell.data.clone(),
            flags: cell.flags.clone(),
        }
    }
}
