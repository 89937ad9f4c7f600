//! Session lifetime and identity binding
//!
//! A [`SyncSession`] is the unit of lifetime for all sync work: every fetch
//! task, timer, and merge belongs to exactly one session, and destroying the
//! session invalidates all of them transitively. Sessions are keyed by the
//! identity token they were armed for; [`SessionBinding::bind`] is the only
//! way sessions are created or destroyed.
//!
//! `bind` is a pure function of `(previous session, new token)`: equal token
//! and a live session returns the same session unchanged, so spurious
//! re-activation by the host environment is harmless by construction rather
//! than by defensive flag-juggling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::poll::PollScheduler;
use crate::core::single_flight::SingleFlightGuard;
use crate::types::BearerToken;

struct SessionCore {
    token: BearerToken,
    generation: u64,
    /// Lowered on destruction; checked immediately before every merge
    live: AtomicBool,
    /// Raised by the first (and only) claim of the initial load
    initial_started: AtomicBool,
    /// Raised when the critical group settles
    initial_load_complete: AtomicBool,
    /// Root of the cancellation tree for all of this session's work
    cancel_root: CancellationToken,
    flights: SingleFlightGuard,
    poll: PollScheduler,
}

/// One screen's live sync context, bound to one identity token
///
/// Cheap to clone; clones share the same underlying session.
#[derive(Clone)]
pub struct SyncSession {
    core: Arc<SessionCore>,
}

impl SyncSession {
    fn new(token: BearerToken, generation: u64) -> Self {
        SyncSession {
            core: Arc::new(SessionCore {
                token,
                generation,
                live: AtomicBool::new(true),
                initial_started: AtomicBool::new(false),
                initial_load_complete: AtomicBool::new(false),
                cancel_root: CancellationToken::new(),
                flights: SingleFlightGuard::new(),
                poll: PollScheduler::new(),
            }),
        }
    }

    /// The identity token this session was armed for
    pub fn token(&self) -> &BearerToken {
        &self.core.token
    }

    /// Monotonic counter distinguishing successive sessions of one screen
    pub fn generation(&self) -> u64 {
        self.core.generation
    }

    /// Whether merges on behalf of this session are still permitted
    pub fn is_live(&self) -> bool {
        self.core.live.load(Ordering::Acquire)
    }

    pub fn initial_load_complete(&self) -> bool {
        self.core.initial_load_complete.load(Ordering::Acquire)
    }

    /// Claim the right to run the initial load; true exactly once per session
    pub(crate) fn try_claim_initial(&self) -> bool {
        self.core
            .initial_started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn mark_initial_complete(&self) {
        self.core
            .initial_load_complete
            .store(true, Ordering::Release);
    }

    /// A cancellation handle that dies with the session
    pub fn child_cancellation(&self) -> CancellationToken {
        self.core.cancel_root.child_token()
    }

    /// This session's single-flight admission guard
    pub fn flights(&self) -> &SingleFlightGuard {
        &self.core.flights
    }

    /// This session's background refresh scheduler
    pub fn poll(&self) -> &PollScheduler {
        &self.core.poll
    }

    /// Root cancellation handle, for arming timers
    pub(crate) fn cancel_root(&self) -> &CancellationToken {
        &self.core.cancel_root
    }

    /// Unmount: cancel all child tasks and timers, forbid further merges
    fn teardown(&self) {
        self.core.live.store(false, Ordering::Release);
        self.core.poll.teardown();
        self.core.flights.cancel_all();
        self.core.cancel_root.cancel();
    }
}

/// Result of a [`SessionBinding::bind`] call
pub enum BindOutcome {
    /// Token unchanged and session live — nothing to do
    Unchanged(SyncSession),
    /// Identity changed — old session destroyed, fresh one returned
    Rebound(SyncSession),
    /// Token withdrawn — old session destroyed, nothing bound
    Cleared,
}

/// Ties sync work to the current identity token
///
/// At most one live session exists per binding (hence per screen instance).
/// No network call is ever issued from here; a rebind only arms the staged
/// loader to run once.
#[derive(Default)]
pub struct SessionBinding {
    current: Option<SyncSession>,
    generations: u64,
}

impl SessionBinding {
    pub fn new() -> Self {
        SessionBinding {
            current: None,
            generations: 0,
        }
    }

    /// React to the current identity token
    ///
    /// Idempotent for equal tokens: redundant re-activation of a screen
    /// returns the existing session unchanged. Any token change — none to
    /// some, some to none, some to other — destroys the old session (all
    /// fetches and timers cancelled, merges forbidden) before the new one is
    /// created.
    pub fn bind(&mut self, token: Option<&BearerToken>) -> BindOutcome {
        if let (Some(session), Some(token)) = (self.current.as_ref(), token) {
            if session.token() == token && session.is_live() {
                return BindOutcome::Unchanged(session.clone());
            }
        }

        if let Some(old) = self.current.take() {
            old.teardown();
        }

        match token {
            Some(token) => {
                self.generations += 1;
                let session = SyncSession::new(token.clone(), self.generations);
                self.current = Some(session.clone());
                BindOutcome::Rebound(session)
            }
            None => BindOutcome::Cleared,
        }
    }

    /// The live session, if any
    pub fn current(&self) -> Option<&SyncSession> {
        self.current.as_ref()
    }

    /// Destroy the current session (screen deactivated)
    pub fn unbind(&mut self) {
        if let Some(old) = self.current.take() {
            old.teardown();
        }
    }
}
