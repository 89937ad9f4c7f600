//! Background refresh scheduling
//!
//! One `PollScheduler` exists per session. It stays `Idle` until the initial
//! load settles, waits out the startup delay (`ArmedWaiting`), then ticks at
//! a fixed period (`Ticking`) until torn down. With the production defaults
//! (5 s settle delay, 15 s period) the first refresh lands at t=20 s after
//! initial-load completion, then 35 s, 50 s, ...
//!
//! A tick whose refresh is still running when the next period elapses is
//! dropped, not queued; the single-flight guard additionally drops ticks that
//! collide with a manual refresh.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;

/// Timer definition for one session's background refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Time after initial load before the poll loop is scheduled
    pub startup_delay: Duration,
    /// Fixed inter-tick interval
    pub period: Duration,
}

impl From<&SyncConfig> for PollSchedule {
    fn from(config: &SyncConfig) -> Self {
        PollSchedule {
            startup_delay: config.startup_delay,
            period: config.poll_period,
        }
    }
}

/// Lifecycle of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// No timers registered
    Idle,
    /// Startup delay running, no tick issued yet
    ArmedWaiting,
    /// Recurring timer live
    Ticking,
}

struct SchedulerInner {
    phase: Mutex<PollPhase>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl SchedulerInner {
    fn set_phase(&self, phase: PollPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }
}

/// Fixed-period background refresh driver for one session
#[derive(Clone)]
pub struct PollScheduler {
    inner: Arc<SchedulerInner>,
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PollScheduler {
    pub fn new() -> Self {
        PollScheduler {
            inner: Arc::new(SchedulerInner {
                phase: Mutex::new(PollPhase::Idle),
                cancel: Mutex::new(None),
            }),
        }
    }

    pub fn phase(&self) -> PollPhase {
        *self
            .inner
            .phase
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the startup-delay timer, then tick at the schedule's period
    ///
    /// Must only be called once the initial load has settled; the loader owns
    /// that ordering. Arming an already-armed scheduler is a no-op, so a
    /// spurious second settle path cannot double the tick rate.
    ///
    /// `parent` is the session's root cancellation handle: tearing down the
    /// session kills both timers transitively.
    pub fn arm<F, Fut>(&self, parent: &CancellationToken, schedule: PollSchedule, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        {
            let mut phase = self
                .inner
                .phase
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *phase != PollPhase::Idle {
                return;
            }
            *phase = PollPhase::ArmedWaiting;
        }

        let cancel = parent.child_token();
        *self
            .inner
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(cancel.clone());

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    inner.set_phase(PollPhase::Idle);
                    return;
                }
                _ = tokio::time::sleep(schedule.startup_delay) => {}
            }

            inner.set_phase(PollPhase::Ticking);
            // First tick fires one full period after the delay elapses.
            let mut ticker = interval_at(Instant::now() + schedule.period, schedule.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => tick().await,
                }
            }
            inner.set_phase(PollPhase::Idle);
        });
    }

    /// Cancel the startup timer and the recurring timer
    ///
    /// Idempotent; invoked whenever the owning session is destroyed.
    pub fn teardown(&self) {
        if let Some(cancel) = self
            .inner
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            cancel.cancel();
        }
        self.inner.set_phase(PollPhase::Idle);
    }
}
