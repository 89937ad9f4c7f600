//! Engine configuration
//!
//! Timing knobs for polling and request deadlines. The defaults mirror the
//! production deployment (5 s settle delay, 15 s poll period, 30 s request
//! timeout) but every screen may be constructed with its own values.

use std::time::Duration;

/// Configuration for one screen's sync engine
///
/// Controls when the background poll starts, how often it ticks, and the
/// deadline applied to every remote call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Time after initial-load completion before the poll loop is scheduled
    pub startup_delay: Duration,
    /// Fixed interval between poll ticks
    pub poll_period: Duration,
    /// Deadline applied to every individual remote call
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            startup_delay: Duration::from_millis(5_000),
            poll_period: Duration::from_millis(15_000),
            request_timeout: Duration::from_millis(30_000),
        }
    }
}

impl SyncConfig {
    /// Create a SyncConfig with custom values
    ///
    /// Zero durations are rejected and replaced with the defaults: a zero
    /// poll period would spin the event loop, a zero timeout would fail every
    /// request before it left the socket.
    pub fn new(startup_delay: Duration, poll_period: Duration, request_timeout: Duration) -> Self {
        let default = Self::default();

        let poll_period = if poll_period.is_zero() {
            tracing::warn!(
                fallback_ms = default.poll_period.as_millis() as u64,
                "invalid poll_period (zero), using default"
            );
            default.poll_period
        } else {
            poll_period
        };

        let request_timeout = if request_timeout.is_zero() {
            tracing::warn!(
                fallback_ms = default.request_timeout.as_millis() as u64,
                "invalid request_timeout (zero), using default"
            );
            default.request_timeout
        } else {
            request_timeout
        };

        // A zero startup delay is legal: it just means the first tick is
        // scheduled one period after initial load.
        SyncConfig {
            startup_delay,
            poll_period,
            request_timeout,
        }
    }
}
