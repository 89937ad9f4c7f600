//! Wallet Sync Engine Library
//! # Overview
//!
//! This library provides the client-side data-synchronization engine behind a
//! thin client over a remote wallet/fraud-review API: staged loading,
//! single-flight fetch admission, session-scoped cancellation, fixed-period
//! background refresh, and scoped post-mutation refresh.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (records, shared state, error taxonomy)
//! - [`config`] - Timing configuration (poll schedule, request deadline)
//! - [`api`] - Backend boundary (client traits + reqwest implementation)
//! - [`core`] - Engine components:
//!   - [`core::fetch_task`] - Cancellable, deadline-bounded remote calls
//!   - [`core::single_flight`] - One outstanding fetch per resource class
//!   - [`core::session`] - Identity binding and transitive teardown
//!   - [`core::loader`] - Staged critical/secondary loading, scoped refresh
//!   - [`core::poll`] - Fixed-period background refresh
//!   - [`core::mutation`] - One-shot state-changing calls
//!   - [`core::engine`] - Per-screen composition
//! - [`screens`] - Wallet and admin controllers with their fetch plans
//! - [`cli`] - CLI argument parsing for the watch harness
//!
//! # Lifecycle
//!
//! A screen activates with an identity token; the session binding creates a
//! session and the staged loader runs the **critical** fetch group (the
//! minimum data for a usable screen). When it settles, the loading flag
//! resolves, the **secondary** group loads in the background, and the poll
//! scheduler arms: after a settle delay it re-fetches the poll scope at a
//! fixed period. User actions submit mutations that trigger the narrowest
//! affected refresh. Rebinding with a different token cancels everything the
//! old session owned; late responses are discarded before they can touch
//! state.
//!
//! # Guarantees
//!
//! - At most one outstanding fetch per `(session, resource class)`; redundant
//!   non-forced requests are skipped, forced requests supersede.
//! - The critical group settles strictly before the secondary group starts;
//!   the first poll tick lands strictly after initial-load completion.
//! - A session's work cannot outlive it observably: teardown cancels tasks
//!   and timers transitively, and merges are gated on session liveness.

// Module declarations
pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod screens;
pub mod types;

pub use crate::core::{
    BindOutcome, FetchPlan, MutationSpec, PollPhase, RefreshKind, RefreshOutcome, RefreshScope,
    ResourceClass, SyncEngine,
};
pub use api::{AdminApi, HttpBackend, TransferRequest, WalletApi};
pub use config::SyncConfig;
pub use screens::{AdminScreen, AdminState, WalletScreen, WalletState};
pub use types::{
    BearerToken, MutationOutcome, SharedState, StateSnapshot, StatusFlags, SyncError, SyncResult,
};
