//! Engine components
//!
//! The six pieces of the sync engine, leaves first:
//!
//! - [`fetch_task`] - cancellable, deadline-bounded remote calls
//! - [`single_flight`] - one outstanding fetch per resource class
//! - [`session`] - identity binding and transitive teardown
//! - [`loader`] - staged critical/secondary loading and scoped refresh
//! - [`poll`] - fixed-period background refresh
//! - [`mutation`] - one-shot state-changing calls with scoped follow-up
//! - [`engine`] - per-screen composition of the above

pub mod engine;
pub mod fetch_task;
pub mod loader;
pub mod mutation;
pub mod poll;
pub mod session;
pub mod single_flight;

pub use engine::SyncEngine;
pub use fetch_task::{FetchTask, ResourceClass};
pub use loader::{
    merge_fn, FetchContext, FetchPlan, RefreshKind, RefreshOutcome, RefreshScope, StagedLoader,
    StateMerge,
};
pub use mutation::{MutationCoordinator, MutationSpec};
pub use poll::{PollPhase, PollSchedule, PollScheduler};
pub use session::{BindOutcome, SessionBinding, SyncSession};
pub use single_flight::{EntryMode, FlightPermit, SingleFlightGuard};
