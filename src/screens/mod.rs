//! Screen controllers
//!
//! Each screen pairs a [`FetchPlan`](crate::core::FetchPlan) (which remote
//! calls make up each scope, and how results merge) with a
//! [`SyncEngine`](crate::core::SyncEngine) and exposes the handful of domain
//! methods the view layer calls.

pub mod admin;
pub mod wallet;

pub use admin::{AdminPlan, AdminScreen, AdminState};
pub use wallet::{WalletPlan, WalletScreen, WalletState};
