//! Backend API boundary
//!
//! The engine talks to the REST backend only through the [`WalletApi`] and
//! [`AdminApi`] traits; the sole production implementation is the reqwest
//! [`HttpBackend`]. Tests substitute scripted in-process implementations.

pub mod http;
pub mod traits;

pub use http::HttpBackend;
pub use traits::{AdminApi, TransferRequest, WalletApi};
