//! Pure attendance domain logic.
//!
//! Nothing in this crate touches storage or HTTP. The db crate persists the
//! records these functions reason about, and the api crate orchestrates them
//! per request.

pub mod actions;
pub mod alerts;
pub mod classes;
pub mod clock;
pub mod error;
pub mod presence;
pub mod qr_signature;
pub mod schedule;
pub mod types;
