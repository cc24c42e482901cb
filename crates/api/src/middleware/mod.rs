//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated staff user from a JWT Bearer token.

pub mod auth;
