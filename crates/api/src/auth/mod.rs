//! Session token primitives.
//!
//! Sessions are issued elsewhere; this service only validates them.
//! [`jwt::generate_access_token`] exists for tooling and tests.

pub mod jwt;
