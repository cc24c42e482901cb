use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState<S>>`.
///
/// Generic over the attendance store so the same router runs against
/// PostgreSQL in production and the in-memory store in tests. Cheaply
/// cloneable.
#[derive(Clone)]
pub struct AppState<S> {
    /// Attendance record store.
    pub store: S,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
