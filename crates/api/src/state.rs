use std::sync::Arc;

use civic_storage::ObjectStorage;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: every field is a pool handle or an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: civic_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Object storage for complaint image variants.
    pub storage: Arc<dyn ObjectStorage>,
}
