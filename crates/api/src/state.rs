use std::sync::Arc;

use folio_core::error::CoreError;
use folio_core::versioning::VersioningEngine;
use folio_db::PgStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is a pool handle or behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used directly by read-only handlers.
    pub pool: folio_db::DbPool,
    /// Server configuration (JWT settings are read by the auth extractor).
    pub config: Arc<ServerConfig>,
    /// Engine for every write that touches tag statistics.
    pub engine: Arc<VersioningEngine<PgStore>>,
}

impl AppState {
    /// Fails when the tag statistics section of `config` is invalid.
    pub fn new(pool: folio_db::DbPool, config: ServerConfig) -> Result<Self, CoreError> {
        let engine = VersioningEngine::new(PgStore::new(pool.clone()), config.tag_stats)?;
        Ok(Self {
            pool,
            config: Arc::new(config),
            engine: Arc::new(engine),
        })
    }
}
