use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use folio_db::repositories::TagRepo;
use serde::Serialize;

use crate::state::AppState;

/// Readiness report for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `migrations_pending` or `database_unreachable`.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub database: DatabaseHealth,
    /// Trending decay half-life the engine is running with.
    pub trending_half_life_days: f64,
}

#[derive(Debug, Default, Serialize)]
pub struct DatabaseHealth {
    pub reachable: bool,
    /// Embedded migrations not yet applied; `None` when unknown.
    pub pending_migrations: Option<usize>,
    /// Rows in `tag_stats`; `None` when the table could not be read.
    pub tracked_tags: Option<i64>,
}

impl DatabaseHealth {
    async fn check(pool: &folio_db::DbPool) -> Self {
        if let Err(e) = folio_db::health_check(pool).await {
            tracing::warn!(error = %e, "Database unreachable");
            return Self::default();
        }

        let pending_migrations = folio_db::pending_migrations(pool)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Could not read migration state"))
            .ok();
        let tracked_tags = TagRepo::count_tracked(pool)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Could not read tag_stats"))
            .ok();

        Self {
            reachable: true,
            pending_migrations,
            tracked_tags,
        }
    }

    /// Writes need the current schema and a readable `tag_stats`.
    fn status(&self) -> &'static str {
        if !self.reachable {
            "database_unreachable"
        } else if self.pending_migrations == Some(0) && self.tracked_tags.is_some() {
            "ok"
        } else {
            "migrations_pending"
        }
    }
}

/// GET /health -- 200 when the service can take writes, 503 otherwise.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = DatabaseHealth::check(&state.pool).await;
    let status = database.status();
    let code = if status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        database,
        trending_half_life_days: state.engine.config().trending_half_life_days,
    };
    (code, Json(body))
}

/// Mount the readiness route (root level, outside `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_requires_reachable_current_schema() {
        assert_eq!(DatabaseHealth::default().status(), "database_unreachable");

        let mut db = DatabaseHealth {
            reachable: true,
            pending_migrations: Some(0),
            tracked_tags: Some(3),
        };
        assert_eq!(db.status(), "ok");

        db.pending_migrations = Some(1);
        assert_eq!(db.status(), "migrations_pending");

        db.pending_migrations = Some(0);
        db.tracked_tags = None;
        assert_eq!(db.status(), "migrations_pending");
    }
}
