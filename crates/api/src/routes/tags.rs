use axum::routing::get;
use axum::Router;

use crate::handlers::tags;
use crate::state::AppState;

/// Routes mounted at `/tags`.
///
/// ```text
/// GET  /                -> list_tags
/// POST /                -> create_tag
/// GET  /{serial}        -> get_tag
/// ```
///
/// `PUT /trending-score` is mounted by
/// [`maintenance_routes`](super::maintenance_routes).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tags::list_tags).post(tags::create_tag))
        .route("/{serial}", get(tags::get_tag))
}
