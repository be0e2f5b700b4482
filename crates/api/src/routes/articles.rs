use axum::routing::{delete, get, patch};
use axum::Router;

use crate::handlers::articles;
use crate::state::AppState;

/// Routes mounted at `/articles`.
///
/// ```text
/// GET    /                                         -> list_articles
/// POST   /                                         -> create_article
/// DELETE /{serial}                                 -> delete_article
/// GET    /{serial}/versions                        -> list_versions
/// POST   /{serial}/versions                        -> create_article_version
/// PATCH  /{serial}/versions/{version_serial}/status -> update_version_status
/// GET    /{serial}/latest-details                  -> get_latest_details
/// GET    /versions/{version_serial}                -> get_version
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(articles::list_articles).post(articles::create_article),
        )
        .route("/{serial}", delete(articles::delete_article))
        .route(
            "/{serial}/versions",
            get(articles::list_versions).post(articles::create_article_version),
        )
        .route(
            "/{serial}/versions/{version_serial}/status",
            patch(articles::update_version_status),
        )
        .route(
            "/{serial}/latest-details",
            get(articles::get_latest_details),
        )
        .route("/versions/{version_serial}", get(articles::get_version))
}
