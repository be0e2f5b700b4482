pub mod articles;
pub mod health;
pub mod tags;
pub mod users;

use axum::routing::put;
use axum::Router;

use crate::handlers::tags as tag_handlers;
use crate::state::AppState;

/// Build the interactive `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /users/register                                  register (public)
/// /users/login                                     login (public)
///
/// /articles                                        list (any role), create (writer)
/// /articles/{serial}                               delete (admin, writer)
/// /articles/{serial}/versions                      list, create (writer)
/// /articles/{serial}/versions/{version}/status     transition (admin, writer)
/// /articles/{serial}/latest-details                published + latest version
/// /articles/versions/{version_serial}              get version
///
/// /tags                                            list, create (admin, writer)
/// /tags/{serial}                                   get (admin, writer)
/// ```
///
/// The trending refresh lives in [`maintenance_routes`] so it can run under
/// its own timeout.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/articles", articles::router())
        .nest("/tags", tags::router())
}

/// Long-running admin operations, mounted beside [`api_routes`].
///
/// ```text
/// /tags/trending-score                             refresh all scores (admin, PUT)
/// ```
pub fn maintenance_routes() -> Router<AppState> {
    Router::new().route(
        "/tags/trending-score",
        put(tag_handlers::refresh_trending_scores),
    )
}
