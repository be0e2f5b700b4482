//! Handlers for the `/tags` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use folio_core::error::CoreError;
use folio_core::pagination::PageRequest;
use folio_core::refresh::TrendingRefreshSummary;
use folio_core::tag::{CreateTag, Tag};
use folio_db::models::tag::{TagListParams, TagWithStats};
use folio_db::repositories::TagRepo;

use crate::error::AppResult;
use crate::middleware::rbac::{RequireAdmin, RequireAdminOrWriter};
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

/// POST /api/v1/tags
pub async fn create_tag(
    State(state): State<AppState>,
    RequireAdminOrWriter(_user): RequireAdminOrWriter,
    Json(input): Json<CreateTag>,
) -> AppResult<(StatusCode, Json<DataResponse<Tag>>)> {
    let tag = state.engine.create_tag(&input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: tag })))
}

/// GET /api/v1/tags
pub async fn list_tags(
    State(state): State<AppState>,
    RequireAdminOrWriter(_user): RequireAdminOrWriter,
    Query(params): Query<TagListParams>,
) -> AppResult<Json<PaginatedResponse<TagWithStats>>> {
    let page = PageRequest::new(params.page, params.page_size);
    let (tags, total) = TagRepo::list(&state.pool, page).await?;
    Ok(Json(PaginatedResponse {
        data: tags,
        pagination: page.paginate(total),
    }))
}

/// GET /api/v1/tags/{serial}
pub async fn get_tag(
    State(state): State<AppState>,
    RequireAdminOrWriter(_user): RequireAdminOrWriter,
    Path(serial): Path<String>,
) -> AppResult<Json<DataResponse<TagWithStats>>> {
    let tag = TagRepo::find_by_serial(&state.pool, &serial)
        .await?
        .ok_or_else(|| CoreError::not_found("Tag", serial))?;
    Ok(Json(DataResponse { data: tag }))
}

/// PUT /api/v1/tags/trending-score
///
/// Manual trigger for the batch trending refresh the worker runs on a timer.
pub async fn refresh_trending_scores(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
) -> AppResult<Json<DataResponse<TrendingRefreshSummary>>> {
    let summary = state.engine.refresh_all_trending_scores().await?;
    tracing::info!(
        username = %user.username,
        pages = summary.pages,
        tags_updated = summary.tags_updated,
        "Trending scores refreshed"
    );
    Ok(Json(DataResponse { data: summary }))
}
