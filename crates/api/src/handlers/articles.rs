//! Handlers for the `/articles` resource.
//!
//! Writes go through the versioning engine so tag statistics move in the
//! same transaction; reads query the repositories directly.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use folio_core::article::{CreateArticle, CreateArticleVersion, CreatedVersion, Version};
use folio_core::error::CoreError;
use folio_core::versioning::{DeletedArticle, TransitionOutcome};
use folio_db::models::article::{ArticleLatestDetail, ArticleListParams};
use folio_db::repositories::{ArticleRepo, VersionRepo};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdminOrWriter, RequireWriter};
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

/// Request body for `PATCH /articles/{serial}/versions/{version_serial}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// POST /api/v1/articles
pub async fn create_article(
    State(state): State<AppState>,
    RequireWriter(user): RequireWriter,
    Json(input): Json<CreateArticle>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedVersion>>)> {
    let created = state.engine.create_article(&user.username, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// POST /api/v1/articles/{serial}/versions
pub async fn create_article_version(
    State(state): State<AppState>,
    RequireWriter(user): RequireWriter,
    Path(article_serial): Path<String>,
    Json(input): Json<CreateArticleVersion>,
) -> AppResult<(StatusCode, Json<DataResponse<CreatedVersion>>)> {
    let created = state
        .engine
        .create_article_version(&user.username, &article_serial, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// PATCH /api/v1/articles/{serial}/versions/{version_serial}/status
pub async fn update_version_status(
    State(state): State<AppState>,
    RequireAdminOrWriter(user): RequireAdminOrWriter,
    Path((article_serial, version_serial)): Path<(String, String)>,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<Json<DataResponse<TransitionOutcome>>> {
    let outcome = state
        .engine
        .transition_version_status(&article_serial, &version_serial, &input.status)
        .await?;
    tracing::info!(
        username = %user.username,
        %article_serial,
        %version_serial,
        ?outcome,
        "Version status transition"
    );
    Ok(Json(DataResponse { data: outcome }))
}

/// DELETE /api/v1/articles/{serial}
pub async fn delete_article(
    State(state): State<AppState>,
    RequireAdminOrWriter(user): RequireAdminOrWriter,
    Path(article_serial): Path<String>,
) -> AppResult<Json<DataResponse<DeletedArticle>>> {
    let deleted = state.engine.delete_article(&article_serial).await?;
    tracing::info!(
        username = %user.username,
        %article_serial,
        deleted_versions = deleted.deleted_versions,
        "Article deleted"
    );
    Ok(Json(DataResponse { data: deleted }))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/articles
///
/// Editors (and any non-admin, non-writer role) only see published versions.
pub async fn list_articles(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ArticleListParams>,
) -> AppResult<Json<PaginatedResponse<Version>>> {
    let query = params.resolve(&user.role)?;
    let (versions, total) = VersionRepo::list(&state.pool, &query).await?;
    Ok(Json(PaginatedResponse {
        data: versions,
        pagination: query.page.paginate(total),
    }))
}

/// GET /api/v1/articles/{serial}/latest-details
pub async fn get_latest_details(
    State(state): State<AppState>,
    RequireAdminOrWriter(_user): RequireAdminOrWriter,
    Path(article_serial): Path<String>,
) -> AppResult<Json<DataResponse<ArticleLatestDetail>>> {
    ensure_article_exists(&state, &article_serial).await?;
    let detail = VersionRepo::latest_detail(&state.pool, &article_serial).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// GET /api/v1/articles/{serial}/versions
pub async fn list_versions(
    State(state): State<AppState>,
    RequireAdminOrWriter(_user): RequireAdminOrWriter,
    Path(article_serial): Path<String>,
) -> AppResult<Json<DataResponse<Vec<Version>>>> {
    ensure_article_exists(&state, &article_serial).await?;
    let versions = VersionRepo::list_by_article(&state.pool, &article_serial).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// GET /api/v1/articles/versions/{version_serial}
pub async fn get_version(
    State(state): State<AppState>,
    RequireAdminOrWriter(_user): RequireAdminOrWriter,
    Path(version_serial): Path<String>,
) -> AppResult<Json<DataResponse<Version>>> {
    let version = VersionRepo::find_by_serial(&state.pool, &version_serial)
        .await?
        .ok_or_else(|| CoreError::not_found("Version", version_serial))?;
    Ok(Json(DataResponse { data: version }))
}

/// Soft-deleted articles are reported as missing.
async fn ensure_article_exists(state: &AppState, article_serial: &str) -> AppResult<()> {
    ArticleRepo::find_by_serial(&state.pool, article_serial)
        .await?
        .ok_or_else(|| CoreError::not_found("Article", article_serial))?;
    Ok(())
}
