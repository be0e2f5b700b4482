//! Article and version rows, plus the article listing query DTOs.

use std::str::FromStr;

use folio_core::article::{Article, Version};
use folio_core::error::CoreError;
use folio_core::pagination::PageRequest;
use folio_core::roles::can_view_unpublished;
use folio_core::status::VersionStatus;
use folio_core::types::{Serial, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity rows
// ---------------------------------------------------------------------------

/// A row from the `articles` table.
#[derive(Debug, Clone, FromRow)]
pub struct ArticleRow {
    pub serial: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            serial: row.serial,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// A row from `versions` with its tag serials aggregated from `version_tags`.
#[derive(Debug, Clone, FromRow)]
pub struct VersionRow {
    pub serial: String,
    pub article_serial: String,
    pub version_number: i32,
    pub author_username: String,
    pub title: String,
    pub content: String,
    pub status: String,
    pub tag_relationship_score: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub published_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    pub tag_serials: Vec<String>,
}

impl VersionRow {
    /// Convert to the domain type. An unknown status string surfaces as a
    /// decode error, the same as any other malformed column.
    pub fn into_version(self) -> Result<Version, sqlx::Error> {
        let status = VersionStatus::from_str(&self.status)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        Ok(Version {
            serial: self.serial,
            article_serial: self.article_serial,
            version_number: self.version_number,
            author_username: self.author_username,
            title: self.title,
            content: self.content,
            status,
            tag_serials: self.tag_serials,
            tag_relationship_score: self.tag_relationship_score,
            created_at: self.created_at,
            updated_at: self.updated_at,
            published_at: self.published_at,
            deleted_at: self.deleted_at,
        })
    }
}

/// The currently published version and the newest version of an article.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleLatestDetail {
    pub article_serial: Serial,
    pub published_version: Option<Version>,
    pub latest_version: Option<Version>,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Sortable columns for article listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    TagRelationshipScore,
}

impl VersionSort {
    /// Column name on the `versions` table. Only whitelisted values reach SQL.
    pub fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::PublishedAt => "published_at",
            Self::TagRelationshipScore => "tag_relationship_score",
        }
    }
}

impl FromStr for VersionSort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(Self::CreatedAt),
            "updated_at" => Ok(Self::UpdatedAt),
            "published_at" => Ok(Self::PublishedAt),
            "tag_relationship_score" => Ok(Self::TagRelationshipScore),
            other => Err(CoreError::Validation(format!(
                "sort_by must be one of created_at, updated_at, published_at, \
                 tag_relationship_score; got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(CoreError::Validation(format!(
                "sort_type must be asc or desc; got '{s}'"
            ))),
        }
    }
}

/// Raw query parameters for `GET /articles`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleListParams {
    pub status: Option<String>,
    pub author_username: Option<String>,
    pub tag_serial: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
}

/// Validated listing query.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleListQuery {
    pub status: VersionStatus,
    pub author_username: Option<String>,
    pub tag_serial: Option<String>,
    pub sort: VersionSort,
    pub direction: SortDirection,
    pub page: PageRequest,
}

impl ArticleListParams {
    /// Validate the parameters for a caller with `role`.
    ///
    /// Status defaults to published; callers who cannot view unpublished
    /// versions are pinned to published whatever they ask for.
    pub fn resolve(self, role: &str) -> Result<ArticleListQuery, CoreError> {
        let requested = match non_blank(self.status) {
            Some(raw) => raw.parse()?,
            None => VersionStatus::Published,
        };
        let status = if can_view_unpublished(role) {
            requested
        } else {
            VersionStatus::Published
        };

        Ok(ArticleListQuery {
            status,
            author_username: non_blank(self.author_username),
            tag_serial: non_blank(self.tag_serial),
            sort: non_blank(self.sort_by)
                .map(|raw| raw.parse())
                .transpose()?
                .unwrap_or_default(),
            direction: non_blank(self.sort_type)
                .map(|raw| raw.parse())
                .transpose()?
                .unwrap_or_default(),
            page: PageRequest::new(self.page, self.page_size),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn defaults_to_published_newest_first() {
        let query = ArticleListParams::default().resolve("writer").unwrap();
        assert_eq!(query.status, VersionStatus::Published);
        assert_eq!(query.sort, VersionSort::CreatedAt);
        assert_eq!(query.direction, SortDirection::Desc);
        assert_eq!(query.page, PageRequest::default());
    }

    #[test]
    fn editors_only_see_published() {
        let params = ArticleListParams {
            status: Some("draft".into()),
            ..Default::default()
        };
        assert_eq!(params.clone().resolve("editor").unwrap().status, VersionStatus::Published);
        assert_eq!(params.resolve("admin").unwrap().status, VersionStatus::Draft);
    }

    #[test]
    fn rejects_unknown_sort_values() {
        let bad_column = ArticleListParams {
            sort_by: Some("title; DROP TABLE versions".into()),
            ..Default::default()
        };
        assert_matches!(bad_column.resolve("admin"), Err(CoreError::Validation(_)));

        let bad_direction = ArticleListParams {
            sort_type: Some("sideways".into()),
            ..Default::default()
        };
        assert_matches!(bad_direction.resolve("admin"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn blank_filters_are_ignored() {
        let params = ArticleListParams {
            author_username: Some("  ".into()),
            tag_serial: Some("TAG1".into()),
            sort_by: Some("tag_relationship_score".into()),
            sort_type: Some("ASC".into()),
            ..Default::default()
        };
        let query = params.resolve("writer").unwrap();
        assert_eq!(query.author_username, None);
        assert_eq!(query.tag_serial.as_deref(), Some("TAG1"));
        assert_eq!(query.sort, VersionSort::TagRelationshipScore);
        assert_eq!(query.direction, SortDirection::Asc);
    }
}
