//! Tag, tag stat and tag-pair stat rows.

use folio_core::tag::{Tag, TagPairStat, TagStat};
use folio_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tags` table.
#[derive(Debug, Clone, FromRow)]
pub struct TagRow {
    pub serial: String,
    pub name: String,
    pub created_at: Timestamp,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            serial: row.serial,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// A tag joined with its statistics, as returned by the tag endpoints.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TagWithStats {
    pub serial: String,
    pub name: String,
    pub usage_count: i64,
    pub trending_score: f64,
    pub created_at: Timestamp,
}

/// Query parameters for `GET /tags`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// A row from the `tag_stats` table.
#[derive(Debug, Clone, FromRow)]
pub struct TagStatRow {
    pub tag_serial: String,
    pub usage_count: i64,
    pub trending_score: f64,
    pub usage_count_updated_at: Timestamp,
    pub trending_score_updated_at: Timestamp,
}

impl From<TagStatRow> for TagStat {
    fn from(row: TagStatRow) -> Self {
        TagStat {
            tag_serial: row.tag_serial,
            usage_count: row.usage_count,
            trending_score: row.trending_score,
            usage_count_updated_at: row.usage_count_updated_at,
            trending_score_updated_at: row.trending_score_updated_at,
        }
    }
}

/// A row from the `tag_pair_stats` table.
#[derive(Debug, Clone, FromRow)]
pub struct TagPairStatRow {
    pub tag1_serial: String,
    pub tag2_serial: String,
    pub usage_count: i64,
}

impl From<TagPairStatRow> for TagPairStat {
    fn from(row: TagPairStatRow) -> Self {
        TagPairStat {
            tag1_serial: row.tag1_serial,
            tag2_serial: row.tag2_serial,
            usage_count: row.usage_count,
        }
    }
}
