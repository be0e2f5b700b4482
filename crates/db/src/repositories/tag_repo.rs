//! Repository for the `tags` table.
//!
//! Tags are always created together with their `tag_stats` row so every tag
//! has statistics from the start.

use folio_core::pagination::PageRequest;
use folio_core::tag::Tag;
use folio_core::types::Serial;
use sqlx::PgPool;

use super::PgTx;
use crate::models::tag::{TagRow, TagWithStats};

/// Column list for `tags` joined with `tag_stats`.
const WITH_STATS_COLUMNS: &str = "\
    t.serial, t.name, s.usage_count, s.trending_score, t.created_at";

/// Provides tag creation and lookups.
pub struct TagRepo;

impl TagRepo {
    /// Insert a tag and its zeroed stat row.
    ///
    /// A duplicate name fails with a unique violation on `uq_tags_name`.
    pub async fn create(tx: &mut PgTx<'_>, tag: &Tag) -> Result<Tag, sqlx::Error> {
        let row = sqlx::query_as::<_, TagRow>(
            "INSERT INTO tags (serial, name, created_at) VALUES ($1, $2, $3) \
             RETURNING serial, name, created_at",
        )
        .bind(&tag.serial)
        .bind(&tag.name)
        .bind(tag.created_at)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            "INSERT INTO tag_stats \
                (tag_serial, usage_count, trending_score, usage_count_updated_at, trending_score_updated_at) \
             VALUES ($1, 0, 0, $2, $2)",
        )
        .bind(&row.serial)
        .bind(row.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(row.into())
    }

    /// The subset of `serials` that name existing tags.
    pub async fn existing_serials(
        tx: &mut PgTx<'_>,
        serials: &[Serial],
    ) -> Result<Vec<Serial>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT serial FROM tags WHERE serial = ANY($1)")
            .bind(serials)
            .fetch_all(&mut **tx)
            .await
    }

    /// Find a tag with its statistics.
    pub async fn find_by_serial(
        pool: &PgPool,
        serial: &str,
    ) -> Result<Option<TagWithStats>, sqlx::Error> {
        let query = format!(
            "SELECT {WITH_STATS_COLUMNS} FROM tags t \
             JOIN tag_stats s ON s.tag_serial = t.serial \
             WHERE t.serial = $1"
        );
        sqlx::query_as::<_, TagWithStats>(&query)
            .bind(serial)
            .fetch_optional(pool)
            .await
    }

    /// Number of tags carrying a statistics row.
    pub async fn count_tracked(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tag_stats")
            .fetch_one(pool)
            .await
    }

    /// One page of tags with statistics, newest first, plus the total count.
    pub async fn list(
        pool: &PgPool,
        page: PageRequest,
    ) -> Result<(Vec<TagWithStats>, i64), sqlx::Error> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tags")
            .fetch_one(pool)
            .await?;

        let query = format!(
            "SELECT {WITH_STATS_COLUMNS} FROM tags t \
             JOIN tag_stats s ON s.tag_serial = t.serial \
             ORDER BY t.created_at DESC, t.serial \
             LIMIT $1 OFFSET $2"
        );
        let tags = sqlx::query_as::<_, TagWithStats>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((tags, total))
    }
}
