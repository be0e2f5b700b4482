//! Repository for the `tag_stats` and `tag_pair_stats` tables.
//!
//! Usage counters are only changed with single `UPDATE ... ± 1` statements
//! so concurrent writers never lose an update. Rows are always locked in
//! tag-serial order to keep lock acquisition deadlock-free.

use folio_core::pagination::{PageRequest, Pagination};
use folio_core::tag::{canonical_pair, TagPairStat, TagStat};
use folio_core::types::Serial;

use super::PgTx;
use crate::models::tag::{TagPairStatRow, TagStatRow};

/// Column list shared across `tag_stats` queries.
const COLUMNS: &str = "tag_serial, usage_count, trending_score, \
                       usage_count_updated_at, trending_score_updated_at";

/// Provides counter updates and reads for tag statistics.
pub struct TagStatRepo;

impl TagStatRepo {
    // -----------------------------------------------------------------------
    // Tag stats
    // -----------------------------------------------------------------------

    /// Read and lock the stat rows for `serials`.
    pub async fn lock_by_serials(
        tx: &mut PgTx<'_>,
        serials: &[Serial],
    ) -> Result<Vec<TagStat>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tag_stats WHERE tag_serial = ANY($1) \
             ORDER BY tag_serial FOR UPDATE"
        );
        let rows = sqlx::query_as::<_, TagStatRow>(&query)
            .bind(serials)
            .fetch_all(&mut **tx)
            .await?;
        Ok(rows.into_iter().map(TagStat::from).collect())
    }

    pub async fn find_by_serials(
        tx: &mut PgTx<'_>,
        serials: &[Serial],
    ) -> Result<Vec<TagStat>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tag_stats WHERE tag_serial = ANY($1) ORDER BY tag_serial"
        );
        let rows = sqlx::query_as::<_, TagStatRow>(&query)
            .bind(serials)
            .fetch_all(&mut **tx)
            .await?;
        Ok(rows.into_iter().map(TagStat::from).collect())
    }

    pub async fn increment_usage(tx: &mut PgTx<'_>, serials: &[Serial]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tag_stats SET usage_count = usage_count + 1, usage_count_updated_at = NOW() \
             WHERE tag_serial = ANY($1)",
        )
        .bind(serials)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Decrement usage counts, flooring at zero.
    pub async fn decrement_usage(tx: &mut PgTx<'_>, serials: &[Serial]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tag_stats SET \
                usage_count = GREATEST(usage_count - 1, 0), \
                usage_count_updated_at = NOW() \
             WHERE tag_serial = ANY($1)",
        )
        .bind(serials)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Returns `true` if the stat row exists.
    pub async fn update_trending_score(
        tx: &mut PgTx<'_>,
        serial: &str,
        trending_score: f64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tag_stats SET trending_score = $2, trending_score_updated_at = NOW() \
             WHERE tag_serial = $1",
        )
        .bind(serial)
        .bind(trending_score)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// One locked page of stat rows in tag-serial order.
    pub async fn page(
        tx: &mut PgTx<'_>,
        page: PageRequest,
    ) -> Result<(Vec<TagStat>, Pagination), sqlx::Error> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tag_stats")
            .fetch_one(&mut **tx)
            .await?;

        let query = format!(
            "SELECT {COLUMNS} FROM tag_stats ORDER BY tag_serial LIMIT $1 OFFSET $2 FOR UPDATE"
        );
        let rows = sqlx::query_as::<_, TagStatRow>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await?;

        Ok((rows.into_iter().map(TagStat::from).collect(), page.paginate(total)))
    }

    // -----------------------------------------------------------------------
    // Tag pair stats
    // -----------------------------------------------------------------------

    /// Add one co-occurrence for the pair, creating the row on first use.
    pub async fn increment_pair(tx: &mut PgTx<'_>, tag1: &str, tag2: &str) -> Result<(), sqlx::Error> {
        let (first, second) = canonical_pair(tag1, tag2);
        sqlx::query(
            "INSERT INTO tag_pair_stats (tag1_serial, tag2_serial, usage_count) VALUES ($1, $2, 1) \
             ON CONFLICT (tag1_serial, tag2_serial) \
             DO UPDATE SET usage_count = tag_pair_stats.usage_count + 1",
        )
        .bind(first)
        .bind(second)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Pair rows whose both members are in `serials`.
    pub async fn pairs_by_serials(
        tx: &mut PgTx<'_>,
        serials: &[Serial],
    ) -> Result<Vec<TagPairStat>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TagPairStatRow>(
            "SELECT tag1_serial, tag2_serial, usage_count FROM tag_pair_stats \
             WHERE tag1_serial = ANY($1) AND tag2_serial = ANY($1)",
        )
        .bind(serials)
        .fetch_all(&mut **tx)
        .await?;
        Ok(rows.into_iter().map(TagPairStat::from).collect())
    }
}
