//! Repository for the `versions` and `version_tags` tables.

use folio_core::article::{NewVersion, Version};
use folio_core::status::VersionStatus;
use folio_core::types::Serial;
use sqlx::PgPool;

use super::PgTx;
use crate::models::article::{ArticleLatestDetail, ArticleListQuery, VersionRow};

/// Column list for `RETURNING` clauses on `versions`.
const COLUMNS: &str = "serial, article_serial, version_number, author_username, title, content, \
                       status, tag_relationship_score, created_at, updated_at, published_at, deleted_at";

/// Select prefix for versions joined with their aggregated tag serials.
/// Every query using it must end with `GROUP BY v.serial`.
const SELECT_WITH_TAGS: &str = "\
    SELECT v.serial, v.article_serial, v.version_number, v.author_username, v.title, \
           v.content, v.status, v.tag_relationship_score, v.created_at, v.updated_at, \
           v.published_at, v.deleted_at, \
           COALESCE(ARRAY_AGG(vt.tag_serial ORDER BY vt.tag_serial) \
                    FILTER (WHERE vt.tag_serial IS NOT NULL), ARRAY[]::VARCHAR[]) AS tag_serials \
    FROM versions v \
    LEFT JOIN version_tags vt ON vt.version_serial = v.serial";

/// Shared filter for article listings; `$1` status, `$2` author, `$3` tag.
const LIST_FILTER: &str = "\
    JOIN articles a ON a.serial = v.article_serial \
    WHERE a.deleted_at IS NULL \
      AND v.status = $1 \
      AND ($2::VARCHAR IS NULL OR v.author_username = $2) \
      AND ($3::VARCHAR IS NULL OR EXISTS ( \
            SELECT 1 FROM version_tags f \
            WHERE f.version_serial = v.serial AND f.tag_serial = $3))";

/// Provides version CRUD, status changes and listing.
pub struct VersionRepo;

impl VersionRepo {
    // -----------------------------------------------------------------------
    // Writes (transactional)
    // -----------------------------------------------------------------------

    /// Insert a draft version. The returned version has no tags yet.
    pub async fn create(tx: &mut PgTx<'_>, input: &NewVersion) -> Result<Version, sqlx::Error> {
        let query = format!(
            "INSERT INTO versions \
                (serial, article_serial, version_number, author_username, title, content, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}, ARRAY[]::VARCHAR[] AS tag_serials"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(&input.serial)
            .bind(&input.article_serial)
            .bind(input.version_number)
            .bind(&input.author_username)
            .bind(&input.title)
            .bind(&input.content)
            .bind(VersionStatus::Draft.as_str())
            .fetch_one(&mut **tx)
            .await?
            .into_version()
    }

    /// Associate tags with a version. Existing associations are kept.
    pub async fn add_tags(
        tx: &mut PgTx<'_>,
        version_serial: &str,
        tag_serials: &[Serial],
    ) -> Result<(), sqlx::Error> {
        for tag_serial in tag_serials {
            sqlx::query(
                "INSERT INTO version_tags (version_serial, tag_serial) VALUES ($1, $2) \
                 ON CONFLICT (version_serial, tag_serial) DO NOTHING",
            )
            .bind(version_serial)
            .bind(tag_serial)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    /// Highest version number of an article, or `None` if it has no versions.
    pub async fn latest_version_number(
        tx: &mut PgTx<'_>,
        article_serial: &str,
    ) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(version_number) FROM versions WHERE article_serial = $1",
        )
        .bind(article_serial)
        .fetch_one(&mut **tx)
        .await
    }

    /// Find a version by serial inside a transaction.
    pub async fn find_by_serial_tx(
        tx: &mut PgTx<'_>,
        serial: &str,
    ) -> Result<Option<Version>, sqlx::Error> {
        let query = format!("{SELECT_WITH_TAGS} WHERE v.serial = $1 GROUP BY v.serial");
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(serial)
            .fetch_optional(&mut **tx)
            .await?
            .map(VersionRow::into_version)
            .transpose()
    }

    /// Versions of an article in the given status.
    pub async fn list_by_status_and_article(
        tx: &mut PgTx<'_>,
        article_serial: &str,
        status: VersionStatus,
    ) -> Result<Vec<Version>, sqlx::Error> {
        let query = format!(
            "{SELECT_WITH_TAGS} WHERE v.article_serial = $1 AND v.status = $2 \
             GROUP BY v.serial ORDER BY v.version_number"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(article_serial)
            .bind(status.as_str())
            .fetch_all(&mut **tx)
            .await?
            .into_iter()
            .map(VersionRow::into_version)
            .collect()
    }

    /// Persist a status change. `published_at` follows the status: stamped on
    /// publish, cleared otherwise.
    ///
    /// Returns `true` if the version exists on the given article.
    pub async fn update_status(
        tx: &mut PgTx<'_>,
        article_serial: &str,
        version_serial: &str,
        status: VersionStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE versions SET \
                status = $3, \
                updated_at = NOW(), \
                published_at = CASE WHEN $3 = 'published' THEN NOW() ELSE NULL END \
             WHERE serial = $2 AND article_serial = $1",
        )
        .bind(article_serial)
        .bind(version_serial)
        .bind(status.as_str())
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark every version of an article deleted.
    pub async fn soft_delete_by_article(
        tx: &mut PgTx<'_>,
        article_serial: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE versions SET \
                status = $2, deleted_at = NOW(), updated_at = NOW(), published_at = NULL \
             WHERE article_serial = $1",
        )
        .bind(article_serial)
        .bind(VersionStatus::Deleted.as_str())
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Returns `true` if the version exists.
    pub async fn update_tag_relationship_score(
        tx: &mut PgTx<'_>,
        version_serial: &str,
        score: f64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE versions SET tag_relationship_score = $2, updated_at = NOW() WHERE serial = $1",
        )
        .bind(version_serial)
        .bind(score)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Distinct non-deleted articles that currently have a published version.
    pub async fn count_published_articles(tx: &mut PgTx<'_>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT v.article_serial) \
             FROM versions v \
             JOIN articles a ON a.serial = v.article_serial \
             WHERE v.status = 'published' AND a.deleted_at IS NULL",
        )
        .fetch_one(&mut **tx)
        .await
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find a version by serial.
    pub async fn find_by_serial(pool: &PgPool, serial: &str) -> Result<Option<Version>, sqlx::Error> {
        let query = format!("{SELECT_WITH_TAGS} WHERE v.serial = $1 GROUP BY v.serial");
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(serial)
            .fetch_optional(pool)
            .await?
            .map(VersionRow::into_version)
            .transpose()
    }

    /// All versions of an article, oldest first.
    pub async fn list_by_article(
        pool: &PgPool,
        article_serial: &str,
    ) -> Result<Vec<Version>, sqlx::Error> {
        let query = format!(
            "{SELECT_WITH_TAGS} WHERE v.article_serial = $1 \
             GROUP BY v.serial ORDER BY v.version_number"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(article_serial)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(VersionRow::into_version)
            .collect()
    }

    /// The published version (if any) and the newest version of an article.
    pub async fn latest_detail(
        pool: &PgPool,
        article_serial: &str,
    ) -> Result<ArticleLatestDetail, sqlx::Error> {
        let published_query = format!(
            "{SELECT_WITH_TAGS} WHERE v.article_serial = $1 AND v.status = 'published' \
             GROUP BY v.serial ORDER BY v.published_at DESC NULLS LAST, v.version_number DESC \
             LIMIT 1"
        );
        let published_version = sqlx::query_as::<_, VersionRow>(&published_query)
            .bind(article_serial)
            .fetch_optional(pool)
            .await?
            .map(VersionRow::into_version)
            .transpose()?;

        let latest_query = format!(
            "{SELECT_WITH_TAGS} WHERE v.article_serial = $1 \
             GROUP BY v.serial ORDER BY v.version_number DESC LIMIT 1"
        );
        let latest_version = sqlx::query_as::<_, VersionRow>(&latest_query)
            .bind(article_serial)
            .fetch_optional(pool)
            .await?
            .map(VersionRow::into_version)
            .transpose()?;

        Ok(ArticleLatestDetail {
            article_serial: article_serial.to_string(),
            published_version,
            latest_version,
        })
    }

    /// One page of versions matching the listing query, plus the total count.
    pub async fn list(
        pool: &PgPool,
        params: &ArticleListQuery,
    ) -> Result<(Vec<Version>, i64), sqlx::Error> {
        let count_query = format!("SELECT COUNT(*) FROM versions v {LIST_FILTER}");
        let total = sqlx::query_scalar::<_, i64>(&count_query)
            .bind(params.status.as_str())
            .bind(params.author_username.as_deref())
            .bind(params.tag_serial.as_deref())
            .fetch_one(pool)
            .await?;

        let query = format!(
            "{SELECT_WITH_TAGS} {LIST_FILTER} \
             GROUP BY v.serial \
             ORDER BY v.{column} {direction} NULLS LAST, v.serial \
             LIMIT $4 OFFSET $5",
            column = params.sort.column(),
            direction = params.direction.keyword(),
        );
        let versions = sqlx::query_as::<_, VersionRow>(&query)
            .bind(params.status.as_str())
            .bind(params.author_username.as_deref())
            .bind(params.tag_serial.as_deref())
            .bind(params.page.limit())
            .bind(params.page.offset())
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(VersionRow::into_version)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((versions, total))
    }
}
