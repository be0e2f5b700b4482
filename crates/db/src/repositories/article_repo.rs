//! Repository for the `articles` table.

use folio_core::article::Article;
use sqlx::PgPool;

use super::PgTx;
use crate::models::article::ArticleRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "serial, created_at, updated_at, deleted_at";

/// Provides article lookups and soft deletion.
pub struct ArticleRepo;

impl ArticleRepo {
    /// Insert a new article, returning the created row.
    pub async fn create(tx: &mut PgTx<'_>, serial: &str) -> Result<Article, sqlx::Error> {
        let query = format!("INSERT INTO articles (serial) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, ArticleRow>(&query)
            .bind(serial)
            .fetch_one(&mut **tx)
            .await
            .map(Article::from)
    }

    /// Find a non-deleted article by serial.
    pub async fn find_by_serial(pool: &PgPool, serial: &str) -> Result<Option<Article>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM articles WHERE serial = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, ArticleRow>(&query)
            .bind(serial)
            .fetch_optional(pool)
            .await
            .map(|row| row.map(Article::from))
    }

    /// Fetch an article (deleted or not) and lock its row until the
    /// transaction ends. Concurrent transitions on one article queue here.
    pub async fn lock(tx: &mut PgTx<'_>, serial: &str) -> Result<Option<Article>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM articles WHERE serial = $1 FOR UPDATE");
        sqlx::query_as::<_, ArticleRow>(&query)
            .bind(serial)
            .fetch_optional(&mut **tx)
            .await
            .map(|row| row.map(Article::from))
    }

    /// Soft-delete an article.
    ///
    /// Returns `true` if the row was marked deleted, `false` if it did not
    /// exist or was already deleted.
    pub async fn soft_delete(tx: &mut PgTx<'_>, serial: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE articles SET deleted_at = NOW(), updated_at = NOW() \
             WHERE serial = $1 AND deleted_at IS NULL",
        )
        .bind(serial)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
