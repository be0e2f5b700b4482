//! Mapping from `sqlx::Error` to the domain error taxonomy.

use folio_core::error::CoreError;

/// PostgreSQL SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL SQLSTATE for foreign key violations.
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// PostgreSQL SQLSTATE for check constraint violations.
const CHECK_VIOLATION: &str = "23514";

/// Classify a sqlx error into a [`CoreError`].
///
/// - `RowNotFound` maps to `NotFound`.
/// - Unique violations map to `Conflict`, naming the constraint.
/// - Foreign key and check violations map to `Validation`.
/// - Everything else maps to `Storage` with a sanitized message; the
///   underlying error is logged, never returned.
pub fn classify_sqlx_error(err: sqlx::Error) -> CoreError {
    match &err {
        sqlx::Error::RowNotFound => CoreError::not_found("Record", "unknown"),
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => CoreError::Conflict(format!(
                    "Duplicate value violates unique constraint: {constraint}"
                )),
                Some(FOREIGN_KEY_VIOLATION) => CoreError::Validation(format!(
                    "Referenced record does not exist ({constraint})"
                )),
                Some(CHECK_VIOLATION) => {
                    CoreError::Validation(format!("Value violates constraint: {constraint}"))
                }
                _ => {
                    tracing::error!(error = %db_err, "Database error");
                    CoreError::Storage("database operation failed".into())
                }
            }
        }
        sqlx::Error::Decode(source) => {
            tracing::error!(error = %source, "Failed to decode database row");
            CoreError::Storage("database returned an unreadable row".into())
        }
        other => {
            tracing::error!(error = %other, "Database error");
            CoreError::Storage("database operation failed".into())
        }
    }
}
