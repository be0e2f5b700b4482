use crate::types::Serial;

/// Domain error shared by every layer of the service.
///
/// Variants map one-to-one onto the caller-visible failure kinds: validation
/// failures are caller-fixable, `NotFound` maps to a 404, `Conflict` covers
/// integrity violations (duplicate names), and `Storage` is an opaque
/// transaction or query failure that always aborts the enclosing operation.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with serial {id}")]
    NotFound { entity: &'static str, id: Serial },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`] keyed by serial.
    pub fn not_found(entity: &'static str, id: impl Into<Serial>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}
