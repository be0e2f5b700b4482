//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role is not
//! allowed, so handlers enforce authorization through their signatures.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use folio_core::error::CoreError;
use folio_core::roles::{ROLE_ADMIN, ROLE_WRITER};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        require_role(&user, &[ROLE_ADMIN], "Admin role required")?;
        Ok(RequireAdmin(user))
    }
}

/// Requires the `writer` role. Only writers author articles.
///
/// ```ignore
/// async fn create(RequireWriter(user): RequireWriter) -> AppResult<Json<()>> {
///     // user.username becomes the version author
///     Ok(Json(()))
/// }
/// ```
pub struct RequireWriter(pub AuthUser);

impl FromRequestParts<AppState> for RequireWriter {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        require_role(&user, &[ROLE_WRITER], "Writer role required")?;
        Ok(RequireWriter(user))
    }
}

/// Requires `admin` or `writer` role. Rejects with 403 Forbidden otherwise.
pub struct RequireAdminOrWriter(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdminOrWriter {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        require_role(&user, &[ROLE_ADMIN, ROLE_WRITER], "Admin or Writer role required")?;
        Ok(RequireAdminOrWriter(user))
    }
}

fn require_role(user: &AuthUser, allowed: &[&str], message: &str) -> Result<(), AppError> {
    if allowed.contains(&user.role.as_str()) {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(message.into())))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn user(role: &str) -> AuthUser {
        AuthUser {
            username: "alice".into(),
            role: role.into(),
        }
    }

    #[test]
    fn allowed_roles_pass() {
        assert!(require_role(&user("admin"), &[ROLE_ADMIN, ROLE_WRITER], "x").is_ok());
        assert!(require_role(&user("writer"), &[ROLE_ADMIN, ROLE_WRITER], "x").is_ok());
    }

    #[test]
    fn other_roles_are_forbidden() {
        assert_matches!(
            require_role(&user("editor"), &[ROLE_WRITER], "Writer role required"),
            Err(AppError::Core(CoreError::Forbidden(msg))) if msg == "Writer role required"
        );
        assert_matches!(
            require_role(&user("writer"), &[ROLE_ADMIN], "x"),
            Err(AppError::Core(CoreError::Forbidden(_)))
        );
    }
}
