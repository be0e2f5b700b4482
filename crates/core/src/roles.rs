//! Well-known role name constants.
//!
//! These must match the `CHECK` constraint on `users.role` in
//! `20260301000001_create_users.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_WRITER: &str = "writer";
pub const ROLE_EDITOR: &str = "editor";

/// All roles a user may register with.
pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_WRITER, ROLE_EDITOR];

/// Whether `role` is one of [`VALID_ROLES`].
pub fn is_valid_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}

/// Roles allowed to see unpublished versions when listing articles.
pub fn can_view_unpublished(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_WRITER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_roles_are_valid() {
        assert!(is_valid_role("admin"));
        assert!(is_valid_role("writer"));
        assert!(is_valid_role("editor"));
        assert!(!is_valid_role("reader"));
        assert!(!is_valid_role(""));
    }

    #[test]
    fn only_admin_and_writer_see_unpublished() {
        assert!(can_view_unpublished(ROLE_ADMIN));
        assert!(can_view_unpublished(ROLE_WRITER));
        assert!(!can_view_unpublished(ROLE_EDITOR));
    }
}
