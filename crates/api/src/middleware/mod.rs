//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`rbac::RequireWriter`] -- Requires the `writer` role.
//! - [`rbac::RequireAdminOrWriter`] -- Requires `admin` or `writer`.

pub mod auth;
pub mod rbac;
