//! Database row structs and query DTOs.
//!
//! Row structs derive `FromRow` and convert into the `folio_core` domain
//! types; statuses are stored as text and parsed on the way out.

pub mod article;
pub mod tag;
pub mod user;
