//! Domain layer for the Folio article-versioning service.
//!
//! Holds the entity types, the error taxonomy, the trending and relationship
//! calculators, the storage capability traits and the [`VersioningEngine`]
//! that drives tag statistics through version status transitions. Nothing in
//! this crate talks to a database directly.
//!
//! [`VersioningEngine`]: versioning::VersioningEngine

pub mod article;
pub mod config;
pub mod error;
pub mod memory;
pub mod pagination;
pub mod refresh;
pub mod relationship;
pub mod roles;
pub mod serial;
pub mod status;
pub mod store;
pub mod tag;
pub mod trending;
pub mod types;
pub mod versioning;
