//! Version lifecycle status.
//!
//! Statuses are persisted as lowercase text (`versions.status`). Only the
//! `published` status counts towards tag statistics; every other status is
//! "not published" for bookkeeping purposes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Draft,
    Published,
    Archived,
    Deleted,
}

impl VersionStatus {
    pub const ALL: [VersionStatus; 4] = [
        Self::Draft,
        Self::Published,
        Self::Archived,
        Self::Deleted,
    ];

    /// Database / wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
        }
    }

    /// Whether this status contributes to tag usage counts.
    pub fn is_published(self) -> bool {
        self == Self::Published
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown version status '{s}'")))
    }
}

/// How a requested status change affects tag statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCrossing {
    /// Not published -> published.
    Publish,
    /// Published -> not published.
    Unpublish,
    /// Publish classification does not flip; the request is a no-op.
    None,
}

/// Classify a `current -> requested` change by the published boundary.
///
/// Identical statuses and changes that stay on the same side of the boundary
/// (e.g. `draft -> archived`) are both [`StatusCrossing::None`].
pub fn classify(current: VersionStatus, requested: VersionStatus) -> StatusCrossing {
    match (current.is_published(), requested.is_published()) {
        (false, true) => StatusCrossing::Publish,
        (true, false) => StatusCrossing::Unpublish,
        _ => StatusCrossing::None,
    }
}
