//! Tag, tag statistic and tag-pair statistic types.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Serial, Timestamp};

/// Maximum tag name length, matching `tags.name VARCHAR(100)`.
pub const MAX_TAG_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub serial: Serial,
    pub name: String,
    pub created_at: Timestamp,
}

/// Per-tag popularity row.
///
/// `usage_count` is the number of currently published versions carrying the
/// tag and never drops below zero. `trending_score` is derived from
/// `usage_count` and the age of `usage_count_updated_at`; user actions never
/// modify it directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagStat {
    pub tag_serial: Serial,
    pub usage_count: i64,
    pub trending_score: f64,
    pub usage_count_updated_at: Timestamp,
    pub trending_score_updated_at: Timestamp,
}

/// Co-occurrence counter for an unordered tag pair, stored canonically with
/// `tag1_serial < tag2_serial`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagPairStat {
    pub tag1_serial: Serial,
    pub tag2_serial: Serial,
    pub usage_count: i64,
}

/// DTO for `POST /tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTag {
    pub name: String,
}

impl CreateTag {
    /// Trimmed tag name, or a validation error when empty or too long.
    pub fn normalized_name(&self) -> Result<String, CoreError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("tag name is mandatory".into()));
        }
        if name.chars().count() > MAX_TAG_NAME_LEN {
            return Err(CoreError::Validation(format!(
                "tag name must be at most {MAX_TAG_NAME_LEN} characters"
            )));
        }
        Ok(name.to_string())
    }
}

/// Order two tag serials lexically so pair lookups are symmetric.
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// All unordered pairs of distinct serials, each in canonical order.
///
/// Duplicate input serials are ignored, so `n` distinct tags always yield
/// `n * (n - 1) / 2` pairs.
pub fn pair_combinations(serials: &[Serial]) -> Vec<(Serial, Serial)> {
    let unique = dedup_serials(serials);
    let mut pairs = Vec::with_capacity(unique.len() * unique.len().saturating_sub(1) / 2);
    for (i, first) in unique.iter().enumerate() {
        for second in &unique[i + 1..] {
            let (a, b) = canonical_pair(first, second);
            pairs.push((a.to_string(), b.to_string()));
        }
    }
    pairs
}

/// Remove duplicate serials, keeping the first occurrence of each.
pub fn dedup_serials(serials: &[Serial]) -> Vec<Serial> {
    let mut seen = HashSet::with_capacity(serials.len());
    serials
        .iter()
        .filter(|serial| seen.insert(serial.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serials(items: &[&str]) -> Vec<Serial> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn canonical_pair_is_symmetric() {
        assert_eq!(canonical_pair("TAGb", "TAGa"), ("TAGa", "TAGb"));
        assert_eq!(canonical_pair("TAGa", "TAGb"), ("TAGa", "TAGb"));
    }

    #[test]
    fn pair_combinations_are_canonical_and_complete() {
        let pairs = pair_combinations(&serials(&["TAGc", "TAGa", "TAGb"]));
        assert_eq!(
            pairs,
            vec![
                ("TAGa".to_string(), "TAGc".to_string()),
                ("TAGb".to_string(), "TAGc".to_string()),
                ("TAGa".to_string(), "TAGb".to_string()),
            ]
        );
    }

    #[test]
    fn pair_combinations_of_small_sets_are_empty() {
        assert!(pair_combinations(&[]).is_empty());
        assert!(pair_combinations(&serials(&["TAGa"])).is_empty());
        assert!(pair_combinations(&serials(&["TAGa", "TAGa"])).is_empty());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        assert_eq!(
            dedup_serials(&serials(&["b", "a", "b", "c", "a"])),
            serials(&["b", "a", "c"])
        );
    }

    #[test]
    fn tag_name_is_trimmed_and_required() {
        let ok = CreateTag { name: "  rust ".into() };
        assert_eq!(ok.normalized_name().unwrap(), "rust");

        let blank = CreateTag { name: "   ".into() };
        assert!(blank.normalized_name().is_err());

        let long = CreateTag {
            name: "x".repeat(MAX_TAG_NAME_LEN + 1),
        };
        assert!(long.normalized_name().is_err());
    }
}
