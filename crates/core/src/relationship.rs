//! Tag relationship score based on Positive Pointwise Mutual Information.
//!
//! For a pair of tags `i, j` with individual usage counts `C(i)`, `C(j)`,
//! co-occurrence count `C(i,j)` and `N` published articles:
//!
//! ```text
//! PMI(i, j)  = log2( C(i,j) * N / (C(i) * C(j)) )
//! PPMI(i, j) = max(PMI(i, j), 0)
//! ```
//!
//! A version's relationship score is the mean PPMI over all pairs of its tags.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::tag::{pair_combinations, TagPairStat, TagStat};
use crate::types::Serial;

/// PPMI for a single tag pair. Any zero input yields 0.
pub fn calculate_tag_relationship_score(
    tag1_usage_count: i64,
    tag2_usage_count: i64,
    pair_usage_count: i64,
    total_published_articles: i64,
) -> f64 {
    if tag1_usage_count <= 0
        || tag2_usage_count <= 0
        || pair_usage_count <= 0
        || total_published_articles <= 0
    {
        return 0.0;
    }

    let pmi = ((pair_usage_count as f64 * total_published_articles as f64)
        / (tag1_usage_count as f64 * tag2_usage_count as f64))
        .log2();

    pmi.max(0.0)
}

/// Mean PPMI across every unordered pair of `tag_serials`.
///
/// Fewer than two distinct tags score 0. Every tag must have a row in
/// `tag_stats` and every pair a row in `pair_stats`; a missing row is an
/// integrity failure reported as [`CoreError::NotFound`].
pub fn mean_relationship_score(
    tag_serials: &[Serial],
    tag_stats: &[TagStat],
    pair_stats: &[TagPairStat],
    total_published_articles: i64,
) -> Result<f64, CoreError> {
    let pairs = pair_combinations(tag_serials);
    if pairs.is_empty() {
        return Ok(0.0);
    }

    let usage: HashMap<&str, i64> = tag_stats
        .iter()
        .map(|stat| (stat.tag_serial.as_str(), stat.usage_count))
        .collect();
    let pair_usage: HashMap<(&str, &str), i64> = pair_stats
        .iter()
        .map(|stat| {
            (
                (stat.tag1_serial.as_str(), stat.tag2_serial.as_str()),
                stat.usage_count,
            )
        })
        .collect();

    let mut total = 0.0;
    for (tag1, tag2) in &pairs {
        let tag1_usage = *usage
            .get(tag1.as_str())
            .ok_or_else(|| CoreError::not_found("TagStat", tag1.as_str()))?;
        let tag2_usage = *usage
            .get(tag2.as_str())
            .ok_or_else(|| CoreError::not_found("TagStat", tag2.as_str()))?;
        let together = *pair_usage
            .get(&(tag1.as_str(), tag2.as_str()))
            .ok_or_else(|| CoreError::not_found("TagPairStat", format!("{tag1}-{tag2}")))?;

        total += calculate_tag_relationship_score(
            tag1_usage,
            tag2_usage,
            together,
            total_published_articles,
        );
    }

    Ok(total / pairs.len() as f64)
}
