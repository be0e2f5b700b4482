//! Trending score: exponential decay of a tag's usage count over time.
//!
//! `score = usage_count * e^(-λ * age_days)` with `λ = ln 2 / half_life_days`,
//! so a count that has not changed for one half-life is worth half as much.

use chrono::Duration;

use crate::types::Timestamp;

/// Seconds per day, used to convert elapsed time into fractional days.
const SECS_PER_DAY: f64 = 86_400.0;

/// Pure trending-score calculator for a fixed half-life.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendingScoreCalculator {
    decay_per_day: f64,
}

impl TrendingScoreCalculator {
    /// `half_life_days` must be positive and finite; see
    /// [`TagStatsConfig::validate`](crate::config::TagStatsConfig::validate).
    pub fn new(half_life_days: f64) -> Self {
        Self {
            decay_per_day: std::f64::consts::LN_2 / half_life_days,
        }
    }

    /// Score for `usage_count` last changed at `last_updated_at`, as seen at `now`.
    ///
    /// Returns 0 for non-positive counts. A `last_updated_at` in the future
    /// (clock skew) is treated as age 0.
    pub fn score(&self, usage_count: i64, last_updated_at: Timestamp, now: Timestamp) -> f64 {
        if usage_count <= 0 {
            return 0.0;
        }
        let age_days = age_in_days(now - last_updated_at);
        usage_count as f64 * (-self.decay_per_day * age_days).exp()
    }
}

fn age_in_days(elapsed: Duration) -> f64 {
    let secs = elapsed.num_milliseconds() as f64 / 1000.0;
    (secs / SECS_PER_DAY).max(0.0)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn calculator() -> TrendingScoreCalculator {
        TrendingScoreCalculator::new(7.0)
    }

    #[test]
    fn zero_or_negative_usage_scores_zero() {
        let now = Utc::now();
        assert_eq!(calculator().score(0, now, now), 0.0);
        assert_eq!(calculator().score(-3, now - Duration::days(1), now), 0.0);
    }

    #[test]
    fn fresh_count_scores_full_value() {
        let now = Utc::now();
        assert!((calculator().score(10, now, now) - 10.0).abs() < EPSILON);
    }

    #[test]
    fn one_half_life_halves_the_score() {
        let now = Utc::now();
        let score = calculator().score(10, now - Duration::days(7), now);
        assert!((score - 5.0).abs() < 1e-6, "got {score}");
    }

    #[test]
    fn two_half_lives_quarter_the_score() {
        let now = Utc::now();
        let score = calculator().score(8, now - Duration::days(14), now);
        assert!((score - 2.0).abs() < 1e-6, "got {score}");
    }

    #[test]
    fn future_timestamp_is_treated_as_age_zero() {
        let now = Utc::now();
        let score = calculator().score(4, now + Duration::hours(2), now);
        assert!((score - 4.0).abs() < EPSILON);
    }

    #[test]
    fn score_is_non_increasing_with_age() {
        let now = Utc::now();
        let calc = calculator();
        let mut previous = f64::INFINITY;
        for hours in (0..24 * 60).step_by(6) {
            let score = calc.score(12, now - Duration::hours(hours), now);
            assert!(score <= previous);
            assert!(score >= 0.0);
            previous = score;
        }
    }

    #[test]
    fn score_tends_to_zero() {
        let now = Utc::now();
        let score = calculator().score(1_000, now - Duration::days(365 * 5), now);
        assert!(score < 1e-6, "got {score}");
    }
}
