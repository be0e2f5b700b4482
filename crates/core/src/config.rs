//! Tag statistics configuration.

use crate::error::CoreError;

/// Default trending-score half-life in days.
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 7.0;

/// Default number of tag stat rows recomputed per refresh page.
pub const DEFAULT_REFRESH_PAGE_SIZE: i64 = 100;

/// Parameters for the tag statistics engine.
///
/// Constructed once at startup and handed to
/// [`VersioningEngine::new`](crate::versioning::VersioningEngine::new).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagStatsConfig {
    /// Half-life of the trending-score exponential decay, in days.
    pub trending_half_life_days: f64,
    /// Page size used by the batch trending refresh sweep.
    pub refresh_page_size: i64,
}

impl Default for TagStatsConfig {
    fn default() -> Self {
        Self {
            trending_half_life_days: DEFAULT_HALF_LIFE_DAYS,
            refresh_page_size: DEFAULT_REFRESH_PAGE_SIZE,
        }
    }
}

impl TagStatsConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `TRENDING_HALF_LIFE_DAYS`    | `7`     |
    /// | `TRENDING_REFRESH_PAGE_SIZE` | `100`   |
    pub fn from_env() -> Result<Self, CoreError> {
        let trending_half_life_days = match std::env::var("TRENDING_HALF_LIFE_DAYS") {
            Ok(raw) => raw.parse().map_err(|_| {
                CoreError::Validation(format!("TRENDING_HALF_LIFE_DAYS must be a number, got '{raw}'"))
            })?,
            Err(_) => DEFAULT_HALF_LIFE_DAYS,
        };

        let refresh_page_size = match std::env::var("TRENDING_REFRESH_PAGE_SIZE") {
            Ok(raw) => raw.parse().map_err(|_| {
                CoreError::Validation(format!(
                    "TRENDING_REFRESH_PAGE_SIZE must be an integer, got '{raw}'"
                ))
            })?,
            Err(_) => DEFAULT_REFRESH_PAGE_SIZE,
        };

        let config = Self {
            trending_half_life_days,
            refresh_page_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject half-lives that would make the decay constant meaningless.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.trending_half_life_days.is_finite() || self.trending_half_life_days <= 0.0 {
            return Err(CoreError::Validation(format!(
                "trending half-life must be a positive number of days, got {}",
                self.trending_half_life_days
            )));
        }
        if self.refresh_page_size < 1 {
            return Err(CoreError::Validation(format!(
                "refresh page size must be at least 1, got {}",
                self.refresh_page_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_half_life_is_one_week() {
        let config = TagStatsConfig::default();
        assert_eq!(config.trending_half_life_days, 7.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_half_life() {
        for half_life in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = TagStatsConfig {
                trending_half_life_days: half_life,
                ..TagStatsConfig::default()
            };
            assert!(config.validate().is_err(), "{half_life} should be rejected");
        }
    }

    #[test]
    fn rejects_empty_refresh_pages() {
        let config = TagStatsConfig {
            refresh_page_size: 0,
            ..TagStatsConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
