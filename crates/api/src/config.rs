use folio_core::config::TagStatsConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    /// An empty list disables the CORS layer.
    pub cors_origins: Vec<String>,
    /// Timeout for interactive requests, in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Timeout for the manual trending refresh, in seconds (default: `300`).
    pub refresh_timeout_secs: u64,
    /// Largest accepted request body, in bytes (default: 1 MiB).
    pub max_body_bytes: usize,
    /// JWT token configuration.
    pub jwt: JwtConfig,
    /// Trending decay and refresh sweep parameters.
    pub tag_stats: TagStatsConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `REFRESH_TIMEOUT_SECS` | `300`                      |
    /// | `MAX_BODY_BYTES`       | `1048576`                  |
    ///
    /// JWT and tag statistics settings are read by [`JwtConfig::from_env`]
    /// and [`TagStatsConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let refresh_timeout_secs: u64 = std::env::var("REFRESH_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REFRESH_TIMEOUT_SECS must be a valid u64");

        let max_body_bytes: usize = std::env::var("MAX_BODY_BYTES")
            .unwrap_or_else(|_| "1048576".into())
            .parse()
            .expect("MAX_BODY_BYTES must be a valid usize");

        let jwt = JwtConfig::from_env();

        let tag_stats = TagStatsConfig::from_env()
            .unwrap_or_else(|e| panic!("Invalid tag statistics configuration: {e}"));

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            refresh_timeout_secs,
            max_body_bytes,
            jwt,
            tag_stats,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
