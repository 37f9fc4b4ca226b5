//! Application configuration loaded from environment variables.

use std::time::Duration;

use capabilities::assistant::DEFAULT_GEMINI_MODEL;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `5000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `MOCK_API_URL`: retail data service base URL (default: `"http://localhost:5001/api"`)
/// - `MOCK_API_TIMEOUT_SECS`: per-request timeout for the data service (default: `5`)
/// - `GEMINI_API_KEY`: enables generated copy when set
/// - `GEMINI_MODEL`: model used for generated copy (default: `"gemini-1.5-flash"`)
/// - `DATABASE_URL`: PostgreSQL session store when set, in-memory otherwise
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub mock_api_url: String,
    pub mock_api_timeout: Duration,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub database_url: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        // Empty values count as unset
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            mock_api_url: var("MOCK_API_URL").unwrap_or(defaults.mock_api_url),
            mock_api_timeout: var("MOCK_API_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.mock_api_timeout),
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_model: var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            database_url: var("DATABASE_URL"),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            log_level: "info".to_string(),
            mock_api_url: "http://localhost:5001/api".to_string(),
            mock_api_timeout: Duration::from_secs(5),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            database_url: None,
        }
    }
}
