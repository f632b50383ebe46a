//! Configuration for the reconciliation engine.
//!
//! # Example
//!
//! ```
//! use observance_engine::EngineConfig;
//!
//! // Minimal config (uses defaults)
//! let config = EngineConfig::default();
//! assert_eq!(config.query_endpoint, "https://query.wikidata.org/sparql");
//! assert_eq!(config.language, "en");
//!
//! // Full config
//! let config = EngineConfig {
//!     database_url: Some("sqlite:observances.db".into()),
//!     language: "fr".into(),
//!     http_timeout_secs: 10,
//!     ..Default::default()
//! };
//! ```

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the reconciliation engine and its sources.
///
/// All fields have sensible defaults. Without a `database_url` the engine
/// falls back to an in-process memory cache.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// SQLite connection string (e.g., "sqlite:observances.db"). None for
    /// an ephemeral in-process cache.
    #[serde(default)]
    pub database_url: Option<String>,

    /// SPARQL query endpoint of the remote authoritative source.
    #[serde(default = "default_query_endpoint")]
    pub query_endpoint: String,

    /// Language code used for labels and article lookups.
    #[serde(default = "default_language")]
    pub language: String,

    /// User-Agent header sent with every remote request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout for remote fetches, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_query_endpoint() -> String {
    "https://query.wikidata.org/sparql".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_user_agent() -> String {
    format!("observance-engine/{}", env!("CARGO_PKG_VERSION"))
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl EngineConfig {
    /// The HTTP timeout as a [`Duration`].
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            query_endpoint: default_query_endpoint(),
            language: default_language(),
            user_agent: default_user_agent(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}
