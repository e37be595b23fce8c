//! Upstream Data Sources
//!
//! Concrete implementations of the suitability collaborator traits:
//!
//! | Source | Trait | Backing |
//! |--------|-------|---------|
//! | [`LiveMetricSource`] | `MetricSource` | NASA POWER temperature + climate estimators |
//! | [`EstimatedMetricSource`] | `MetricSource` | Climate estimators only (offline) |
//! | [`OverpassClient`] | `InfrastructureSource` | OpenStreetMap Overpass API |
//! | [`OpenAiAdvisory`] | `AdvisoryProvider` | OpenAI-compatible chat completions |
//!
//! Network clients share a [`TtlCache`] injected at construction.
//!
//! # Usage
//!
//! ```rust,ignore
//! let cache = CacheConfig::from_env().ttl();
//! let power = PowerClient::new(PowerConfig::default(), Arc::new(TtlCache::new(cache)))?;
//! let metrics = LiveMetricSource::new(power);
//! let score = score_location(&metrics, GeoPoint::new(40.7128, -74.006)).await?;
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod cache;
pub mod estimates;
pub mod live;
pub mod openai;
pub mod overpass;
pub mod power;

pub use cache::TtlCache;
pub use estimates::EstimatedMetricSource;
pub use live::LiveMetricSource;
pub use openai::OpenAiAdvisory;
pub use overpass::OverpassClient;
pub use power::PowerClient;

pub const DEFAULT_CACHE_TTL_SEC: u64 = 300;
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Build an HTTP client with a request timeout
pub(crate) fn http_client(timeout_sec: u64) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_sec))
        .build()
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry lifetime in seconds (default: 300 = 5 minutes)
    pub ttl_sec: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_sec: DEFAULT_CACHE_TTL_SEC,
        }
    }
}

impl CacheConfig {
    /// Read `SOURCE_CACHE_TTL_SECS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let ttl_sec = lookup("SOURCE_CACHE_TTL_SECS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_SEC);
        Self { ttl_sec }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_sec)
    }
}

/// NASA POWER daily point API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerConfig {
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_sec: u64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://power.larc.nasa.gov/api/temporal/daily/point".to_string(),
            timeout_sec: 10,
        }
    }
}

/// Overpass API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpassConfig {
    pub url: String,
    /// HTTP request timeout in seconds
    pub timeout_sec: u64,
    /// Server-side query timeout in seconds
    pub query_timeout_sec: u64,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            url: "https://overpass-api.de/api/interpreter".to_string(),
            timeout_sec: 15,
            query_timeout_sec: 10,
        }
    }
}

/// Chat-completions advisory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_sec: u64,
}

impl AdvisoryConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            temperature: 0.4,
            max_tokens: 900,
            timeout_sec: 30,
        }
    }

    /// Read `OPENAI_API_KEY`, `OPENAI_MODEL` and `OPENAI_BASE_URL`.
    /// None when no API key is set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = Self::new(non_empty("OPENAI_API_KEY")?);
        if let Some(model) = non_empty("OPENAI_MODEL") {
            config.model = model;
        }
        if let Some(base_url) = non_empty("OPENAI_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        Some(config)
    }
}
