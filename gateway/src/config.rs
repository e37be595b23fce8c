//! Gateway configuration from environment variables

use data_sources::{AdvisoryConfig, CacheConfig, OverpassConfig, PowerConfig};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub cache: CacheConfig,
    pub power: PowerConfig,
    pub overpass: OverpassConfig,
    /// None when `OPENAI_API_KEY` is unset
    pub advisory: Option<AdvisoryConfig>,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("SUITABILITY_GATEWAY_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            port,
            cache: CacheConfig::from_lookup(&lookup),
            power: PowerConfig::default(),
            overpass: OverpassConfig::default(),
            advisory: AdvisoryConfig::from_lookup(&lookup),
        }
    }

    pub fn addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
