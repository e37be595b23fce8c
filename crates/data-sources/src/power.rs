//! NASA POWER daily temperature client
//!
//! POWER publishes with a long processing delay, so readings come from a
//! one-month window ending one year before today.

use crate::{http_client, PowerConfig, TtlCache};
use chrono::{Months, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use suitability_core::{GeoPoint, SourceError};
use tracing::debug;

/// Values at or below this are POWER fill values
const FILL_VALUE: f64 = -999.0;

#[derive(Debug, Deserialize)]
pub struct PowerResponse {
    properties: PowerProperties,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    parameter: PowerParameters,
}

#[derive(Debug, Deserialize)]
struct PowerParameters {
    /// Daily mean temperature at 2 m, keyed YYYYMMDD
    #[serde(rename = "T2M", default)]
    t2m: BTreeMap<String, serde_json::Value>,
}

impl PowerResponse {
    /// Most recent valid daily T2M reading
    pub fn latest_temperature(&self) -> Option<f64> {
        self.properties
            .parameter
            .t2m
            .values()
            .filter_map(|v| v.as_f64())
            .filter(|t| t.is_finite() && *t > FILL_VALUE)
            .last()
    }
}

/// `(start, end)` as YYYYMMDD for the request window
pub fn request_window(today: NaiveDate) -> (String, String) {
    let end = today.checked_sub_months(Months::new(12)).unwrap_or(today);
    let start = end.checked_sub_months(Months::new(1)).unwrap_or(end);
    (
        start.format("%Y%m%d").to_string(),
        end.format("%Y%m%d").to_string(),
    )
}

/// NASA POWER client
pub struct PowerClient {
    config: PowerConfig,
    client: reqwest::Client,
    cache: Arc<TtlCache<f64>>,
}

impl PowerClient {
    pub fn new(config: PowerConfig, cache: Arc<TtlCache<f64>>) -> Result<Self, SourceError> {
        let client =
            http_client(config.timeout_sec).map_err(|e| SourceError::RequestFailed(e.to_string()))?;
        Ok(Self {
            config,
            client,
            cache,
        })
    }

    /// Latest daily temperature (°C) near the point
    pub async fn fetch_temperature(&self, point: GeoPoint) -> Result<f64, SourceError> {
        let key = TtlCache::<f64>::coordinate_key(point.lat, point.lng);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let (start, end) = request_window(chrono::Utc::now().date_naive());
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("parameters", "T2M".to_string()),
                ("community", "RE".to_string()),
                ("longitude", format!("{:.4}", point.lng)),
                ("latitude", format!("{:.4}", point.lat)),
                ("start", start),
                ("end", end),
                ("format", "JSON".to_string()),
            ])
            .send()
            .await
            .map_err(|e| SourceError::RequestFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(SourceError::ApiError(format!(
                "NASA POWER returned status: {}",
                response.status()
            )));
        }

        let data: PowerResponse = response
            .json()
            .await
            .map_err(|e| SourceError::ParseError(e.to_string()))?;

        let temperature = data
            .latest_temperature()
            .ok_or_else(|| SourceError::ParseError("no valid T2M values".to_string()))?;

        debug!("POWER T2M at {}: {:.1}°C", key, temperature);
        self.cache.insert(key, temperature).await;
        Ok(temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_window() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let (start, end) = request_window(today);
        assert_eq!(end, "20240331");
        // Month subtraction clamps to the last day of February
        assert_eq!(start, "20240229");
    }

    #[test]
    fn test_latest_temperature_skips_fill_values() {
        let json = r#"{
            "properties": {"parameter": {"T2M": {
                "20240301": 4.2,
                "20240302": 6.8,
                "20240303": -999.0
            }}}
        }"#;
        let data: PowerResponse = serde_json::from_str(json).unwrap();
        assert_eq!(data.latest_temperature(), Some(6.8));
    }

    #[test]
    fn test_latest_temperature_orders_by_date() {
        let json = r#"{
            "properties": {"parameter": {"T2M": {
                "20240310": 9.5,
                "20240301": 4.2
            }}}
        }"#;
        let data: PowerResponse = serde_json::from_str(json).unwrap();
        assert_eq!(data.latest_temperature(), Some(9.5));
    }

    #[test]
    fn test_missing_series() {
        let json = r#"{"properties": {"parameter": {}}}"#;
        let data: PowerResponse = serde_json::from_str(json).unwrap();
        assert_eq!(data.latest_temperature(), None);
    }

    #[tokio::test]
    async fn test_cached_reading_skips_network() {
        let cache = Arc::new(TtlCache::new(std::time::Duration::from_secs(60)));
        cache
            .insert(TtlCache::<f64>::coordinate_key(40.7128, -74.006), 18.4)
            .await;
        let config = PowerConfig {
            // Unroutable; the cache must answer first
            base_url: "http://127.0.0.1:9/power".to_string(),
            timeout_sec: 1,
        };
        let client = PowerClient::new(config, cache).unwrap();
        let t = client.fetch_temperature(GeoPoint::new(40.7128, -74.006)).await.unwrap();
        assert_eq!(t, 18.4);
    }
}
