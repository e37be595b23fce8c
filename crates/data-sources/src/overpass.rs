//! OpenStreetMap Overpass client for existing facilities

use crate::{http_client, OverpassConfig, TtlCache};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use suitability_core::{InfrastructureKind, InfrastructureSource, Poi, SourceError, Viewport};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    id: u64,
    lat: Option<f64>,
    lon: Option<f64>,
    /// Present on ways and relations with `out center`
    center: Option<OverpassCenter>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}

impl OverpassResponse {
    /// Convert elements to points, skipping any without coordinates
    pub fn into_pois(self, kind: InfrastructureKind) -> Vec<Poi> {
        self.elements
            .into_iter()
            .filter_map(|element| {
                let (lat, lng) = match (&element.center, element.lat, element.lon) {
                    (Some(c), _, _) => (c.lat, c.lon),
                    (None, Some(lat), Some(lon)) => (lat, lon),
                    _ => return None,
                };
                let name = element
                    .tags
                    .get("name")
                    .cloned()
                    .unwrap_or_else(|| format!("Unnamed {}", kind.label()));
                Some(Poi {
                    id: element.id.to_string(),
                    lat,
                    lng,
                    name,
                    kind: kind.label().to_string(),
                })
            })
            .collect()
    }
}

/// Overpass QL for nodes, ways and relations carrying the kind's tag
pub fn build_query(viewport: &Viewport, kind: InfrastructureKind, timeout_sec: u64) -> String {
    let (key, value) = kind.osm_tag();
    let bbox = format!(
        "{},{},{},{}",
        viewport.south, viewport.west, viewport.north, viewport.east
    );
    format!(
        "[out:json][timeout:{timeout}];\n(\n  node[\"{key}\"=\"{value}\"]({bbox});\n  way[\"{key}\"=\"{value}\"]({bbox});\n  relation[\"{key}\"=\"{value}\"]({bbox});\n);\nout center;",
        timeout = timeout_sec,
        key = key,
        value = value,
        bbox = bbox
    )
}

fn cache_key(viewport: &Viewport, kind: InfrastructureKind) -> String {
    format!(
        "{}:{:.2},{:.2},{:.2},{:.2}",
        kind.label(),
        viewport.north,
        viewport.south,
        viewport.east,
        viewport.west
    )
}

/// Overpass API client
pub struct OverpassClient {
    config: OverpassConfig,
    client: reqwest::Client,
    cache: Arc<TtlCache<Vec<Poi>>>,
}

impl OverpassClient {
    pub fn new(config: OverpassConfig, cache: Arc<TtlCache<Vec<Poi>>>) -> Result<Self, SourceError> {
        let client =
            http_client(config.timeout_sec).map_err(|e| SourceError::RequestFailed(e.to_string()))?;
        Ok(Self {
            config,
            client,
            cache,
        })
    }

    async fn query(&self, viewport: &Viewport, kind: InfrastructureKind) -> Result<Vec<Poi>, SourceError> {
        let query = build_query(viewport, kind, self.config.query_timeout_sec);
        let response = self
            .client
            .post(&self.config.url)
            .form(&[("data", query)])
            .send()
            .await
            .map_err(|e| SourceError::RequestFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Overpass rate limit exceeded");
            return Err(SourceError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(SourceError::ApiError(format!(
                "Overpass returned status: {}",
                response.status()
            )));
        }

        let data: OverpassResponse = response
            .json()
            .await
            .map_err(|e| SourceError::ParseError(e.to_string()))?;
        Ok(data.into_pois(kind))
    }
}

#[async_trait]
impl InfrastructureSource for OverpassClient {
    async fn points(&self, viewport: &Viewport, kind: InfrastructureKind) -> Result<Vec<Poi>, SourceError> {
        let key = cache_key(viewport, kind);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let pois = self.query(viewport, kind).await?;
        debug!("Overpass returned {} {} points", pois.len(), kind.label());
        self.cache.insert(key, pois.clone()).await;
        Ok(pois)
    }
}
