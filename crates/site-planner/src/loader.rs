//! Existing-facility loading from JSON files

use crate::{PlanningError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use suitability_core::{InfrastructureKind, InfrastructureSource, Poi, SourceError, Viewport};
use tracing::{debug, info};

/// Validate latitude is finite and within [-90, 90]
fn is_valid_latitude(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && lat.is_finite()
}

/// Validate longitude is finite and within [-180, 180]
fn is_valid_longitude(lng: f64) -> bool {
    (-180.0..=180.0).contains(&lng) && lng.is_finite()
}

/// Sanitize an id to alphanumerics, dash, underscore and slash (max 128 chars)
fn sanitize_id(id: String) -> String {
    id.chars()
        .filter(|c| c.is_alphanumeric() || "-_/".contains(*c))
        .take(128)
        .collect()
}

/// Sanitize a display name (wider character set, capped at 256 chars)
fn sanitize_name(name: String) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || " -_.,()&'".contains(*c))
        .take(256)
        .collect()
}

/// Raw facility entry from JSON; every field is optional until validated
#[derive(Debug, Deserialize)]
struct RawPoi {
    id: Option<serde_json::Value>,
    name: Option<String>,
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude", alias = "lon")]
    lng: Option<f64>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Load facilities from a JSON file.
///
/// Accepts a bare array or an object with a `pois` array. Entries with
/// missing or out-of-range coordinates are skipped.
pub fn load_pois(path: impl AsRef<Path>) -> Result<Vec<Poi>> {
    let path = path.as_ref();
    info!("Loading infrastructure points from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let raw: serde_json::Value = serde_json::from_reader(reader)?;

    let entries: Vec<RawPoi> = if let Some(pois) = raw.get("pois") {
        serde_json::from_value(pois.clone())?
    } else if raw.is_array() {
        serde_json::from_value(raw)?
    } else {
        return Err(PlanningError::NoPoints);
    };

    let mut pois = Vec::new();
    let mut skipped = 0;

    for (i, entry) in entries.into_iter().enumerate() {
        let (lat, lng) = match (entry.lat, entry.lng) {
            (Some(lat), Some(lng)) if is_valid_latitude(lat) && is_valid_longitude(lng) => (lat, lng),
            _ => {
                skipped += 1;
                continue;
            }
        };

        let id = match entry.id {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => format!("poi-{}", i),
        };
        let kind = entry.kind.unwrap_or_else(|| "facility".to_string());
        let name = sanitize_name(entry.name.unwrap_or_else(|| format!("Unnamed {}", kind)));

        pois.push(Poi {
            id: sanitize_id(id),
            lat,
            lng,
            name,
            kind,
        });
    }

    info!(
        "Loaded {} infrastructure points ({} skipped for invalid coords)",
        pois.len(),
        skipped
    );

    Ok(pois)
}

/// Fixed facility set, filtered to the requested viewport.
///
/// The set is treated as already being of the requested kind.
#[derive(Debug, Clone, Default)]
pub struct StaticInfrastructure {
    pois: Vec<Poi>,
}

impl StaticInfrastructure {
    /// Wrap an already-validated facility list, e.g. from [`load_pois`]
    pub fn new(pois: Vec<Poi>) -> Self {
        Self { pois }
    }

    /// Number of facilities held, regardless of viewport
    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }
}

#[async_trait]
impl InfrastructureSource for StaticInfrastructure {
    /// Facilities inside `viewport`. `kind` only labels the log line.
    async fn points(
        &self,
        viewport: &Viewport,
        kind: InfrastructureKind,
    ) -> std::result::Result<Vec<Poi>, SourceError> {
        let inside: Vec<Poi> = self
            .pois
            .iter()
            .filter(|p| viewport.contains(&p.point()))
            .cloned()
            .collect();
        debug!("{} static {} points inside viewport", inside.len(), kind.label());
        Ok(inside)
    }
}
