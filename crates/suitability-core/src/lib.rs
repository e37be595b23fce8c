//! City Suitability Core
//!
//! Fuses independently sourced environmental signals into a single
//! normalized suitability score for any latitude/longitude.
//!
//! # Scoring Model (5-Factor)
//!
//! ```text
//! Score(loc) = w₁·A + w₂·V + w₃·T + w₄·W + w₅·U
//! ```
//!
//! | Factor | Weight | Description |
//! |--------|--------|-------------|
//! | A      | 0.25   | Air quality (aerosol optical depth) |
//! | V      | 0.20   | Vegetation (NDVI) |
//! | T      | 0.20   | Temperature comfort |
//! | W      | 0.20   | Water availability (soil moisture) |
//! | U      | 0.15   | Urbanization (population density) |
//!
//! Raw readings come from [`MetricSource`] collaborators. Any reading a
//! source cannot supply is replaced by a documented default before
//! aggregation, so scoring never fails on unavailable data.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

pub mod aggregate;
pub mod normalize;
pub mod sources;

pub use aggregate::{score_readings, LocationScore, MetricReadings, MetricWeights};
pub use sources::{
    score_location, AdvisoryError, AdvisoryProvider, InfrastructureKind, InfrastructureSource,
    MetricSource, SourceError,
};

/// Earth radius in km
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Scores and weights must have the same length: {scores} scores, {weights} weights")]
    LengthMismatch { scores: usize, weights: usize },
    #[error("Invalid coordinates: lat={lat}, lng={lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },
}

pub type Result<T> = std::result::Result<T, ScoringError>;

/// A WGS84 point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Reject non-finite or out-of-range coordinates
    pub fn validated(lat: f64, lng: f64) -> Result<Self> {
        let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
        let lng_ok = lng.is_finite() && (-180.0..=180.0).contains(&lng);
        if lat_ok && lng_ok {
            Ok(Self { lat, lng })
        } else {
            Err(ScoringError::InvalidCoordinates { lat, lng })
        }
    }

    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Rectangular geographic bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Viewport {
    pub fn is_finite(&self) -> bool {
        self.north.is_finite() && self.south.is_finite() && self.east.is_finite() && self.west.is_finite()
    }

    /// Inclusive containment test (no antimeridian wrap)
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat >= self.south.min(self.north)
            && point.lat <= self.north.max(self.south)
            && point.lng >= self.west.min(self.east)
            && point.lng <= self.east.max(self.west)
    }

    /// Clamp every edge into the valid lat/lng range
    pub fn clamped(&self) -> Self {
        Self {
            north: self.north.clamp(-90.0, 90.0),
            south: self.south.clamp(-90.0, 90.0),
            east: self.east.clamp(-180.0, 180.0),
            west: self.west.clamp(-180.0, 180.0),
        }
    }
}

/// Where a reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleSource {
    /// Live measurement from an upstream service
    Live,
    /// Modelled estimate supplied by the source itself
    Estimated,
    /// Source unavailable, documented default substituted
    Default,
}

/// One raw reading from a metric source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: f64,
    pub source: SampleSource,
}

impl Sample {
    pub fn live(value: f64) -> Self {
        Self { value, source: SampleSource::Live }
    }

    pub fn estimated(value: f64) -> Self {
        Self { value, source: SampleSource::Estimated }
    }
}

/// Existing infrastructure point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Poi {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Clip to [0, 1], mapping NaN to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Round to `decimals` places, half away from zero
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Haversine distance between two points in km
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1 * PI / 180.0;
    let lat2_rad = lat2 * PI / 180.0;
    let dlat = (lat2 - lat1) * PI / 180.0;
    let dlon = (lon2 - lon1) * PI / 180.0;

    let a = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
