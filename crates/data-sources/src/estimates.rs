//! Deterministic climate estimators
//!
//! Coarse stand-ins for gridded satellite products. Each is a pure function
//! of location and month so results are reproducible.

use async_trait::async_trait;
use chrono::Datelike;
use std::f64::consts::PI;
use suitability_core::{haversine_km, GeoPoint, MetricSource, Sample};

/// Background aerosol optical depth
pub const BACKGROUND_AOD: f64 = 0.15;

/// Mid-point of the regional AOD variation band
pub const AOD_VARIATION: f64 = 0.15;

/// Density floor far from any reference city
pub const REMOTE_DENSITY: f64 = 10.0;

/// Distance over which reference-city density decays to zero
pub const DENSITY_DECAY_KM: f64 = 1000.0;

/// Reference cities: (lat, lng, people/km²)
pub const REFERENCE_CITIES: [(f64, f64, f64); 5] = [
    (40.7128, -74.006, 10752.0),   // New York
    (34.0522, -118.2437, 3276.0),  // Los Angeles
    (41.8781, -87.6298, 4600.0),   // Chicago
    (51.5074, -0.1278, 5700.0),    // London
    (35.6762, 139.6503, 6158.0),   // Tokyo
];

/// Annual cycle in [-1, 1] for a zero-based month
fn seasonal_cycle(month0: u32) -> f64 {
    (f64::from(month0) / 12.0 * PI * 2.0).sin()
}

/// Volumetric soil moisture (0-1) from climate belt and season
pub fn estimate_soil_moisture(lat: f64, month0: u32) -> f64 {
    let abs_lat = lat.abs();
    let base = if abs_lat < 23.5 {
        0.35
    } else if abs_lat < 60.0 {
        0.25
    } else {
        0.15
    };
    (base + seasonal_cycle(month0) * 0.1).clamp(0.0, 1.0)
}

/// NDVI (-1 to 1) from latitude band and season
pub fn estimate_ndvi(lat: f64, month0: u32) -> f64 {
    let abs_lat = lat.abs();
    let base = if abs_lat < 10.0 {
        0.75
    } else if abs_lat < 30.0 {
        0.55
    } else if abs_lat < 60.0 {
        0.45
    } else {
        0.2
    };
    (base + seasonal_cycle(month0) * 0.15).clamp(-1.0, 1.0)
}

/// Land surface temperature (°C) from latitude and hemisphere-aware season
pub fn estimate_surface_temperature(lat: f64, month0: u32) -> f64 {
    let base = 30.0 - (lat.abs() / 90.0) * 25.0;
    let hemisphere = if lat >= 0.0 { 1.0 } else { -1.0 };
    let seasonal = ((f64::from(month0) - 6.0) / 12.0 * PI * 2.0).sin() * 10.0 * hemisphere;
    base + seasonal
}

/// Aerosol optical depth
pub fn estimate_aod() -> f64 {
    BACKGROUND_AOD + AOD_VARIATION
}

/// Population density (people/km²) decaying linearly from the nearest reference city
pub fn estimate_population_density(lat: f64, lng: f64) -> f64 {
    let nearest = REFERENCE_CITIES
        .iter()
        .map(|&(city_lat, city_lng, density)| (haversine_km(lat, lng, city_lat, city_lng), density))
        .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    match nearest {
        Some((distance, density)) => {
            let factor = (1.0 - distance / DENSITY_DECAY_KM).max(0.0);
            (density * factor).round().max(REMOTE_DENSITY)
        }
        None => REMOTE_DENSITY,
    }
}

/// Metric source built only from the estimators above
#[derive(Debug, Clone, Copy)]
pub struct EstimatedMetricSource {
    month0: u32,
}

impl EstimatedMetricSource {
    /// Estimates for a zero-based month (0 = January)
    pub fn for_month(month0: u32) -> Self {
        Self { month0: month0 % 12 }
    }

    /// Estimates for the current UTC month
    pub fn current() -> Self {
        Self::for_month(chrono::Utc::now().month0())
    }

    pub fn month0(&self) -> u32 {
        self.month0
    }
}

#[async_trait]
impl MetricSource for EstimatedMetricSource {
    async fn temperature(&self, point: GeoPoint) -> Option<Sample> {
        Some(Sample::estimated(estimate_surface_temperature(point.lat, self.month0)))
    }

    async fn soil_moisture(&self, point: GeoPoint) -> Option<Sample> {
        Some(Sample::estimated(estimate_soil_moisture(point.lat, self.month0)))
    }

    async fn ndvi(&self, point: GeoPoint) -> Option<Sample> {
        Some(Sample::estimated(estimate_ndvi(point.lat, self.month0)))
    }

    async fn aod(&self, _point: GeoPoint) -> Option<Sample> {
        Some(Sample::estimated(estimate_aod()))
    }

    async fn population_density(&self, point: GeoPoint) -> Option<Sample> {
        Some(Sample::estimated(estimate_population_density(point.lat, point.lng)))
    }
}
