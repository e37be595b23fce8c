//! Collaborator contracts for upstream data and advisory services
//!
//! The scoring and planning pipelines never talk to the network directly.
//! Each external dependency sits behind one of these traits so it can be
//! swapped for a mock in tests or an estimator when offline.

use crate::aggregate::{score_readings, LocationScore, MetricReadings};
use crate::{GeoPoint, Poi, Result, Sample, Viewport};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Upstream data source errors
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Rate limited")]
    RateLimited,
}

/// Advisory service errors
#[derive(Error, Debug, Clone)]
pub enum AdvisoryError {
    #[error("Advisory service not configured")]
    NotConfigured,
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Empty response from advisory service")]
    EmptyResponse,
}

/// Provider of raw environmental readings.
///
/// Every method swallows its own failures: `None` means the reading is
/// unavailable and the documented default will be used instead.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Air temperature in °C
    async fn temperature(&self, point: GeoPoint) -> Option<Sample>;

    /// Volumetric soil moisture fraction (0-1)
    async fn soil_moisture(&self, point: GeoPoint) -> Option<Sample>;

    /// Vegetation index (-1 to 1)
    async fn ndvi(&self, point: GeoPoint) -> Option<Sample>;

    /// Aerosol optical depth (≥ 0)
    async fn aod(&self, point: GeoPoint) -> Option<Sample>;

    /// Population density in people/km²
    async fn population_density(&self, point: GeoPoint) -> Option<Sample>;
}

/// Kind of infrastructure facility, mapped onto an OpenStreetMap tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfrastructureKind {
    Hospital,
    School,
    FireStation,
    Police,
    PowerPlant,
    CoolingCenter,
    Shelter,
    Drainage,
    Kindergarten,
    University,
    NursingHome,
    Orphanage,
}

impl InfrastructureKind {
    /// Parse a request type tag. Unknown tags fall back to hospitals so
    /// coverage can still be computed.
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "hospital" | "hospitals" => Self::Hospital,
            "school" | "schools" => Self::School,
            "fire_station" | "fire_stations" => Self::FireStation,
            "police" => Self::Police,
            "power" | "power_plants" => Self::PowerPlant,
            "cooling_center" | "cooling_centers" => Self::CoolingCenter,
            "shelter" | "shelters" => Self::Shelter,
            "drainage" | "drainage_hub" | "pumping_station" => Self::Drainage,
            "kindergarten" | "kindergartens" => Self::Kindergarten,
            "university" | "universities" => Self::University,
            "nursing_home" | "nursing_homes" => Self::NursingHome,
            "orphanage" | "orphanages" => Self::Orphanage,
            _ => Self::Hospital,
        }
    }

    /// OpenStreetMap `(key, value)` tag
    pub fn osm_tag(&self) -> (&'static str, &'static str) {
        match self {
            Self::Hospital => ("amenity", "hospital"),
            Self::School => ("amenity", "school"),
            Self::FireStation => ("amenity", "fire_station"),
            Self::Police => ("amenity", "police"),
            Self::PowerPlant => ("power", "plant"),
            Self::CoolingCenter => ("amenity", "community_centre"),
            Self::Shelter => ("amenity", "shelter"),
            Self::Drainage => ("man_made", "pumping_station"),
            Self::Kindergarten => ("amenity", "kindergarten"),
            Self::University => ("amenity", "university"),
            Self::NursingHome => ("amenity", "nursing_home"),
            Self::Orphanage => ("social_facility", "group_home"),
        }
    }

    /// Label used for POI type fields and unnamed features
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hospital => "hospital",
            Self::School => "school",
            Self::FireStation => "fire_station",
            Self::Police => "police",
            Self::PowerPlant => "power_plant",
            Self::CoolingCenter => "cooling_center",
            Self::Shelter => "shelter",
            Self::Drainage => "drainage",
            Self::Kindergarten => "kindergarten",
            Self::University => "university",
            Self::NursingHome => "nursing_home",
            Self::Orphanage => "orphanage",
        }
    }
}

/// Provider of existing infrastructure points inside a viewport
#[async_trait]
pub trait InfrastructureSource: Send + Sync {
    async fn points(&self, viewport: &Viewport, kind: InfrastructureKind) -> std::result::Result<Vec<Poi>, SourceError>;
}

/// External advisory service that answers with a JSON document
#[async_trait]
pub trait AdvisoryProvider: Send + Sync {
    /// Send a system instruction and a user payload, returning the raw
    /// JSON content produced by the service.
    async fn complete_json(&self, system: &str, user: &str) -> std::result::Result<String, AdvisoryError>;
}

/// Fetch all five readings concurrently and score the location.
///
/// A missing reading never blocks the others; it is defaulted instead.
pub async fn score_location<S>(source: &S, point: GeoPoint) -> Result<LocationScore>
where
    S: MetricSource + ?Sized,
{
    let (temperature, soil_moisture, ndvi, aod, population_density) = tokio::join!(
        source.temperature(point),
        source.soil_moisture(point),
        source.ndvi(point),
        source.aod(point),
        source.population_density(point),
    );

    let readings = MetricReadings::from_options(temperature, soil_moisture, ndvi, aod, population_density);
    let score = score_readings(point, &readings)?;

    debug!(
        "Scored ({:.4}, {:.4}): {} ({})",
        point.lat,
        point.lng,
        score.overall.score,
        score.overall.grade.as_str()
    );

    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Grade;
    use crate::SampleSource;

    struct Unavailable;

    #[async_trait]
    impl MetricSource for Unavailable {
        async fn temperature(&self, _point: GeoPoint) -> Option<Sample> {
            None
        }
        async fn soil_moisture(&self, _point: GeoPoint) -> Option<Sample> {
            None
        }
        async fn ndvi(&self, _point: GeoPoint) -> Option<Sample> {
            None
        }
        async fn aod(&self, _point: GeoPoint) -> Option<Sample> {
            None
        }
        async fn population_density(&self, _point: GeoPoint) -> Option<Sample> {
            None
        }
    }

    struct HotOnly;

    #[async_trait]
    impl MetricSource for HotOnly {
        async fn temperature(&self, _point: GeoPoint) -> Option<Sample> {
            Some(Sample::live(35.0))
        }
        async fn soil_moisture(&self, _point: GeoPoint) -> Option<Sample> {
            None
        }
        async fn ndvi(&self, _point: GeoPoint) -> Option<Sample> {
            None
        }
        async fn aod(&self, _point: GeoPoint) -> Option<Sample> {
            None
        }
        async fn population_density(&self, _point: GeoPoint) -> Option<Sample> {
            None
        }
    }

    #[tokio::test]
    async fn test_score_location_all_defaults() {
        let score = score_location(&Unavailable, GeoPoint::new(40.7128, -74.006)).await.unwrap();

        assert_eq!(score.location, GeoPoint::new(40.7128, -74.006));
        assert_eq!(score.overall.score, 83);
        assert_eq!(score.overall.grade, Grade::A);
        assert_eq!(score.scores.water.soil_moisture, 0.3);
        assert_eq!(score.scores.urbanization.population_density, 100.0);
        assert_eq!(score.scores.air_quality.source, SampleSource::Default);
    }

    #[tokio::test]
    async fn test_partial_source_does_not_block_others() {
        let score = score_location(&HotOnly, GeoPoint::new(0.0, 0.0)).await.unwrap();
        assert_eq!(score.scores.temperature.score, 0);
        assert_eq!(score.scores.temperature.source, SampleSource::Live);
        assert_eq!(score.scores.vegetation.score, 75);
    }

    #[test]
    fn test_infrastructure_kind_mapping() {
        assert_eq!(InfrastructureKind::parse("Hospitals"), InfrastructureKind::Hospital);
        assert_eq!(InfrastructureKind::parse("pumping_station").osm_tag(), ("man_made", "pumping_station"));
        assert_eq!(InfrastructureKind::parse("cooling_centers").osm_tag(), ("amenity", "community_centre"));
        assert_eq!(InfrastructureKind::parse("power").osm_tag(), ("power", "plant"));
        assert_eq!(InfrastructureKind::parse("shelter").label(), "shelter");
        assert_eq!(InfrastructureKind::parse("helipad"), InfrastructureKind::Hospital);
    }
}
