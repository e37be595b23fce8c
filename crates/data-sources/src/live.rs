//! Live metric source: POWER temperature, estimators for the rest

use crate::estimates::EstimatedMetricSource;
use crate::power::PowerClient;
use async_trait::async_trait;
use suitability_core::{GeoPoint, MetricSource, Sample};
use tracing::warn;

pub struct LiveMetricSource {
    power: PowerClient,
}

impl LiveMetricSource {
    pub fn new(power: PowerClient) -> Self {
        Self { power }
    }

    fn estimates(&self) -> EstimatedMetricSource {
        EstimatedMetricSource::current()
    }
}

#[async_trait]
impl MetricSource for LiveMetricSource {
    async fn temperature(&self, point: GeoPoint) -> Option<Sample> {
        match self.power.fetch_temperature(point).await {
            Ok(t) => Some(Sample::live(t)),
            Err(e) => {
                warn!("POWER temperature unavailable at ({:.4}, {:.4}): {}", point.lat, point.lng, e);
                None
            }
        }
    }

    async fn soil_moisture(&self, point: GeoPoint) -> Option<Sample> {
        self.estimates().soil_moisture(point).await
    }

    async fn ndvi(&self, point: GeoPoint) -> Option<Sample> {
        self.estimates().ndvi(point).await
    }

    async fn aod(&self, point: GeoPoint) -> Option<Sample> {
        self.estimates().aod(point).await
    }

    async fn population_density(&self, point: GeoPoint) -> Option<Sample> {
        self.estimates().population_density(point).await
    }
}
