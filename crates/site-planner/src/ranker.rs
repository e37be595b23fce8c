//! Candidate ranking: hazard × exposure × under-coverage

use crate::hazard::{hazard_breakdown, mean, HazardInputs};
use crate::{CandidateCell, CellMetrics, MIN_PRIORITY_THRESHOLD};
use std::collections::HashMap;
use suitability_core::{clamp_unit, haversine_km, GeoPoint, LocationScore, Poi};
use tracing::debug;

/// Population exposure in [0, 1]; saturates near 10,000 people/km²
pub fn exposure_score(population_density: f64) -> f64 {
    clamp_unit((population_density + 1.0).log10() / 4.0)
}

/// Under-coverage in [0, 1]. No facility at all counts as fully underserved.
pub fn underserved_score(nearest_km: Option<f64>, max_distance_km: f64) -> f64 {
    match nearest_km {
        None => 1.0,
        Some(d) => clamp_unit(d / max_distance_km),
    }
}

/// Great-circle distance to the closest facility, None when the list is empty
pub fn nearest_distance_km(point: &GeoPoint, pois: &[Poi]) -> Option<f64> {
    pois.iter()
        .map(|poi| haversine_km(point.lat, point.lng, poi.lat, poi.lng))
        .filter(|d| d.is_finite())
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
}

/// Nearest-facility distances memoized by coordinates quantized to 3 decimals.
///
/// Lives for one planning request only.
#[derive(Debug, Default)]
pub struct DistanceMemo {
    entries: HashMap<String, Option<f64>>,
    computed: usize,
}

impl DistanceMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(point: &GeoPoint) -> String {
        format!("{:.3}_{:.3}", point.lat, point.lng)
    }

    pub fn nearest(&mut self, point: &GeoPoint, pois: &[Poi]) -> Option<f64> {
        let key = Self::key(point);
        if let Some(cached) = self.entries.get(&key) {
            return *cached;
        }
        let distance = nearest_distance_km(point, pois);
        self.computed += 1;
        self.entries.insert(key, distance);
        distance
    }

    /// Number of full POI scans performed
    pub fn computed(&self) -> usize {
        self.computed
    }
}

fn candidate_notes(population_density: f64, nearest_km: Option<f64>, max_distance_km: f64) -> String {
    let distance_text = match nearest_km {
        None => "no nearby infrastructure".to_string(),
        Some(d) => format!("{:.1}km to nearest site", d),
    };
    format!(
        "Pop density {} ppl/km², {}, target coverage {}km",
        population_density.round(),
        distance_text,
        max_distance_km
    )
}

/// Build one candidate cell per scored grid point.
///
/// `scored` must be in grid order; the index becomes the `cell_<i>` id.
pub fn build_candidates(
    scored: &[(GeoPoint, LocationScore)],
    hazards: &[String],
    pois: &[Poi],
    max_distance_km: f64,
) -> Vec<CandidateCell> {
    let mut memo = DistanceMemo::new();

    let cells: Vec<CandidateCell> = scored
        .iter()
        .enumerate()
        .map(|(index, (point, score))| {
            let inputs = HazardInputs::from_score(score);
            let breakdown = hazard_breakdown(hazards, &inputs);
            let hazard_score = mean(breakdown.values().copied());

            let population_density = score.scores.urbanization.population_density;
            let exposure = exposure_score(population_density);

            let nearest = memo.nearest(point, pois);
            let underserved = underserved_score(nearest, max_distance_km);

            let priority = hazard_score * exposure * underserved;
            let id = format!("cell_{}", index);

            debug!(
                "{}: hazard={:.3} exposure={:.3} underserved={:.3} priority={:.3}",
                id, hazard_score, exposure, underserved, priority
            );

            CandidateCell {
                id,
                lat: point.lat,
                lng: point.lng,
                hazard_score,
                hazard_breakdown: breakdown,
                exposure_score: exposure,
                underserved_score: underserved,
                priority_score: priority,
                nearest_infrastructure_km: nearest,
                metrics: CellMetrics {
                    population_density,
                    temperature_c: score.scores.temperature.current,
                    soil_moisture: score.scores.water.soil_moisture,
                },
                notes: candidate_notes(population_density, nearest, max_distance_km),
            }
        })
        .collect();

    debug!(
        "Built {} candidates with {} distance scans",
        cells.len(),
        memo.computed()
    );
    cells
}

/// Drop cells under the priority floor and sort the rest descending
pub fn prioritize(mut cells: Vec<CandidateCell>) -> Vec<CandidateCell> {
    cells.retain(|c| c.priority_score >= MIN_PRIORITY_THRESHOLD);
    cells.sort_by(|a, b| {
        b.priority_score
            .partial_cmp(&a.priority_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    cells
}
