//! Per-hazard risk evaluation
//!
//! Every formula reads the displayed values of a [`LocationScore`]: the
//! 0.1-rounded temperature, the 0.01-rounded soil moisture and the integer
//! water/vegetation percentages.

use std::collections::BTreeMap;
use suitability_core::{clamp_unit, LocationScore};

/// Risk assigned to hazards without a dedicated formula
pub const NEUTRAL_HAZARD_RISK: f64 = 0.35;

/// Inputs consumed by the hazard formulas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HazardInputs {
    pub soil_moisture: f64,
    pub temperature_c: f64,
    /// Water sub-score percentage (0-100)
    pub water_pct: f64,
    /// Vegetation sub-score percentage (0-100)
    pub vegetation_pct: f64,
}

impl HazardInputs {
    pub fn from_score(score: &LocationScore) -> Self {
        Self {
            soil_moisture: score.scores.water.soil_moisture,
            temperature_c: score.scores.temperature.current,
            water_pct: f64::from(score.scores.water.score),
            vegetation_pct: f64::from(score.scores.vegetation.score),
        }
    }
}

/// Risk in [0, 1] for a single hazard name
pub fn hazard_risk(hazard: &str, inputs: &HazardInputs) -> f64 {
    let water_deficit = 1.0 - inputs.water_pct / 100.0;
    match hazard {
        "flood" => clamp_unit((inputs.soil_moisture - 0.25) / 0.45),
        "heatwave" => clamp_unit(
            0.6 * ((inputs.temperature_c - 28.0) / 18.0).max(0.0) + 0.4 * water_deficit,
        ),
        "landslide" => clamp_unit(
            0.6 * (inputs.soil_moisture - 0.3) / 0.4
                + 0.4 * (1.0 - inputs.vegetation_pct / 100.0),
        ),
        "wildfire" => clamp_unit(
            0.4 * (inputs.vegetation_pct / 100.0)
                + 0.4 * water_deficit
                + 0.2 * ((inputs.temperature_c - 25.0) / 15.0).max(0.0),
        ),
        _ => NEUTRAL_HAZARD_RISK,
    }
}

/// Risk per requested hazard. An empty list evaluates flood.
pub fn hazard_breakdown(hazards: &[String], inputs: &HazardInputs) -> BTreeMap<String, f64> {
    if hazards.is_empty() {
        let flood = crate::DEFAULT_HAZARD;
        return BTreeMap::from([(flood.to_string(), hazard_risk(flood, inputs))]);
    }
    hazards
        .iter()
        .map(|h| (h.clone(), hazard_risk(h, inputs)))
        .collect()
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
