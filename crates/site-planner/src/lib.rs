//! Infrastructure Site Planner
//!
//! Samples a viewport into a grid of candidate cells, scores each cell for
//! hazard risk, population exposure and distance from existing facilities,
//! and turns the best cells into planning suggestions.
//!
//! # Priority Model
//!
//! ```text
//! Priority(cell) = H · E · U
//! ```
//!
//! | Factor | Range | Description |
//! |--------|-------|-------------|
//! | H      | 0-1   | Mean hazard risk across the requested hazards |
//! | E      | 0-1   | Population exposure, `log10(density + 1) / 4` |
//! | U      | 0-1   | Under-coverage, nearest facility distance / max distance |
//!
//! The product means a cell only ranks highly when all three factors are
//! non-trivial at once.
//!
//! # Pipeline
//!
//! 1. Sanitize the request (clamps, defaults, deduplicated hazards)
//! 2. Sample a 7×7 grid over the viewport
//! 3. Score every grid point concurrently, fetch facilities in parallel
//! 4. Rank cells, drop those under the priority floor, cap at 60
//! 5. Ask the advisory service, or fall back to the deterministic top-N

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use suitability_core::{ScoringError, Viewport};
use thiserror::Error;

pub mod advisory;
pub mod grid;
pub mod hazard;
pub mod loader;
pub mod planner;
pub mod ranker;

pub use planner::{sanitize_request, SitePlanner};

/// Grid resolution per axis (7×7 = 49 cells)
pub const GRID_STEPS: usize = 7;

/// Maximum number of ranked cells handed to the advisory stage
pub const MAX_CANDIDATES_FOR_ADVISORY: usize = 60;

/// Cells below this priority are discarded
pub const MIN_PRIORITY_THRESHOLD: f64 = 0.05;

/// Target coverage distance when the request does not set one
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 8.0;

/// Smallest accepted coverage distance
pub const MIN_MAX_DISTANCE_KM: f64 = 1.0;

pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;
pub const MAX_SUGGESTIONS_LIMIT: usize = 10;

pub const DEFAULT_INFRASTRUCTURE_TYPE: &str = "shelter";
pub const DEFAULT_HAZARD: &str = "flood";

/// Fallback priority tier thresholds
pub const HIGH_PRIORITY_THRESHOLD: f64 = 0.45;
pub const MEDIUM_PRIORITY_THRESHOLD: f64 = 0.25;

#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("Missing required field: viewport")]
    MissingViewport,
    #[error("Invalid viewport: all bounds must be finite numbers")]
    InvalidViewport,
    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No infrastructure points found in input")]
    NoPoints,
}

impl PlanningError {
    /// Errors caused by the caller's input rather than the system
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::MissingViewport | Self::InvalidViewport)
    }
}

pub type Result<T> = std::result::Result<T, PlanningError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// Optional constraints as supplied by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningConstraints {
    #[serde(default)]
    pub max_distance_km: Option<f64>,
    #[serde(default)]
    pub budget_level: Option<BudgetLevel>,
    #[serde(default)]
    pub max_sites: Option<u32>,
}

/// Raw planning request, before sanitization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningRequest {
    #[serde(default)]
    pub viewport: Option<Viewport>,
    #[serde(default)]
    pub infrastructure_type: Option<String>,
    /// `null` and absent both mean the default hazard
    #[serde(default)]
    pub hazards: Option<Vec<String>>,
    /// Signed so out-of-range values can be clamped instead of rejected
    #[serde(default)]
    pub max_suggestions: Option<f64>,
    #[serde(default)]
    pub constraints: Option<PlanningConstraints>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub include_debug: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Constraints with every default applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConstraints {
    pub max_distance_km: f64,
    pub budget_level: BudgetLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_sites: Option<u32>,
}

/// Sanitized request, echoed back to the caller as response context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningContext {
    pub viewport: Viewport,
    pub infrastructure_type: String,
    pub hazards: Vec<String>,
    pub max_suggestions: usize,
    pub constraints: ResolvedConstraints,
    #[serde(skip)]
    pub include_debug: bool,
}

/// Raw metrics captured for a candidate cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellMetrics {
    pub population_density: f64,
    pub temperature_c: f64,
    pub soil_moisture: f64,
}

/// One sampled grid point with its ranking factors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateCell {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    /// Mean of the hazard breakdown (0-1)
    pub hazard_score: f64,
    /// Per-hazard risk (0-1)
    pub hazard_breakdown: BTreeMap<String, f64>,
    /// Population exposure (0-1)
    pub exposure_score: f64,
    /// Distance-based under-coverage (0-1)
    pub underserved_score: f64,
    /// H · E · U
    pub priority_score: f64,
    /// None when no facility exists in the viewport
    pub nearest_infrastructure_km: Option<f64>,
    pub metrics: CellMetrics,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_score(priority_score: f64) -> Self {
        if priority_score > HIGH_PRIORITY_THRESHOLD {
            Priority::High
        } else if priority_score > MEDIUM_PRIORITY_THRESHOLD {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

/// Final planning output item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningSuggestion {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub priority: Priority,
    pub hazards: Vec<String>,
    pub suggested_infrastructure: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningDebug {
    pub candidate_count: usize,
    pub sampled_points: usize,
    pub top_candidates_preview: Vec<CandidateCell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningResponse {
    pub suggestions: Vec<PlanningSuggestion>,
    pub summary: String,
    pub generated_at: String,
    pub context: PlanningContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<PlanningDebug>,
}
