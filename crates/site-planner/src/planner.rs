//! Planning pipeline: sanitize → sample → score → rank → advise

use crate::advisory::{advise, SuggestionOrigin};
use crate::grid::sample_grid;
use crate::ranker::{build_candidates, prioritize};
use crate::{
    PlanningContext, PlanningDebug, PlanningError, PlanningRequest, PlanningResponse,
    ResolvedConstraints, Result, DEFAULT_HAZARD, DEFAULT_INFRASTRUCTURE_TYPE,
    DEFAULT_MAX_DISTANCE_KM, DEFAULT_MAX_SUGGESTIONS, GRID_STEPS, MAX_CANDIDATES_FOR_ADVISORY,
    MAX_SUGGESTIONS_LIMIT, MIN_MAX_DISTANCE_KM,
};
use futures::future::join_all;
use std::sync::Arc;
use suitability_core::{
    score_location, AdvisoryProvider, GeoPoint, InfrastructureKind, InfrastructureSource,
    LocationScore, MetricSource, Poi, ScoringError, Viewport,
};
use tracing::{info, warn};

/// Number of ranked cells echoed in the debug block
const DEBUG_PREVIEW_LEN: usize = 5;

/// Apply clamps and defaults to a raw request
pub fn sanitize_request(request: PlanningRequest) -> Result<PlanningContext> {
    let viewport = request.viewport.ok_or(PlanningError::MissingViewport)?;
    if !viewport.is_finite() {
        return Err(PlanningError::InvalidViewport);
    }

    let infrastructure_type = request
        .infrastructure_type
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_INFRASTRUCTURE_TYPE.to_string());

    let mut hazards: Vec<String> = Vec::new();
    for hazard in request.hazards.unwrap_or_default() {
        let hazard = hazard.trim().to_lowercase();
        if !hazard.is_empty() && !hazards.contains(&hazard) {
            hazards.push(hazard);
        }
    }
    if hazards.is_empty() {
        hazards.push(DEFAULT_HAZARD.to_string());
    }

    // Fractions truncate; zero and NaN take the default
    let max_suggestions = match request.max_suggestions {
        Some(n) if !n.is_nan() && n != 0.0 => {
            n.trunc().clamp(1.0, MAX_SUGGESTIONS_LIMIT as f64) as usize
        }
        _ => DEFAULT_MAX_SUGGESTIONS,
    };

    let constraints = request.constraints.unwrap_or_default();
    let max_distance_km = constraints
        .max_distance_km
        .filter(|d| d.is_finite())
        .map(|d| d.max(MIN_MAX_DISTANCE_KM))
        .unwrap_or(DEFAULT_MAX_DISTANCE_KM);

    Ok(PlanningContext {
        viewport: viewport.clamped(),
        infrastructure_type,
        hazards,
        max_suggestions,
        constraints: ResolvedConstraints {
            max_distance_km,
            budget_level: constraints.budget_level.unwrap_or_default(),
            max_sites: constraints.max_sites,
        },
        include_debug: request.include_debug,
    })
}

/// Hazard-aware infrastructure site planner
#[derive(Clone)]
pub struct SitePlanner {
    metrics: Arc<dyn MetricSource>,
    infrastructure: Arc<dyn InfrastructureSource>,
    advisory: Option<Arc<dyn AdvisoryProvider>>,
}

impl SitePlanner {
    pub fn new(metrics: Arc<dyn MetricSource>, infrastructure: Arc<dyn InfrastructureSource>) -> Self {
        Self {
            metrics,
            infrastructure,
            advisory: None,
        }
    }

    pub fn with_advisory(mut self, advisory: Option<Arc<dyn AdvisoryProvider>>) -> Self {
        self.advisory = advisory;
        self
    }

    pub fn has_advisory(&self) -> bool {
        self.advisory.is_some()
    }

    /// Score a single location with this planner's metric source
    pub async fn score(&self, point: GeoPoint) -> std::result::Result<LocationScore, ScoringError> {
        score_location(self.metrics.as_ref(), point).await
    }

    async fn fetch_infrastructure(&self, viewport: &Viewport, kind: InfrastructureKind) -> Vec<Poi> {
        match self.infrastructure.points(viewport, kind).await {
            Ok(pois) => pois,
            Err(e) => {
                warn!("Infrastructure lookup for {} failed: {}", kind.label(), e);
                Vec::new()
            }
        }
    }

    /// Run the full planning pipeline.
    ///
    /// Only validation errors escape; collaborator failures degrade to
    /// defaults or the ranked fallback.
    pub async fn suggest_infrastructure_sites(&self, request: PlanningRequest) -> Result<PlanningResponse> {
        let ctx = sanitize_request(request)?;
        let points = sample_grid(&ctx.viewport, GRID_STEPS);
        info!(
            "Planning {} sites for {:?}: {} sampled points",
            ctx.infrastructure_type,
            ctx.hazards,
            points.len()
        );

        let kind = InfrastructureKind::parse(&ctx.infrastructure_type);
        let scoring = join_all(points.iter().map(|p| self.score(*p)));
        let (pois, scores) = tokio::join!(self.fetch_infrastructure(&ctx.viewport, kind), scoring);

        let scored = points
            .iter()
            .copied()
            .zip(scores)
            .map(|(point, score)| score.map(|s| (point, s)))
            .collect::<std::result::Result<Vec<_>, ScoringError>>()?;

        let candidates = build_candidates(
            &scored,
            &ctx.hazards,
            &pois,
            ctx.constraints.max_distance_km,
        );
        let mut prioritized = prioritize(candidates);
        let candidate_count = prioritized.len();
        prioritized.truncate(MAX_CANDIDATES_FOR_ADVISORY);
        info!(
            "{} candidates above threshold ({} existing facilities)",
            candidate_count,
            pois.len()
        );

        let outcome = advise(self.advisory.as_deref(), &ctx, &prioritized).await;
        let path = match outcome.origin {
            SuggestionOrigin::Advisory => "advisory",
            SuggestionOrigin::Fallback => "fallback",
        };
        info!("Returning {} suggestions via {}", outcome.suggestions.len(), path);

        let debug = ctx.include_debug.then(|| PlanningDebug {
            candidate_count,
            sampled_points: points.len(),
            top_candidates_preview: prioritized.iter().take(DEBUG_PREVIEW_LEN).cloned().collect(),
        });

        Ok(PlanningResponse {
            suggestions: outcome.suggestions,
            summary: outcome.summary,
            generated_at: chrono::Utc::now().to_rfc3339(),
            context: ctx,
            debug,
        })
    }
}

/// Export suggestions as a GeoJSON FeatureCollection of points
pub fn to_geojson(response: &PlanningResponse) -> serde_json::Value {
    let features: Vec<serde_json::Value> = response
        .suggestions
        .iter()
        .map(|s| {
            serde_json::json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [s.lng, s.lat]
                },
                "properties": {
                    "id": s.id,
                    "priority": s.priority,
                    "hazards": s.hazards,
                    "suggested_infrastructure": s.suggested_infrastructure,
                    "reason": s.reason,
                }
            })
        })
        .collect();

    serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
        "properties": {
            "summary": response.summary,
            "generated_at": response.generated_at,
            "infrastructure_type": response.context.infrastructure_type,
        }
    })
}
