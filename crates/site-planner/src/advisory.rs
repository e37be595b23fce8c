//! Advisory stage with deterministic fallback
//!
//! The advisory service is asked to pick sites from the ranked candidates.
//! Anything short of a well-formed reply (no provider, no candidates, an
//! error, empty or invalid JSON) falls back to the top-N ranked cells, so
//! this stage always produces suggestions and a summary.

use crate::{CandidateCell, PlanningContext, PlanningSuggestion, Priority};
use serde::Deserialize;
use suitability_core::{round_to, AdvisoryError, AdvisoryProvider};
use thiserror::Error;
use tracing::{info, warn};

pub const SYSTEM_PROMPT: &str = "You are an expert urban planner and disaster-risk specialist. \
Review structured candidate locations and select the best new infrastructure sites. \
Return ONLY valid JSON matching this schema: {\"suggestions\":[{...}],\"summary\":\"...\"}. \
Suggestions must include id, lat, lng, priority (high|medium|low), hazards array, \
suggested_infrastructure, and 1-2 sentence reason.";

pub const EMPTY_SUMMARY: &str = "No high-priority cells identified inside the viewport. \
Try expanding the map or relaxing constraints.";

pub const MISSING_SUMMARY: &str = "Advisory summary unavailable.";

/// Where the final suggestions came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionOrigin {
    Advisory,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct AdvisoryOutcome {
    pub suggestions: Vec<PlanningSuggestion>,
    pub summary: String,
    pub origin: SuggestionOrigin,
}

/// Reasons an advisory reply is rejected
#[derive(Error, Debug)]
pub enum ReplyError {
    #[error("advisory returned empty content")]
    Empty,
    #[error("advisory reply is not valid: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error("suggestion {0} has out-of-range coordinates")]
    OutOfRange(String),
    #[error(transparent)]
    Provider(#[from] AdvisoryError),
}

#[derive(Debug, Deserialize)]
struct AdvisoryReply {
    suggestions: Vec<PlanningSuggestion>,
    #[serde(default)]
    summary: Option<String>,
}

/// JSON document sent to the advisory service
pub fn advisory_payload(ctx: &PlanningContext, candidates: &[CandidateCell]) -> serde_json::Value {
    let candidates: Vec<serde_json::Value> = candidates
        .iter()
        .map(|c| {
            serde_json::json!({
                "id": c.id,
                "lat": c.lat,
                "lng": c.lng,
                "hazard_score": round_to(c.hazard_score, 2),
                "hazard_breakdown": c.hazard_breakdown,
                "exposure_score": round_to(c.exposure_score, 2),
                "underserved_score": round_to(c.underserved_score, 2),
                "priority_score": round_to(c.priority_score, 2),
                "nearest_infra_km": c.nearest_infrastructure_km,
                "notes": c.notes,
            })
        })
        .collect();

    serde_json::json!({
        "cityViewport": ctx.viewport,
        "hazards": ctx.hazards,
        "infrastructureType": ctx.infrastructure_type,
        "constraints": ctx.constraints,
        "candidates": candidates,
        "maxSuggestions": ctx.max_suggestions,
    })
}

/// Validate a raw advisory reply and truncate it to `max_suggestions`
pub fn parse_reply(
    raw: &str,
    max_suggestions: usize,
) -> std::result::Result<(Vec<PlanningSuggestion>, String), ReplyError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ReplyError::Empty);
    }

    let reply: AdvisoryReply = serde_json::from_str(raw)?;

    if let Some(bad) = reply.suggestions.iter().find(|s| {
        !(s.lat.is_finite() && s.lng.is_finite())
            || !(-90.0..=90.0).contains(&s.lat)
            || !(-180.0..=180.0).contains(&s.lng)
    }) {
        return Err(ReplyError::OutOfRange(bad.id.clone()));
    }

    let mut suggestions = reply.suggestions;
    suggestions.truncate(max_suggestions);

    let summary = reply
        .summary
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| MISSING_SUMMARY.to_string());

    Ok((suggestions, summary))
}

/// Top-N ranked cells mapped directly to suggestions
pub fn fallback_suggestions(ctx: &PlanningContext, candidates: &[CandidateCell]) -> AdvisoryOutcome {
    let suggestions: Vec<PlanningSuggestion> = candidates
        .iter()
        .take(ctx.max_suggestions)
        .map(|cell| PlanningSuggestion {
            id: cell.id.clone(),
            lat: cell.lat,
            lng: cell.lng,
            priority: Priority::from_score(cell.priority_score),
            hazards: ctx.hazards.clone(),
            suggested_infrastructure: ctx.infrastructure_type.clone(),
            reason: cell.notes.clone(),
        })
        .collect();

    let summary = if suggestions.is_empty() {
        EMPTY_SUMMARY.to_string()
    } else {
        format!(
            "Identified {} promising {} sites focusing on {} risk.",
            suggestions.len(),
            ctx.infrastructure_type,
            ctx.hazards.join(", ")
        )
    };

    AdvisoryOutcome {
        suggestions,
        summary,
        origin: SuggestionOrigin::Fallback,
    }
}

async fn request_advice(
    provider: &dyn AdvisoryProvider,
    ctx: &PlanningContext,
    candidates: &[CandidateCell],
) -> std::result::Result<(Vec<PlanningSuggestion>, String), ReplyError> {
    let payload = advisory_payload(ctx, candidates);
    let user = serde_json::to_string_pretty(&payload)?;
    let raw = provider.complete_json(SYSTEM_PROMPT, &user).await?;
    parse_reply(&raw, ctx.max_suggestions)
}

/// Ask the advisory provider, falling back on any failure. Never errors.
pub async fn advise(
    provider: Option<&dyn AdvisoryProvider>,
    ctx: &PlanningContext,
    candidates: &[CandidateCell],
) -> AdvisoryOutcome {
    let Some(provider) = provider else {
        return fallback_suggestions(ctx, candidates);
    };
    if candidates.is_empty() {
        return fallback_suggestions(ctx, candidates);
    }

    match request_advice(provider, ctx, candidates).await {
        Ok((suggestions, summary)) => {
            info!("Advisory returned {} suggestions", suggestions.len());
            AdvisoryOutcome {
                suggestions,
                summary,
                origin: SuggestionOrigin::Advisory,
            }
        }
        Err(e) => {
            warn!("Advisory planning failed, using ranked fallback: {}", e);
            fallback_suggestions(ctx, candidates)
        }
    }
}
