//! HTTP routes for scoring, planning and infrastructure lookup

use crate::error::ApiError;
use crate::recommendations::{recommend, Recommendations};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use site_planner::{PlanningRequest, PlanningResponse, SitePlanner};
use std::sync::Arc;
use suitability_core::{
    GeoPoint, InfrastructureKind, InfrastructureSource, LocationScore, Poi, Viewport,
};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub planner: SitePlanner,
    pub infrastructure: Arc<dyn InfrastructureSource>,
}

/// Map API routes, mounted under `/api/map`
pub fn map_router(state: AppState) -> Router {
    Router::new()
        .route("/score", get(get_score))
        .route("/planning", post(post_planning))
        .route("/infrastructure", get(get_infrastructure))
        .route("/recommendations", get(get_recommendations))
        .with_state(state)
}

/// Coordinates arrive as strings so unparsable input maps to a clean 400
#[derive(Debug, Deserialize)]
pub struct CoordinateQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
}

impl CoordinateQuery {
    fn point(&self) -> Result<GeoPoint, ApiError> {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
        match (parse(&self.lat), parse(&self.lng)) {
            (Some(lat), Some(lng)) => {
                GeoPoint::validated(lat, lng).map_err(|_| ApiError::InvalidCoordinates)
            }
            _ => Err(ApiError::InvalidCoordinates),
        }
    }
}

/// Bounds arrive as strings for the same reason as [`CoordinateQuery`]
#[derive(Debug, Deserialize)]
pub struct InfrastructureQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub north: Option<String>,
    pub south: Option<String>,
    pub east: Option<String>,
    pub west: Option<String>,
}

impl InfrastructureQuery {
    fn viewport(&self) -> Result<Viewport, ApiError> {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<f64>().ok());
        let viewport = match (
            parse(&self.north),
            parse(&self.south),
            parse(&self.east),
            parse(&self.west),
        ) {
            (Some(north), Some(south), Some(east), Some(west)) => Viewport {
                north,
                south,
                east,
                west,
            },
            _ => return Err(ApiError::InvalidViewport),
        };
        if !viewport.is_finite() {
            return Err(ApiError::InvalidViewport);
        }
        Ok(viewport)
    }
}

#[derive(Debug, Serialize)]
pub struct InfrastructureResponse {
    pub pois: Vec<Poi>,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn get_score(
    State(state): State<AppState>,
    Query(query): Query<CoordinateQuery>,
) -> Result<Json<LocationScore>, ApiError> {
    let point = query.point()?;
    let score = state.planner.score(point).await?;
    Ok(Json(score))
}

pub async fn post_planning(
    State(state): State<AppState>,
    body: Result<Json<PlanningRequest>, JsonRejection>,
) -> Result<Json<PlanningResponse>, ApiError> {
    let Json(request) = body?;
    let response = state.planner.suggest_infrastructure_sites(request).await?;
    Ok(Json(response))
}

pub async fn get_infrastructure(
    State(state): State<AppState>,
    Query(query): Query<InfrastructureQuery>,
) -> Result<Json<InfrastructureResponse>, ApiError> {
    let viewport = query.viewport()?;
    let kind_tag = query.kind.unwrap_or_else(|| "hospital".to_string());
    let kind = InfrastructureKind::parse(&kind_tag);

    let response = match state.infrastructure.points(&viewport.clamped(), kind).await {
        Ok(pois) => {
            info!("Found {} {} points", pois.len(), kind.label());
            InfrastructureResponse {
                count: pois.len(),
                pois,
                kind: kind_tag,
                source: "OpenStreetMap Overpass API".to_string(),
                error: None,
            }
        }
        Err(e) => {
            warn!("Infrastructure lookup failed: {}", e);
            InfrastructureResponse {
                pois: Vec::new(),
                kind: kind_tag,
                source: "error".to_string(),
                count: 0,
                error: Some(e.to_string()),
            }
        }
    };
    Ok(Json(response))
}

pub async fn get_recommendations(
    State(state): State<AppState>,
    Query(query): Query<CoordinateQuery>,
) -> Result<Json<Recommendations>, ApiError> {
    let point = query.point()?;
    let score = state.planner.score(point).await?;
    Ok(Json(recommend(&score)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use suitability_core::{MetricSource, Sample, SourceError};
    use tower::ServiceExt;

    struct NoReadings;

    #[async_trait]
    impl MetricSource for NoReadings {
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

    struct OneShelter;

    #[async_trait]
    impl InfrastructureSource for OneShelter {
        async fn points(
            &self,
            _viewport: &Viewport,
            kind: InfrastructureKind,
        ) -> Result<Vec<Poi>, SourceError> {
            if kind == InfrastructureKind::School {
                return Err(SourceError::RateLimited);
            }
            Ok(vec![Poi {
                id: "1".to_string(),
                lat: 40.7,
                lng: -74.0,
                name: "Shelter".to_string(),
                kind: kind.label().to_string(),
            }])
        }
    }

    fn app() -> Router {
        let infrastructure: Arc<dyn InfrastructureSource> = Arc::new(OneShelter);
        let planner = SitePlanner::new(Arc::new(NoReadings), infrastructure.clone());
        Router::new().nest(
            "/api/map",
            map_router(AppState {
                planner,
                infrastructure,
            }),
        )
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    #[tokio::test]
    async fn test_score_with_defaults() {
        let (status, json) = get_json("/api/map/score?lat=40.7128&lng=-74.006").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["overall"]["score"], 83);
        assert_eq!(json["overall"]["grade"], "A");
        assert_eq!(json["scores"]["temperature"]["source"], "default");
    }

    #[tokio::test]
    async fn test_score_rejects_bad_coordinates() {
        for uri in [
            "/api/map/score?lat=abc&lng=-74.0",
            "/api/map/score?lat=40.7",
            "/api/map/score?lat=91&lng=0",
        ] {
            let (status, json) = get_json(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(json["error"], "Invalid coordinates");
        }
    }

    #[tokio::test]
    async fn test_planning_round_trip() {
        let body = serde_json::json!({
            "viewport": {"north": 40.8, "south": 40.6, "east": -73.9, "west": -74.1},
            "infrastructureType": "shelter",
            "hazards": ["flood", "unknown"],
            "maxSuggestions": 3,
            "includeDebug": true
        });
        let request = Request::builder()
            .method("POST")
            .uri("/api/map/planning")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, json) = send(request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["context"]["maxSuggestions"], 3);
        assert_eq!(json["debug"]["sampledPoints"], 49);
        assert!(json["suggestions"].as_array().unwrap().len() <= 3);
        assert!(json["generatedAt"].is_string());
    }

    fn planning_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/map/planning")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_planning_missing_viewport() {
        let (status, json) = send(planning_request(r#"{"hazards": ["flood"]}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing required field: viewport");
    }

    #[tokio::test]
    async fn test_planning_lenient_fields() {
        let viewport = r#""viewport": {"north": 40.8, "south": 40.6, "east": -73.9, "west": -74.1}"#;
        let (status, json) =
            send(planning_request(&format!(r#"{{{}, "maxSuggestions": -1}}"#, viewport))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["context"]["maxSuggestions"], 1);

        let (status, json) = send(planning_request(&format!(
            r#"{{{}, "hazards": null, "constraints": null}}"#,
            viewport
        )))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["context"]["hazards"], serde_json::json!(["flood"]));
        assert_eq!(json["context"]["constraints"]["maxDistanceKm"], 8.0);
        assert_eq!(json["context"]["constraints"]["budgetLevel"], "medium");
    }

    #[tokio::test]
    async fn test_planning_malformed_body_is_json_error() {
        for body in [
            r#"{"viewport": {"north": 40.8, "east": -73.9, "west": -74.1}}"#,
            r#"{"viewport": "nyc"}"#,
            "not json",
        ] {
            let response = app().oneshot(planning_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
            let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
            assert!(content_type.starts_with("application/json"), "{}", content_type);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert!(json["error"]
                .as_str()
                .unwrap()
                .starts_with("Invalid request body"));
        }
    }

    #[tokio::test]
    async fn test_infrastructure_lookup() {
        let (status, json) =
            get_json("/api/map/infrastructure?type=shelters&north=41&south=40&east=-73&west=-75").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 1);
        assert_eq!(json["type"], "shelters");
        assert_eq!(json["pois"][0]["type"], "shelter");
    }

    #[tokio::test]
    async fn test_infrastructure_error_degrades() {
        let (status, json) =
            get_json("/api/map/infrastructure?type=school&north=41&south=40&east=-73&west=-75").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "error");
        assert_eq!(json["count"], 0);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_infrastructure_requires_bounds() {
        for uri in [
            "/api/map/infrastructure?type=hospital&north=41",
            "/api/map/infrastructure?type=hospital&north=abc&south=40&east=-73&west=-75",
            "/api/map/infrastructure?north=NaN&south=40&east=-73&west=-75",
        ] {
            let (status, json) = get_json(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(json["error"], "Invalid viewport");
        }
    }

    #[tokio::test]
    async fn test_recommendations() {
        let (status, json) = get_json("/api/map/recommendations?lat=40.7128&lng=-74.006").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["priority"], "low");
        assert!(json["recommendations"].as_array().unwrap().len() >= 2);
    }
}
