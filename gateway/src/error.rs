//! API error responses

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use site_planner::PlanningError;
use suitability_core::ScoringError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid coordinates")]
    InvalidCoordinates,
    #[error("Invalid viewport")]
    InvalidViewport,
    /// Request body that could not be read as JSON of the expected shape
    #[error("Invalid request body: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Planning(#[from] PlanningError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCoordinates | Self::InvalidViewport | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Planning(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            Self::Scoring(ScoringError::InvalidCoordinates { .. }) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
