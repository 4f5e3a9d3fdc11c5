//! API handlers for prediction and health

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::model::ModelHandle;
use crate::pipeline::Prediction;

/// Shared application state
pub struct AppState {
    pub model: ModelHandle,
}

/// Prediction request
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

/// Prediction response
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Input text as received
    pub text: String,
    /// Predicted label
    pub prediction: String,
    /// Highest class probability in the row
    pub probability: f64,
    /// Probability per label
    pub probabilities: BTreeMap<String, f64>,
}

impl PredictResponse {
    fn new(text: String, prediction: Prediction) -> Self {
        Self {
            text,
            prediction: prediction.label,
            probability: prediction.confidence,
            probabilities: prediction.probabilities.into_iter().collect(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_type: String,
    pub classes: Vec<String>,
    pub trained_at: Option<String>,
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(msg: &str) -> Self {
        Self {
            error: msg.to_string(),
        }
    }
}

/// POST /predict - Classify one message
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected prediction request: {}", rejection.body_text());
            return (rejection.status(), Json(ApiError::new(&rejection.body_text())))
                .into_response();
        }
    };

    match state.model.predict(&req.text) {
        Ok(prediction) => {
            debug!(
                "Predicted {} ({:.3}) for {} chars",
                prediction.label,
                prediction.confidence,
                req.text.len()
            );
            (StatusCode::OK, Json(PredictResponse::new(req.text, prediction))).into_response()
        }
        Err(e) => {
            error!("Prediction failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new(&format!("Prediction failed: {}", e))),
            )
                .into_response()
        }
    }
}

/// GET /health - Model readiness
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        model_type: state.model.model_kind().to_string(),
        classes: state.model.classes().to_vec(),
        trained_at: state.model.trained_at().map(|t| t.to_rfc3339()),
    })
}
