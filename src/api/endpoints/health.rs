//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub symptoms: usize,
    pub diseases: usize,
}

/// `GET /health`
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
        symptoms: state.predictor.schema().len(),
        diseases: state.predictor.encoder().num_classes(),
    })
}
