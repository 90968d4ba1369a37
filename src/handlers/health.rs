//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model: String,
    baseline_features: usize,
    timestamp: i64,
}

/// Readiness: the process only starts with artifacts loaded, so a
/// responding endpoint with a non-empty baseline is a serving instance.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let baseline = state.baseline.snapshot();

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        model: state.predictor.status().name,
        baseline_features: baseline.feature_count(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
