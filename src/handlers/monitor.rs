//! Monitoring handlers: status snapshot and baseline reload

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::logic::alarm::AlarmSnapshot;
use crate::logic::model::ModelStatus;
use crate::{AppResult, AppState};

#[derive(Serialize)]
pub struct BaselineStatus {
    pub feature_count: usize,
    pub features: Vec<String>,
    pub training_date: Option<String>,
    pub train_score: Option<f64>,
    pub test_score: Option<f64>,
}

#[derive(Serialize)]
pub struct MonitorStatus {
    pub alarm: AlarmSnapshot,
    pub baseline: BaselineStatus,
    pub model: ModelStatus,
    pub aggregation_method: crate::logic::drift::Aggregation,
    pub server_time: i64,
}

/// Current alarm phase plus baseline and model descriptors.
pub async fn status(State(state): State<AppState>) -> Json<MonitorStatus> {
    let baseline = state.baseline.snapshot();

    Json(MonitorStatus {
        alarm: state.alarm.snapshot(),
        baseline: BaselineStatus {
            feature_count: baseline.feature_count(),
            features: baseline.feature_names().map(str::to_string).collect(),
            training_date: baseline.training_date.clone(),
            train_score: baseline.train_score,
            test_score: baseline.test_score,
        },
        model: state.predictor.status(),
        aggregation_method: state.config.aggregation_method,
        server_time: Utc::now().timestamp(),
    })
}

#[derive(Serialize)]
pub struct ReloadResponse {
    pub accepted: bool,
    pub feature_count: usize,
    pub training_date: Option<String>,
    pub server_time: i64,
}

/// Re-read the baseline artifact and swap the snapshot atomically.
///
/// On failure the previous statistics keep serving and the error surfaces
/// as 503.
pub async fn reload_baseline(State(state): State<AppState>) -> AppResult<Json<ReloadResponse>> {
    let stats = state.baseline.reload()?;

    Ok(Json(ReloadResponse {
        accepted: true,
        feature_count: stats.feature_count(),
        training_date: stats.training_date.clone(),
        server_time: Utc::now().timestamp(),
    }))
}
