//! Prediction handler
//!
//! Orchestrates one request: validate -> predict -> drift score -> respond.
//! Metric emission and alarm evaluation happen on a detached task after the
//! response is assembled; a slow or failing sink can never delay or fail
//! the prediction.

use axum::{extract::State, Json};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::logic::drift::{self, DriftReport};
use crate::logic::metrics::emit_request_metrics;
use crate::logic::validate::validate;
use crate::logic::FeatureVector;
use crate::{AppError, AppResult, AppState};

#[derive(Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub features: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: f64,
    pub drift_score: f64,
    pub timestamp: String,
    pub features_received: FeatureVector,
    pub per_feature_z: BTreeMap<String, f64>,
}

/// Serve one prediction with its drift report.
pub async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> AppResult<Json<PredictResponse>> {
    let raw = req
        .features
        .ok_or_else(|| AppError::BadRequest("missing \"features\" in request body".to_string()))?;

    let baseline = state.baseline.snapshot();
    let features = validate(&raw, &baseline)?;

    let prediction = state.predictor.predict(&features)?;
    let report = drift::score(&features, &baseline, &state.config.drift_options());
    let now = Utc::now();

    tracing::debug!(
        prediction,
        drift_score = report.aggregate,
        "prediction served"
    );

    let response = PredictResponse {
        prediction,
        drift_score: report.aggregate,
        timestamp: now.to_rfc3339_opts(SecondsFormat::Micros, true),
        features_received: features.clone(),
        per_feature_z: report.per_feature.clone(),
    };

    dispatch_side_effects(&state, features, prediction, report, now);

    Ok(Json(response))
}

/// Fire-and-forget: one alarm evaluation, metrics out, alert on transition.
///
/// The alarm update is an in-process mutex write and runs unconditionally,
/// before anything that can block: every observation gets its evaluation
/// even when the sinks are degraded. Only the emit/notify awaits are
/// bounded by the configured timeout; on expiry they are dropped and
/// logged.
fn dispatch_side_effects(
    state: &AppState,
    features: FeatureVector,
    prediction: f64,
    report: DriftReport,
    now: DateTime<Utc>,
) {
    let state = state.clone();
    let timeout = state.config.emit_timeout();

    tokio::spawn(async move {
        let event = state.alarm.evaluate(report.aggregate, now);

        let work = async {
            emit_request_metrics(
                state.metrics.as_ref(),
                &state.config.metrics_namespace,
                prediction,
                &report,
                &features,
                now,
            )
            .await;

            if let Some(event) = event {
                if let Err(e) = state.alerts.notify(&event).await {
                    tracing::warn!(alert_id = %event.id, error = %e, "dropping alert");
                }
            }
        };

        if tokio::time::timeout(timeout, work).await.is_err() {
            tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                "metric/alert dispatch timed out; emissions dropped"
            );
        }
    });
}
