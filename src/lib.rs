//! driftguard - regression serving with feature drift monitoring
//!
//! Serves predictions from a trained regression model and, per request,
//! scores how far the incoming feature vector has drifted from the
//! training distribution. Aggregate drift scores feed a consecutive-breach
//! alarm so a sustained shift raises exactly one alert.
//!
//! # Architecture
//!
//! ```text
//! request ──▶ Validator ──▶ Predictor ──▶ Drift Scorer ──▶ response
//!                                              │
//!                          (detached task) ────┼──▶ Metrics Emitter
//!                                              └──▶ Alarm Evaluator ──▶ Alert Sink
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod logic;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use logic::alarm::AlarmEvaluator;
use logic::baseline::BaselineStore;
use logic::metrics::{AlertSink, MetricsEmitter};
use logic::model::Predictor;

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub baseline: Arc<BaselineStore>,
    pub predictor: Arc<dyn Predictor>,
    pub metrics: Arc<dyn MetricsEmitter>,
    pub alerts: Arc<dyn AlertSink>,
    pub alarm: Arc<AlarmEvaluator>,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/predict", post(handlers::predict::predict))
        .route("/api/v1/monitor/status", get(handlers::monitor::status))
        .route(
            "/api/v1/admin/baseline/reload",
            post(handlers::monitor::reload_baseline),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
