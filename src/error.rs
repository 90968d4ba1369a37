//! Error handling
//!
//! Taxonomy: validation faults are the client's (400, never retried);
//! predictor failures surface as 502 (retry policy belongs to the caller's
//! transport, not here); baseline problems are 503 because the process
//! refuses to serve without statistics. Metric and alert failures never reach this
//! layer: they are logged and swallowed where they happen.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::logic::baseline::BaselineError;
use crate::logic::model::PredictorError;
use crate::logic::validate::ValidationError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("baseline statistics unavailable: {0}")]
    Baseline(#[from] BaselineError),

    #[error("prediction failed: {0}")]
    Predictor(#[from] PredictorError),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Baseline(e) => {
                tracing::error!("baseline error: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "baseline statistics unavailable".to_string(),
                )
            }
            AppError::Predictor(e) => {
                tracing::error!("predictor error: {}", e);
                (StatusCode::BAD_GATEWAY, "prediction failed".to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
