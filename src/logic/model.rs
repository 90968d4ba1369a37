//! Predictor boundary - the trained regression model as a black box
//!
//! The serving core only needs `predict(features) -> value`. The default
//! implementation is a standard-scaled linear model loaded from the JSON
//! artifact the training job exports alongside the baseline statistics.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::FeatureVector;

#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model artifact is inconsistent: {0}")]
    BadArtifact(String),

    #[error("feature '{0}' missing from input vector")]
    MissingFeature(String),

    #[error("model produced a non-finite prediction")]
    NonFinitePrediction,
}

/// Status snapshot for the monitor endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub name: String,
    pub feature_count: usize,
    pub prediction_count: u64,
    pub avg_latency_us: f64,
}

/// Black-box model call. The core never inspects the implementation.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictorError>;

    fn status(&self) -> ModelStatus;
}

/// On-disk artifact: a linear regression over standard-scaled features.
#[derive(Debug, Deserialize)]
struct ModelFile {
    #[serde(default)]
    name: Option<String>,
    feature_order: Vec<String>,
    scaler_mean: Vec<f64>,
    scaler_scale: Vec<f64>,
    coefficients: Vec<f64>,
    intercept: f64,
}

pub struct LinearModel {
    name: String,
    feature_order: Vec<String>,
    scaler_mean: Vec<f64>,
    scaler_scale: Vec<f64>,
    coefficients: Vec<f64>,
    intercept: f64,

    // Latency bookkeeping, mirrored in the status endpoint.
    prediction_count: AtomicU64,
    latency_sum_us: AtomicU64,
}

impl LinearModel {
    pub fn parse(json: &str) -> Result<Self, PredictorError> {
        let file: ModelFile = serde_json::from_str(json)?;
        let n = file.feature_order.len();
        if n == 0 {
            return Err(PredictorError::BadArtifact("no features".into()));
        }
        for (field, len) in [
            ("scaler_mean", file.scaler_mean.len()),
            ("scaler_scale", file.scaler_scale.len()),
            ("coefficients", file.coefficients.len()),
        ] {
            if len != n {
                return Err(PredictorError::BadArtifact(format!(
                    "{field} has {len} entries, expected {n}"
                )));
            }
        }
        if file.scaler_scale.iter().any(|&s| s == 0.0 || !s.is_finite()) {
            return Err(PredictorError::BadArtifact(
                "scaler_scale entries must be finite and non-zero".into(),
            ));
        }

        Ok(Self {
            name: file.name.unwrap_or_else(|| "linear-regression".to_string()),
            feature_order: file.feature_order,
            scaler_mean: file.scaler_mean,
            scaler_scale: file.scaler_scale,
            coefficients: file.coefficients,
            intercept: file.intercept,
            prediction_count: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
        })
    }

    pub fn load(path: &Path) -> Result<Self, PredictorError> {
        let raw = std::fs::read_to_string(path)?;
        let model = Self::parse(&raw)?;
        tracing::info!(
            model = %model.name,
            features = model.feature_order.len(),
            "model artifact loaded"
        );
        Ok(model)
    }
}

impl Predictor for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictorError> {
        let start = Instant::now();

        let mut value = self.intercept;
        for (i, name) in self.feature_order.iter().enumerate() {
            let raw = features
                .get(name)
                .copied()
                .ok_or_else(|| PredictorError::MissingFeature(name.clone()))?;
            let scaled = (raw - self.scaler_mean[i]) / self.scaler_scale[i];
            value += scaled * self.coefficients[i];
        }

        if !value.is_finite() {
            return Err(PredictorError::NonFinitePrediction);
        }

        self.prediction_count.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us
            .fetch_add(start.elapsed().as_micros() as u64, Ordering::Relaxed);
        Ok(value)
    }

    fn status(&self) -> ModelStatus {
        let count = self.prediction_count.load(Ordering::Relaxed);
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        ModelStatus {
            name: self.name.clone(),
            feature_count: self.feature_order.len(),
            prediction_count: count,
            avg_latency_us: if count > 0 { sum as f64 / count as f64 } else { 0.0 },
        }
    }
}
