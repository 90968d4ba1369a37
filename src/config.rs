//! Configuration module

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::logic::alarm::AlarmConfig;
use crate::logic::drift::{Aggregation, DriftOptions};

/// Application configuration. Read once at startup, static thereafter.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Path to the baseline statistics artifact
    pub baseline_path: PathBuf,

    /// Path to the model artifact
    pub model_path: PathBuf,

    /// Aggregate drift score above which an evaluation counts as a breach
    pub drift_threshold: f64,

    /// Consecutive breaching evaluations before the alarm fires
    pub evaluation_periods: u32,

    /// How per-feature |z| values fold into the aggregate
    pub aggregation_method: Aggregation,

    /// Cap for the zero-stddev sentinel Z-score
    pub zscore_ceiling: f64,

    /// Bound on fire-and-forget side effects (metrics, alerts)
    pub emit_timeout_ms: u64,

    /// Namespace attached to every emitted metric
    pub metrics_namespace: String,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            baseline_path: env::var("BASELINE_PATH")
                .unwrap_or_else(|_| "artifacts/training_stats.json".to_string())
                .into(),

            model_path: env::var("MODEL_PATH")
                .unwrap_or_else(|_| "artifacts/model.json".to_string())
                .into(),

            drift_threshold: env::var("DRIFT_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2.0),

            evaluation_periods: env::var("EVALUATION_PERIODS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),

            aggregation_method: env::var("AGGREGATION_METHOD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(Aggregation::MeanAbsZ),

            zscore_ceiling: env::var("ZSCORE_CEILING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1e6),

            emit_timeout_ms: env::var("EMIT_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),

            metrics_namespace: env::var("METRICS_NAMESPACE")
                .unwrap_or_else(|_| "driftguard".to_string()),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn drift_options(&self) -> DriftOptions {
        DriftOptions {
            aggregation: self.aggregation_method,
            zscore_ceiling: self.zscore_ceiling,
        }
    }

    pub fn alarm_config(&self) -> AlarmConfig {
        AlarmConfig {
            threshold: self.drift_threshold,
            evaluation_periods: self.evaluation_periods,
        }
    }

    pub fn emit_timeout(&self) -> Duration {
        Duration::from_millis(self.emit_timeout_ms)
    }
}
