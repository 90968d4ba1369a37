//! Metrics Emitter and Alert Sink boundaries
//!
//! Both are fire-and-forget, at-most-once collaborators: the serving path
//! dispatches to them off the response path and a failure is logged, never
//! propagated. The default implementations write structured tracing events;
//! production deployments swap in a real metric store / notifier.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::alarm::AlarmEvent;
use super::drift::DriftReport;
use super::FeatureVector;

#[derive(Debug, thiserror::Error)]
#[error("metric emission failed: {0}")]
pub struct MetricsError(pub String);

#[derive(Debug, thiserror::Error)]
#[error("alert delivery failed: {0}")]
pub struct AlertError(pub String);

/// Named numeric observation sink. No retries; delivery is at-most-once.
#[async_trait]
pub trait MetricsEmitter: Send + Sync {
    async fn emit(
        &self,
        namespace: &str,
        metric: &str,
        value: f64,
        dimensions: &[(String, String)],
        timestamp: DateTime<Utc>,
    ) -> Result<(), MetricsError>;
}

/// Alert transition sink. Downstream fan-out (mail, chat) is external.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, event: &AlarmEvent) -> Result<(), AlertError>;
}

/// Default emitter: structured log lines under the `driftguard::metrics`
/// target, one per observation.
pub struct LogEmitter;

#[async_trait]
impl MetricsEmitter for LogEmitter {
    async fn emit(
        &self,
        namespace: &str,
        metric: &str,
        value: f64,
        dimensions: &[(String, String)],
        timestamp: DateTime<Utc>,
    ) -> Result<(), MetricsError> {
        tracing::info!(
            target: "driftguard::metrics",
            namespace,
            metric,
            value,
            dimensions = ?dimensions,
            timestamp = %timestamp.to_rfc3339(),
            "metric"
        );
        Ok(())
    }
}

/// Default alert sink: structured log lines under `driftguard::alerts`.
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn notify(&self, event: &AlarmEvent) -> Result<(), AlertError> {
        tracing::warn!(
            target: "driftguard::alerts",
            alert_id = %event.id,
            kind = ?event.kind,
            score = event.score,
            threshold = event.threshold,
            "alert transition"
        );
        Ok(())
    }
}

/// Emit the full per-request metric set: the prediction, the aggregate drift
/// score, and one observation per feature value.
///
/// Each emission is independent; a failing one is logged and the rest still
/// go out.
pub async fn emit_request_metrics(
    emitter: &dyn MetricsEmitter,
    namespace: &str,
    prediction: f64,
    report: &DriftReport,
    features: &FeatureVector,
    timestamp: DateTime<Utc>,
) {
    let mut observations: Vec<(String, f64, Vec<(String, String)>)> = vec![
        ("prediction".to_string(), prediction, vec![]),
        ("drift_score".to_string(), report.aggregate, vec![]),
    ];
    for (name, &value) in features {
        observations.push((
            "feature_value".to_string(),
            value,
            vec![("feature".to_string(), name.clone())],
        ));
    }

    for (metric, value, dimensions) in observations {
        if let Err(e) = emitter
            .emit(namespace, &metric, value, &dimensions, timestamp)
            .await
        {
            tracing::warn!(metric, error = %e, "dropping metric");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::drift::DriftReport;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmitter {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl MetricsEmitter for CountingEmitter {
        async fn emit(
            &self,
            _namespace: &str,
            _metric: &str,
            _value: f64,
            _dimensions: &[(String, String)],
            _timestamp: DateTime<Utc>,
        ) -> Result<(), MetricsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(MetricsError("sink down".into()))
            } else {
                Ok(())
            }
        }
    }

    fn report() -> DriftReport {
        DriftReport {
            per_feature: BTreeMap::from([("bedrooms".to_string(), 1.0)]),
            aggregate: 1.0,
        }
    }

    #[tokio::test]
    async fn emits_prediction_drift_and_per_feature_metrics() {
        let emitter = CountingEmitter {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let features = BTreeMap::from([("bedrooms".to_string(), 4.0)]);
        emit_request_metrics(&emitter, "driftguard", 645000.0, &report(), &features, Utc::now())
            .await;
        // prediction + drift_score + one feature
        assert_eq!(emitter.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failing_emitter_does_not_short_circuit() {
        let emitter = CountingEmitter {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let features = BTreeMap::from([("bedrooms".to_string(), 4.0)]);
        emit_request_metrics(&emitter, "driftguard", 645000.0, &report(), &features, Utc::now())
            .await;
        assert_eq!(emitter.calls.load(Ordering::SeqCst), 3);
    }
}
