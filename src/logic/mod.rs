//! Core logic: baseline statistics, validation, drift scoring, the model
//! boundary, alarm evaluation, and the metric/alert sinks.

pub mod alarm;
pub mod baseline;
pub mod drift;
pub mod metrics;
pub mod model;
pub mod validate;

use std::collections::BTreeMap;

/// Validated per-request features, keyed by feature name.
///
/// Ordered map so reports and metric emission iterate deterministically.
pub type FeatureVector = BTreeMap<String, f64>;
