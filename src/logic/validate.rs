//! Feature Validator - strict schema check against the baseline
//!
//! The request must carry exactly the features the model was trained on.
//! Extra keys are rejected rather than ignored so malformed clients fail
//! loudly instead of silently dropping signal.

use serde_json::{Map, Value};

use super::baseline::BaselineStats;
use super::FeatureVector;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required features: {0:?}")]
    MissingFeature(Vec<String>),

    #[error("unexpected features: {0:?}")]
    UnexpectedFeature(Vec<String>),

    #[error("feature '{feature}' is not a finite number (got {value})")]
    TypeCoercion { feature: String, value: String },
}

/// Validate a raw JSON feature mapping against the baseline schema.
///
/// Pure function; the returned [`FeatureVector`] contains exactly the
/// baseline's features.
pub fn validate(
    raw: &Map<String, Value>,
    baseline: &BaselineStats,
) -> Result<FeatureVector, ValidationError> {
    let missing: Vec<String> = baseline
        .feature_names()
        .filter(|name| !raw.contains_key(*name))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingFeature(missing));
    }

    let unexpected: Vec<String> = raw
        .keys()
        .filter(|name| !baseline.contains(name))
        .cloned()
        .collect();
    if !unexpected.is_empty() {
        return Err(ValidationError::UnexpectedFeature(unexpected));
    }

    let mut features = FeatureVector::new();
    for (name, value) in raw {
        let number = value
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ValidationError::TypeCoercion {
                feature: name.clone(),
                value: value.to_string(),
            })?;
        features.insert(name.clone(), number);
    }
    Ok(features)
}
