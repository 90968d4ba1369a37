//! Drift Scorer - Z-score deviation from the training baseline
//!
//! For each feature: `z = (x - mean) / stddev`. The aggregate is the mean
//! (or max, configurable) of absolute per-feature Z-scores.
//!
//! Zero-stddev policy: a constant training feature makes the Z-score
//! undefined. An exact match scores 0; any mismatch scores a signed sentinel
//! capped at `zscore_ceiling`, so a degenerate baseline still signals
//! anomaly without ever pushing NaN or infinity into the aggregate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::baseline::BaselineStats;
use super::FeatureVector;

/// How per-feature |z| values are folded into the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Aggregation {
    MeanAbsZ,
    MaxAbsZ,
}

impl std::str::FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean-abs-z" => Ok(Aggregation::MeanAbsZ),
            "max-abs-z" => Ok(Aggregation::MaxAbsZ),
            other => Err(format!("unknown aggregation method '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DriftOptions {
    pub aggregation: Aggregation,
    /// Cap for the zero-stddev sentinel.
    pub zscore_ceiling: f64,
}

impl Default for DriftOptions {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::MeanAbsZ,
            zscore_ceiling: 1e6,
        }
    }
}

/// Per-request drift report. Emitted as metrics and echoed in the response,
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    pub per_feature: BTreeMap<String, f64>,
    pub aggregate: f64,
}

/// Score a validated feature vector against the baseline.
///
/// Pure and deterministic; identical inputs produce bit-identical reports.
/// Features without a baseline entry are skipped (the validator guarantees
/// there are none on the request path).
pub fn score(features: &FeatureVector, baseline: &BaselineStats, opts: &DriftOptions) -> DriftReport {
    let mut per_feature = BTreeMap::new();

    for (name, &value) in features {
        let Some(stats) = baseline.get(name) else {
            continue;
        };

        let z = if stats.stddev == 0.0 {
            let delta = value - stats.mean;
            if delta == 0.0 {
                0.0
            } else {
                opts.zscore_ceiling.copysign(delta)
            }
        } else {
            (value - stats.mean) / stats.stddev
        };

        per_feature.insert(name.clone(), z);
    }

    let aggregate = aggregate(per_feature.values().copied(), opts.aggregation);
    DriftReport {
        per_feature,
        aggregate,
    }
}

fn aggregate(scores: impl Iterator<Item = f64>, method: Aggregation) -> f64 {
    let abs: Vec<f64> = scores.map(f64::abs).collect();
    if abs.is_empty() {
        return 0.0;
    }
    match method {
        Aggregation::MeanAbsZ => abs.iter().sum::<f64>() / abs.len() as f64,
        Aggregation::MaxAbsZ => abs.iter().copied().fold(0.0, f64::max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::baseline::FeatureStats;

    const TOLERANCE: f64 = 1e-9;

    fn baseline(entries: &[(&str, f64, f64)]) -> BaselineStats {
        let features = entries
            .iter()
            .map(|&(name, mean, stddev)| (name.to_string(), FeatureStats { mean, stddev }))
            .collect();
        BaselineStats::from_features(features).unwrap()
    }

    fn vector(entries: &[(&str, f64)]) -> FeatureVector {
        entries
            .iter()
            .map(|&(name, value)| (name.to_string(), value))
            .collect()
    }

    fn house_baseline() -> BaselineStats {
        baseline(&[("bedrooms", 3.0, 1.0), ("sqft", 2000.0, 500.0)])
    }

    #[test]
    fn at_mean_scores_zero() {
        let report = score(
            &vector(&[("bedrooms", 3.0), ("sqft", 2000.0)]),
            &house_baseline(),
            &DriftOptions::default(),
        );
        assert!(report.aggregate.abs() < TOLERANCE);
        assert!(report.per_feature.values().all(|z| z.abs() < TOLERANCE));
    }

    #[test]
    fn single_offset_dilutes_by_feature_count() {
        // One feature at k sigma, the other at the mean: mean-abs-z gives k/2.
        let report = score(
            &vector(&[("bedrooms", 6.0), ("sqft", 2000.0)]),
            &house_baseline(),
            &DriftOptions::default(),
        );
        assert!((report.aggregate - 1.5).abs() < TOLERANCE);
    }

    #[test]
    fn offset_is_symmetric() {
        let opts = DriftOptions::default();
        let up = score(&vector(&[("bedrooms", 5.0), ("sqft", 2000.0)]), &house_baseline(), &opts);
        let down = score(&vector(&[("bedrooms", 1.0), ("sqft", 2000.0)]), &house_baseline(), &opts);
        assert_eq!(
            up.per_feature["bedrooms"].abs(),
            down.per_feature["bedrooms"].abs()
        );
        assert_eq!(up.aggregate, down.aggregate);
    }

    #[test]
    fn high_drift_scenario() {
        // Known scenario: {10, 5000} against the house baseline gives
        // z = [7.0, 6.0] and a mean-abs-z aggregate of 6.5.
        let report = score(
            &vector(&[("bedrooms", 10.0), ("sqft", 5000.0)]),
            &house_baseline(),
            &DriftOptions::default(),
        );
        assert!((report.per_feature["bedrooms"] - 7.0).abs() < TOLERANCE);
        assert!((report.per_feature["sqft"] - 6.0).abs() < TOLERANCE);
        assert!((report.aggregate - 6.5).abs() < TOLERANCE);
        assert!(report.aggregate > 2.0);
    }

    #[test]
    fn max_aggregation_takes_largest() {
        let opts = DriftOptions {
            aggregation: Aggregation::MaxAbsZ,
            ..Default::default()
        };
        let report = score(
            &vector(&[("bedrooms", 10.0), ("sqft", 5000.0)]),
            &house_baseline(),
            &opts,
        );
        assert!((report.aggregate - 7.0).abs() < TOLERANCE);
    }

    #[test]
    fn zero_stddev_exact_match_scores_zero() {
        let b = baseline(&[("constant", 5.0, 0.0)]);
        let report = score(&vector(&[("constant", 5.0)]), &b, &DriftOptions::default());
        assert_eq!(report.per_feature["constant"], 0.0);
        assert_eq!(report.aggregate, 0.0);
    }

    #[test]
    fn zero_stddev_mismatch_hits_ceiling() {
        let opts = DriftOptions {
            zscore_ceiling: 100.0,
            ..Default::default()
        };
        let b = baseline(&[("constant", 5.0, 0.0), ("normal", 0.0, 1.0)]);

        let report = score(&vector(&[("constant", 5.1), ("normal", 0.0)]), &b, &opts);
        assert_eq!(report.per_feature["constant"], 100.0);
        assert!(report.aggregate.is_finite());
        assert_eq!(report.aggregate, 50.0);

        // Below-mean mismatch carries the sign, same magnitude.
        let report = score(&vector(&[("constant", 4.9), ("normal", 0.0)]), &b, &opts);
        assert_eq!(report.per_feature["constant"], -100.0);
        assert_eq!(report.aggregate, 50.0);
    }

    #[test]
    fn empty_vector_scores_zero() {
        let report = score(&FeatureVector::new(), &house_baseline(), &DriftOptions::default());
        assert_eq!(report.aggregate, 0.0);
        assert!(report.per_feature.is_empty());
    }

    #[test]
    fn identical_inputs_are_bit_identical() {
        let features = vector(&[("bedrooms", 4.7), ("sqft", 2311.3)]);
        let opts = DriftOptions::default();
        let a = score(&features, &house_baseline(), &opts);
        let b = score(&features, &house_baseline(), &opts);
        assert_eq!(a.aggregate.to_bits(), b.aggregate.to_bits());
        for (name, z) in &a.per_feature {
            assert_eq!(z.to_bits(), b.per_feature[name].to_bits());
        }
    }

    #[test]
    fn aggregation_parses_from_config_strings() {
        assert_eq!("mean-abs-z".parse::<Aggregation>().unwrap(), Aggregation::MeanAbsZ);
        assert_eq!("max-abs-z".parse::<Aggregation>().unwrap(), Aggregation::MaxAbsZ);
        assert!("psi".parse::<Aggregation>().is_err());
    }
}
