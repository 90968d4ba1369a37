//! Baseline Store - per-feature training statistics
//!
//! Loaded once at startup from the artifact the training job writes
//! (`training_stats.json`). Immutable for the lifetime of a model version;
//! a model update replaces the whole snapshot via [`BaselineStore::reload`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum BaselineError {
    #[error("failed to read baseline artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse baseline artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("feature '{feature}' has invalid {stat}: {value}")]
    InvalidStat {
        feature: String,
        stat: &'static str,
        value: f64,
    },

    #[error("feature '{0}' present in feature_means but missing from feature_stds")]
    MissingStd(String),

    #[error("feature '{0}' present in feature_stds but missing from feature_means")]
    MissingMean(String),

    #[error("baseline artifact contains no features")]
    Empty,
}

/// Statistics for a single feature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureStats {
    pub mean: f64,
    pub stddev: f64,
}

/// On-disk artifact format, as written by the training job.
#[derive(Debug, Deserialize)]
struct BaselineFile {
    feature_means: BTreeMap<String, f64>,
    feature_stds: BTreeMap<String, f64>,
    #[serde(default)]
    target_mean: Option<f64>,
    #[serde(default)]
    target_std: Option<f64>,
    #[serde(default)]
    train_score: Option<f64>,
    #[serde(default)]
    test_score: Option<f64>,
    #[serde(default)]
    training_date: Option<String>,
}

/// Immutable per-feature statistics plus training metadata.
#[derive(Debug, Clone, Serialize)]
pub struct BaselineStats {
    features: BTreeMap<String, FeatureStats>,
    pub target_mean: Option<f64>,
    pub target_std: Option<f64>,
    pub train_score: Option<f64>,
    pub test_score: Option<f64>,
    pub training_date: Option<String>,
}

impl BaselineStats {
    /// Build from explicit per-feature stats. Used by tests and the loader.
    pub fn from_features(
        features: BTreeMap<String, FeatureStats>,
    ) -> Result<Self, BaselineError> {
        let stats = Self {
            features,
            target_mean: None,
            target_std: None,
            train_score: None,
            test_score: None,
            training_date: None,
        };
        stats.check()?;
        Ok(stats)
    }

    fn from_file(file: BaselineFile) -> Result<Self, BaselineError> {
        for name in file.feature_means.keys() {
            if !file.feature_stds.contains_key(name) {
                return Err(BaselineError::MissingStd(name.clone()));
            }
        }
        for name in file.feature_stds.keys() {
            if !file.feature_means.contains_key(name) {
                return Err(BaselineError::MissingMean(name.clone()));
            }
        }

        let features = file
            .feature_means
            .into_iter()
            .map(|(name, mean)| {
                let stddev = file.feature_stds[&name];
                (name, FeatureStats { mean, stddev })
            })
            .collect();

        let stats = Self {
            features,
            target_mean: file.target_mean,
            target_std: file.target_std,
            train_score: file.train_score,
            test_score: file.test_score,
            training_date: file.training_date,
        };
        stats.check()?;
        Ok(stats)
    }

    fn check(&self) -> Result<(), BaselineError> {
        if self.features.is_empty() {
            return Err(BaselineError::Empty);
        }
        for (name, stats) in &self.features {
            if !stats.mean.is_finite() {
                return Err(BaselineError::InvalidStat {
                    feature: name.clone(),
                    stat: "mean",
                    value: stats.mean,
                });
            }
            // Zero stddev is allowed (constant feature, handled by the
            // scorer's sentinel policy); NaN or negative is a broken artifact.
            if !stats.stddev.is_finite() || stats.stddev < 0.0 {
                return Err(BaselineError::InvalidStat {
                    feature: name.clone(),
                    stat: "stddev",
                    value: stats.stddev,
                });
            }
        }
        Ok(())
    }

    pub fn parse(json: &str) -> Result<Self, BaselineError> {
        Self::from_file(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, BaselineError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn get(&self, feature: &str) -> Option<&FeatureStats> {
        self.features.get(feature)
    }

    pub fn contains(&self, feature: &str) -> bool {
        self.features.contains_key(feature)
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureStats)> {
        self.features.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Atomically swappable holder for the current [`BaselineStats`] snapshot.
///
/// Readers grab an `Arc` and keep working with it; `reload` parses the new
/// artifact completely before swapping the reference, so in-flight requests
/// never observe a mix of old and new statistics.
pub struct BaselineStore {
    current: RwLock<Arc<BaselineStats>>,
    path: PathBuf,
}

impl BaselineStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, BaselineError> {
        let path = path.into();
        let stats = BaselineStats::load(&path)?;
        tracing::info!(
            features = stats.feature_count(),
            training_date = stats.training_date.as_deref().unwrap_or("unknown"),
            "baseline statistics loaded"
        );
        Ok(Self {
            current: RwLock::new(Arc::new(stats)),
            path,
        })
    }

    /// Build a store around an in-memory snapshot. Used by tests.
    pub fn from_stats(stats: BaselineStats) -> Self {
        Self {
            current: RwLock::new(Arc::new(stats)),
            path: PathBuf::new(),
        }
    }

    pub fn snapshot(&self) -> Arc<BaselineStats> {
        self.current.read().clone()
    }

    /// Re-read the artifact and swap the snapshot in one step.
    ///
    /// On any failure the previous snapshot stays installed.
    pub fn reload(&self) -> Result<Arc<BaselineStats>, BaselineError> {
        let stats = Arc::new(BaselineStats::load(&self.path)?);
        *self.current.write() = stats.clone();
        tracing::info!(
            features = stats.feature_count(),
            training_date = stats.training_date.as_deref().unwrap_or("unknown"),
            "baseline statistics reloaded"
        );
        Ok(stats)
    }
}
