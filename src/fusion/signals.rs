//! Pluggable risk-signal producers
//!
//! Each producer is polymorphic over a fixed capability: probability
//! classification, anomaly detection, or trend forecasting. The fusion
//! engine depends only on these traits, so any algorithm can be swapped
//! in, including the fixed-output producers used in tests and demos.
//!
//! Every baseline producer tolerates a missing model artifact by
//! returning its documented neutral default instead of failing: 0.5 for
//! the classifier, `false` for the detector, `Stable` for the forecaster.

use crate::error::SignalError;
use crate::events::Trend;
use crate::features::FeatureVector;
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Produces a probability of compromise from a feature vector
pub trait RiskClassifier: Send + Sync {
    /// Probability of compromise in [0.0, 1.0]
    fn predict_risk(&self, features: &FeatureVector) -> Result<f64, SignalError>;
}

/// Flags feature vectors that deviate from the learned baseline
pub trait AnomalyDetector: Send + Sync {
    /// True when the vector looks anomalous
    fn is_anomaly(&self, features: &FeatureVector) -> Result<bool, SignalError>;
}

/// Forecasts the direction the endpoint's health is moving
pub trait TrendForecaster: Send + Sync {
    /// Expected direction based on the window's trend statistics
    fn forecast_trend(&self, features: &FeatureVector) -> Result<Trend, SignalError>;
}

/// Name/value view of a feature vector for model artifacts keyed by name
fn feature_pairs(f: &FeatureVector) -> [(&'static str, f64); 11] {
    [
        ("cpu_usage", f.cpu_usage),
        ("memory_usage", f.memory_usage),
        ("disk_io", f.disk_io),
        ("network_traffic", f.network_traffic),
        ("num_processes", f.num_processes),
        ("cpu_mean_1h", f.cpu_mean_1h),
        ("cpu_std_1h", f.cpu_std_1h),
        ("mem_mean_1h", f.mem_mean_1h),
        ("mem_trend", f.mem_trend),
        ("cpu_stress_ratio", f.cpu_stress_ratio),
        ("event_count", f.event_count),
    ]
}

/// Logistic model weights loaded from a JSON artifact
#[derive(Debug, Clone, Deserialize)]
struct RiskModel {
    #[serde(default)]
    bias: f64,
    weights: HashMap<String, f64>,
}

/// Logistic risk classifier over the feature vector
///
/// With no model artifact present it always answers the neutral 0.5,
/// warning once rather than failing.
pub struct ProfileClassifier {
    model: Option<RiskModel>,
    warned_missing: AtomicBool,
}

impl ProfileClassifier {
    /// Load the classifier from a JSON weights artifact
    ///
    /// A missing or unreadable artifact produces an untrained classifier,
    /// not an error; the pipeline must keep running without models.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let model = match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RiskModel>(&contents) {
                Ok(model) => {
                    info!("Loaded risk classifier model from {}", path.display());
                    Some(model)
                }
                Err(e) => {
                    warn!(
                        "Risk classifier artifact {} is invalid ({}), running untrained",
                        path.display(),
                        e
                    );
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            model,
            warned_missing: AtomicBool::new(false),
        }
    }

    /// An untrained classifier that always answers the neutral 0.5
    pub fn untrained() -> Self {
        Self {
            model: None,
            warned_missing: AtomicBool::new(false),
        }
    }
}

impl RiskClassifier for ProfileClassifier {
    fn predict_risk(&self, features: &FeatureVector) -> Result<f64, SignalError> {
        let model = match &self.model {
            Some(model) => model,
            None => {
                if !self.warned_missing.swap(true, Ordering::Relaxed) {
                    warn!("Risk classifier model unavailable, using neutral default 0.5");
                }
                return Ok(0.5);
            }
        };

        let z: f64 = feature_pairs(features)
            .iter()
            .map(|(name, value)| model.weights.get(*name).copied().unwrap_or(0.0) * value)
            .sum::<f64>()
            + model.bias;

        let prob = 1.0 / (1.0 + (-z).exp());
        Ok(prob.clamp(0.0, 1.0))
    }
}

/// Per-feature baseline statistics for the z-score detector
#[derive(Debug, Clone, Deserialize)]
struct FeatureBaseline {
    mean: f64,
    std: f64,
}

/// Anomaly profile loaded from a JSON artifact
#[derive(Debug, Clone, Deserialize)]
struct AnomalyProfile {
    #[serde(default = "default_z_threshold")]
    z_threshold: f64,
    features: HashMap<String, FeatureBaseline>,
}

fn default_z_threshold() -> f64 {
    3.0
}

/// Z-score anomaly detector against a learned per-feature baseline
///
/// Flags a vector when any profiled feature deviates from its baseline
/// mean by more than the profile's z threshold. Untrained: never
/// anomalous.
pub struct ZScoreDetector {
    profile: Option<AnomalyProfile>,
    warned_missing: AtomicBool,
}

impl ZScoreDetector {
    /// Load the detector from a JSON profile artifact; missing or invalid
    /// artifacts produce an untrained detector
    pub fn from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let profile = match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<AnomalyProfile>(&contents) {
                Ok(profile) => {
                    info!("Loaded anomaly profile from {}", path.display());
                    Some(profile)
                }
                Err(e) => {
                    warn!(
                        "Anomaly profile {} is invalid ({}), running untrained",
                        path.display(),
                        e
                    );
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            profile,
            warned_missing: AtomicBool::new(false),
        }
    }

    /// An untrained detector that never flags anything
    pub fn untrained() -> Self {
        Self {
            profile: None,
            warned_missing: AtomicBool::new(false),
        }
    }
}

impl AnomalyDetector for ZScoreDetector {
    fn is_anomaly(&self, features: &FeatureVector) -> Result<bool, SignalError> {
        let profile = match &self.profile {
            Some(profile) => profile,
            None => {
                if !self.warned_missing.swap(true, Ordering::Relaxed) {
                    warn!("Anomaly profile unavailable, reporting no anomalies");
                }
                return Ok(false);
            }
        };

        for (name, value) in feature_pairs(features) {
            if let Some(baseline) = profile.features.get(name) {
                if baseline.std > 0.0
                    && ((value - baseline.mean) / baseline.std).abs() > profile.z_threshold
                {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

/// Forecaster driven by the window's memory slope
///
/// The feature window is ordered newest-first, so a negative slope means
/// memory is rising toward the present (Degrade) and a positive slope
/// means it is falling (Improve). Slopes inside the dead band are Stable.
pub struct SlopeForecaster {
    dead_band: f64,
}

impl Default for SlopeForecaster {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl SlopeForecaster {
    /// Create a forecaster with the given dead band around zero slope
    pub fn new(dead_band: f64) -> Self {
        Self { dead_band }
    }
}

impl TrendForecaster for SlopeForecaster {
    fn forecast_trend(&self, features: &FeatureVector) -> Result<Trend, SignalError> {
        let slope = features.mem_trend;
        if slope < -self.dead_band {
            Ok(Trend::Degrade)
        } else if slope > self.dead_band {
            Ok(Trend::Improve)
        } else {
            Ok(Trend::Stable)
        }
    }
}

/// Classifier with a fixed answer, for tests and demos
pub struct FixedClassifier(pub f64);

impl RiskClassifier for FixedClassifier {
    fn predict_risk(&self, _features: &FeatureVector) -> Result<f64, SignalError> {
        Ok(self.0)
    }
}

/// Detector with a fixed answer, for tests and demos
pub struct FixedDetector(pub bool);

impl AnomalyDetector for FixedDetector {
    fn is_anomaly(&self, _features: &FeatureVector) -> Result<bool, SignalError> {
        Ok(self.0)
    }
}

/// Forecaster with a fixed answer, for tests and demos
pub struct FixedForecaster(pub Trend);

impl TrendForecaster for FixedForecaster {
    fn forecast_trend(&self, _features: &FeatureVector) -> Result<Trend, SignalError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_untrained_classifier_is_neutral() {
        let classifier = ProfileClassifier::untrained();
        let risk = classifier.predict_risk(&FeatureVector::default()).unwrap();
        assert_eq!(risk, 0.5);
    }

    #[test]
    fn test_missing_artifact_produces_untrained_classifier() {
        let classifier = ProfileClassifier::from_file("/nonexistent/model.json");
        let risk = classifier.predict_risk(&FeatureVector::default()).unwrap();
        assert_eq!(risk, 0.5);
    }

    #[test]
    fn test_classifier_loads_weights_and_is_monotone() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"bias": -4.0, "weights": {{"cpu_usage": 0.05, "cpu_stress_ratio": 2.0}}}}"#
        )
        .unwrap();

        let classifier = ProfileClassifier::from_file(file.path());

        let calm = FeatureVector {
            cpu_usage: 10.0,
            ..FeatureVector::default()
        };
        let busy = FeatureVector {
            cpu_usage: 95.0,
            cpu_stress_ratio: 1.0,
            ..FeatureVector::default()
        };

        let calm_risk = classifier.predict_risk(&calm).unwrap();
        let busy_risk = classifier.predict_risk(&busy).unwrap();
        assert!(calm_risk < busy_risk);
        assert!((0.0..=1.0).contains(&calm_risk));
        assert!((0.0..=1.0).contains(&busy_risk));
    }

    #[test]
    fn test_invalid_artifact_falls_back_to_untrained() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let classifier = ProfileClassifier::from_file(file.path());
        assert_eq!(
            classifier.predict_risk(&FeatureVector::default()).unwrap(),
            0.5
        );
    }

    #[test]
    fn test_untrained_detector_never_flags() {
        let detector = ZScoreDetector::untrained();
        let stressed = FeatureVector {
            cpu_usage: 100.0,
            cpu_stress_ratio: 1.0,
            ..FeatureVector::default()
        };
        assert!(!detector.is_anomaly(&stressed).unwrap());
    }

    #[test]
    fn test_zscore_detector_flags_deviation() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"z_threshold": 3.0, "features": {{"cpu_usage": {{"mean": 25.0, "std": 10.0}}}}}}"#
        )
        .unwrap();

        let detector = ZScoreDetector::from_file(file.path());

        let normal = FeatureVector {
            cpu_usage: 30.0,
            ..FeatureVector::default()
        };
        let extreme = FeatureVector {
            cpu_usage: 95.0,
            ..FeatureVector::default()
        };

        assert!(!detector.is_anomaly(&normal).unwrap());
        assert!(detector.is_anomaly(&extreme).unwrap());
    }

    #[test]
    fn test_zscore_detector_ignores_zero_std_baselines() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"features": {{"cpu_usage": {{"mean": 25.0, "std": 0.0}}}}}}"#
        )
        .unwrap();

        let detector = ZScoreDetector::from_file(file.path());
        let extreme = FeatureVector {
            cpu_usage: 100.0,
            ..FeatureVector::default()
        };
        assert!(!detector.is_anomaly(&extreme).unwrap());
    }

    #[test]
    fn test_slope_forecaster_directions() {
        let forecaster = SlopeForecaster::default();

        let rising_memory = FeatureVector {
            mem_trend: -2.0,
            ..FeatureVector::default()
        };
        let falling_memory = FeatureVector {
            mem_trend: 2.0,
            ..FeatureVector::default()
        };
        let flat = FeatureVector::default();

        assert_eq!(
            forecaster.forecast_trend(&rising_memory).unwrap(),
            Trend::Degrade
        );
        assert_eq!(
            forecaster.forecast_trend(&falling_memory).unwrap(),
            Trend::Improve
        );
        assert_eq!(forecaster.forecast_trend(&flat).unwrap(), Trend::Stable);
    }

    #[test]
    fn test_fixed_producers() {
        let features = FeatureVector::default();
        assert_eq!(FixedClassifier(0.9).predict_risk(&features).unwrap(), 0.9);
        assert!(FixedDetector(true).is_anomaly(&features).unwrap());
        assert_eq!(
            FixedForecaster(Trend::Degrade)
                .forecast_trend(&features)
                .unwrap(),
            Trend::Degrade
        );
    }
}
