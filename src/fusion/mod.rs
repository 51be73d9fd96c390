/// Deterministic fusion of risk signals into one assessment
pub mod engine;
/// Pluggable signal producers and their baseline implementations
pub mod signals;

pub use engine::{Assessment, RiskFusionEngine};
pub use signals::{
    AnomalyDetector, FixedClassifier, FixedDetector, FixedForecaster, ProfileClassifier,
    RiskClassifier, SlopeForecaster, TrendForecaster, ZScoreDetector,
};
