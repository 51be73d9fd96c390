//! Risk fusion engine
//!
//! Folds the three signal producers' outputs plus the aggregator's
//! heuristic alerts into a single health assessment. The fold is fully
//! deterministic: the same inputs always produce the same assessment,
//! so a pass can be retried safely at any time.

use crate::config::ThresholdConfig;
use crate::events::{HealthStatus, MetricsSnapshot, Trend};
use crate::features::FeatureVector;
use crate::fusion::signals::{AnomalyDetector, RiskClassifier, TrendForecaster};
use log::warn;

/// Fused outcome of one scoring pass
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    /// Health score in [0, 100], higher is healthier
    pub health_score: u8,
    /// Compromise probability clamped to [0.0, 1.0]
    pub risk_prob: f64,
    /// Overall endpoint status
    pub status: HealthStatus,
    /// Expected direction of change
    pub trend: Trend,
    /// Ordered remediation recommendations, never empty
    pub recommendations: Vec<String>,
    /// The first recommendation, surfaced as the single suggested action
    pub action: String,
}

/// Combines classifier, anomaly and trend signals into one assessment
///
/// Producer failures never propagate: a failing signal is replaced by its
/// neutral default (risk 0.5, no anomaly, stable trend) and the other two
/// signals are still consulted.
pub struct RiskFusionEngine {
    classifier: Box<dyn RiskClassifier>,
    detector: Box<dyn AnomalyDetector>,
    forecaster: Box<dyn TrendForecaster>,
    thresholds: ThresholdConfig,
}

impl RiskFusionEngine {
    /// Create an engine over the given signal producers and thresholds
    pub fn new(
        classifier: Box<dyn RiskClassifier>,
        detector: Box<dyn AnomalyDetector>,
        forecaster: Box<dyn TrendForecaster>,
        thresholds: ThresholdConfig,
    ) -> Self {
        Self {
            classifier,
            detector,
            forecaster,
            thresholds,
        }
    }

    /// Score one endpoint pass
    ///
    /// `heuristic_alerts` are the aggregator's anomaly strings for this
    /// pass; each one costs 10 health points and any of them forces
    /// Compromised status.
    pub fn score(
        &self,
        features: &FeatureVector,
        metrics: &MetricsSnapshot,
        heuristic_alerts: &[String],
    ) -> Assessment {
        let risk_prob = match self.classifier.predict_risk(features) {
            Ok(p) if p.is_finite() => p.clamp(0.0, 1.0),
            Ok(p) => {
                warn!("Risk classifier returned non-finite {}, using neutral 0.5", p);
                0.5
            }
            Err(e) => {
                warn!("Risk classifier failed ({}), using neutral 0.5", e);
                0.5
            }
        };

        let anomaly = match self.detector.is_anomaly(features) {
            Ok(flag) => flag,
            Err(e) => {
                warn!("Anomaly detector failed ({}), assuming no anomaly", e);
                false
            }
        };

        let trend = match self.forecaster.forecast_trend(features) {
            Ok(trend) => trend,
            Err(e) => {
                warn!("Trend forecaster failed ({}), assuming stable", e);
                Trend::Stable
            }
        };

        let mut score = 100.0 - risk_prob * 100.0;
        if anomaly {
            score -= 20.0;
        }
        score -= 10.0 * heuristic_alerts.len() as f64;
        let health_score = score.clamp(0.0, 100.0) as u8;

        let status = if risk_prob > self.thresholds.compromise_risk || !heuristic_alerts.is_empty()
        {
            HealthStatus::Compromised
        } else if anomaly {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };

        let recommendations = self.recommend(metrics, status);
        let action = recommendations[0].clone();

        Assessment {
            health_score,
            risk_prob,
            status,
            trend,
            recommendations,
            action,
        }
    }

    /// Ordered rule evaluation: threshold rules first, then
    /// compromise-level additions, then the status fallbacks
    fn recommend(&self, metrics: &MetricsSnapshot, status: HealthStatus) -> Vec<String> {
        let mut recommendations = Vec::new();

        if metrics.cpu_usage > self.thresholds.cpu_pct {
            recommendations.push("mitigate high-CPU process".to_string());
        }
        if metrics.network_traffic > self.thresholds.network_traffic {
            recommendations.push("block suspicious outbound traffic".to_string());
        }
        if metrics.disk_io > self.thresholds.disk_io {
            recommendations.push("enable ransomware containment".to_string());
        }
        if metrics.file_changes > self.thresholds.file_changes {
            recommendations.push("lock filesystem".to_string());
        }

        if status == HealthStatus::Compromised {
            recommendations.push("isolate endpoint".to_string());
            recommendations.push("run full scan".to_string());
        }

        if recommendations.is_empty() && status == HealthStatus::Warning {
            recommendations.push("monitor closely".to_string());
        }
        if recommendations.is_empty() {
            recommendations.push("no action required".to_string());
        }

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignalError;
    use crate::fusion::signals::{FixedClassifier, FixedDetector, FixedForecaster};
    use quickcheck_macros::quickcheck;

    struct FailingClassifier;

    impl RiskClassifier for FailingClassifier {
        fn predict_risk(&self, _features: &FeatureVector) -> Result<f64, SignalError> {
            Err(SignalError::InferenceFailed("classifier offline".to_string()))
        }
    }

    struct FailingDetector;

    impl AnomalyDetector for FailingDetector {
        fn is_anomaly(&self, _features: &FeatureVector) -> Result<bool, SignalError> {
            Err(SignalError::ModelUnavailable("no profile".to_string()))
        }
    }

    fn engine(risk: f64, anomaly: bool, trend: Trend) -> RiskFusionEngine {
        RiskFusionEngine::new(
            Box::new(FixedClassifier(risk)),
            Box::new(FixedDetector(anomaly)),
            Box::new(FixedForecaster(trend)),
            ThresholdConfig::default(),
        )
    }

    fn quiet_metrics() -> MetricsSnapshot {
        MetricsSnapshot {
            cpu_usage: 20.0,
            memory_usage: 40.0,
            disk_io: 5.0,
            network_traffic: 50.0,
            num_processes: 100,
            file_changes: 0,
        }
    }

    #[test]
    fn test_high_risk_with_hot_cpu_is_compromised() {
        let engine = engine(0.9, false, Trend::Degrade);
        let metrics = MetricsSnapshot {
            cpu_usage: 95.0,
            memory_usage: 90.0,
            disk_io: 10.0,
            network_traffic: 50.0,
            num_processes: 100,
            file_changes: 0,
        };

        let assessment = engine.score(&FeatureVector::default(), &metrics, &[]);

        assert_eq!(assessment.health_score, 10);
        assert_eq!(assessment.status, HealthStatus::Compromised);
        assert_eq!(
            assessment.recommendations,
            vec![
                "mitigate high-CPU process".to_string(),
                "isolate endpoint".to_string(),
                "run full scan".to_string(),
            ]
        );
        assert_eq!(assessment.action, "mitigate high-CPU process");
    }

    #[test]
    fn test_neutral_signals_on_cold_start_are_healthy() {
        let engine = engine(0.0, false, Trend::Stable);

        let assessment = engine.score(&FeatureVector::default(), &quiet_metrics(), &[]);

        assert_eq!(assessment.health_score, 100);
        assert_eq!(assessment.status, HealthStatus::Healthy);
        assert_eq!(assessment.trend, Trend::Stable);
        assert_eq!(assessment.action, "no action required");
    }

    #[test]
    fn test_anomaly_without_high_risk_is_warning() {
        let engine = engine(0.3, true, Trend::Stable);

        let assessment = engine.score(&FeatureVector::default(), &quiet_metrics(), &[]);

        assert_eq!(assessment.health_score, 50);
        assert_eq!(assessment.status, HealthStatus::Warning);
        assert_eq!(assessment.action, "monitor closely");
    }

    #[test]
    fn test_heuristic_alerts_force_compromised_status() {
        let engine = engine(0.1, false, Trend::Stable);
        let alerts = vec!["Suspicious process detected: xmrig".to_string()];

        let assessment = engine.score(&FeatureVector::default(), &quiet_metrics(), &alerts);

        assert_eq!(assessment.health_score, 80);
        assert_eq!(assessment.status, HealthStatus::Compromised);
        assert_eq!(assessment.action, "isolate endpoint");
    }

    #[test]
    fn test_out_of_range_risk_is_clamped() {
        let engine = engine(1.3, false, Trend::Stable);

        let assessment = engine.score(&FeatureVector::default(), &quiet_metrics(), &[]);

        assert_eq!(assessment.health_score, 0);
        assert_eq!(assessment.risk_prob, 1.0);
        assert_eq!(assessment.status, HealthStatus::Compromised);
    }

    #[test]
    fn test_negative_risk_is_clamped() {
        let engine = engine(-0.5, false, Trend::Stable);

        let assessment = engine.score(&FeatureVector::default(), &quiet_metrics(), &[]);

        assert_eq!(assessment.health_score, 100);
        assert_eq!(assessment.risk_prob, 0.0);
        assert_eq!(assessment.status, HealthStatus::Healthy);
    }

    #[test]
    fn test_non_finite_risk_uses_neutral_default() {
        let engine = engine(f64::NAN, false, Trend::Stable);

        let assessment = engine.score(&FeatureVector::default(), &quiet_metrics(), &[]);

        assert_eq!(assessment.risk_prob, 0.5);
        assert_eq!(assessment.health_score, 50);
    }

    #[test]
    fn test_failing_producers_substitute_neutral_defaults() {
        let engine = RiskFusionEngine::new(
            Box::new(FailingClassifier),
            Box::new(FailingDetector),
            Box::new(FixedForecaster(Trend::Degrade)),
            ThresholdConfig::default(),
        );

        let assessment = engine.score(&FeatureVector::default(), &quiet_metrics(), &[]);

        assert_eq!(assessment.risk_prob, 0.5);
        assert_eq!(assessment.health_score, 50);
        assert_eq!(assessment.status, HealthStatus::Healthy);
        assert_eq!(assessment.trend, Trend::Degrade);
    }

    #[test]
    fn test_threshold_rules_fire_in_order() {
        let engine = engine(0.2, false, Trend::Stable);
        let metrics = MetricsSnapshot {
            cpu_usage: 90.0,
            memory_usage: 50.0,
            disk_io: 150.0,
            network_traffic: 3000.0,
            num_processes: 100,
            file_changes: 20,
        };

        let assessment = engine.score(&FeatureVector::default(), &metrics, &[]);

        assert_eq!(
            assessment.recommendations,
            vec![
                "mitigate high-CPU process".to_string(),
                "block suspicious outbound traffic".to_string(),
                "enable ransomware containment".to_string(),
                "lock filesystem".to_string(),
            ]
        );
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let engine = engine(0.4, true, Trend::Improve);
        let metrics = quiet_metrics();
        let alerts = vec!["Large file created: /tmp/x (size: 99999999)".to_string()];

        let first = engine.score(&FeatureVector::default(), &metrics, &alerts);
        let second = engine.score(&FeatureVector::default(), &metrics, &alerts);

        assert_eq!(first, second);
    }

    #[quickcheck]
    fn prop_health_score_is_always_in_range(risk: f64, anomaly: bool, alert_count: u8) -> bool {
        let engine = engine(risk, anomaly, Trend::Stable);
        let alerts: Vec<String> = (0..alert_count.min(20))
            .map(|i| format!("alert {}", i))
            .collect();

        let assessment = engine.score(&FeatureVector::default(), &quiet_metrics(), &alerts);
        assessment.health_score <= 100
            && (0.0..=1.0).contains(&assessment.risk_prob)
            && !assessment.recommendations.is_empty()
    }

    #[quickcheck]
    fn prop_action_is_first_recommendation(risk: f64, anomaly: bool) -> bool {
        let engine = engine(risk, anomaly, Trend::Stable);
        let assessment = engine.score(&FeatureVector::default(), &quiet_metrics(), &[]);
        assessment.action == assessment.recommendations[0]
    }
}
