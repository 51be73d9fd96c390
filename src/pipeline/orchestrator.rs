//! Pipeline orchestration
//!
//! One pass for one endpoint: tail new log lines, classify and summarize
//! them, persist the raw telemetry and events, extract features, fuse the
//! risk signals, then publish the verdict. The verdict is built fully
//! off-registry and written in one replace, so a failing pass never
//! leaves a partial verdict behind; it is simply retried on the next
//! cadence tick.
//!
//! The same fusion logic also serves the push path: an inbound telemetry
//! submission runs one synchronous pass for its endpoint and returns the
//! resulting verdict.

use crate::aggregator::EventAggregator;
use crate::collectors::{LogTailer, TelemetrySource};
use crate::error::PipelineError;
use crate::events::{Alert, HealthStatus, MetricsSnapshot, TelemetrySample, Timestamp, Verdict};
use crate::features::{FeatureVector, FeatureWindow};
use crate::fusion::RiskFusionEngine;
use crate::monitoring::{GaugeSink, GaugeValues};
use crate::registry::EndpointRegistry;
use crate::store::TelemetryStore;
use log::{debug, info, warn};
use serde::Deserialize;
use std::sync::{Arc, Mutex};

/// Inbound push-path telemetry submission
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TelemetrySubmission {
    /// Endpoint the metrics belong to
    pub endpoint_id: String,
    /// Reported metric values
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
}

/// Drives complete pipeline passes over the pull and push paths
pub struct PipelineOrchestrator {
    endpoint_id: String,
    tailer: Mutex<LogTailer>,
    aggregator: EventAggregator,
    source: Box<dyn TelemetrySource>,
    store: Arc<dyn TelemetryStore>,
    window: FeatureWindow,
    engine: RiskFusionEngine,
    registry: Arc<EndpointRegistry>,
    gauges: Box<dyn GaugeSink>,
    submission_alert_threshold: u64,
}

impl PipelineOrchestrator {
    /// Wire up an orchestrator for one locally monitored endpoint
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        endpoint_id: String,
        tailer: LogTailer,
        aggregator: EventAggregator,
        source: Box<dyn TelemetrySource>,
        store: Arc<dyn TelemetryStore>,
        window: FeatureWindow,
        engine: RiskFusionEngine,
        registry: Arc<EndpointRegistry>,
        gauges: Box<dyn GaugeSink>,
        submission_alert_threshold: u64,
    ) -> Self {
        Self {
            endpoint_id,
            tailer: Mutex::new(tailer),
            aggregator,
            source,
            store,
            window,
            engine,
            registry,
            gauges,
            submission_alert_threshold,
        }
    }

    /// Run one pull-path pass for the local endpoint
    ///
    /// A store failure aborts the pass before the registry is touched;
    /// the stale verdict timestamp is the operator-visible signal.
    pub fn run_pass(&self, now: Timestamp) -> Result<Verdict, PipelineError> {
        let lines = self.tailer.lock().unwrap().poll()?;
        let events = self.aggregator.classify(&self.endpoint_id, &lines, now);
        let summary = self.aggregator.summarize(&events);
        if !lines.is_empty() {
            debug!(
                "Pass for {}: {} log lines, {} events, {} anomalies",
                self.endpoint_id,
                lines.len(),
                events.len(),
                summary.anomalies.len()
            );
        }

        let sample = self.source.sample(&self.endpoint_id, now);
        self.store.insert_sample(&sample)?;
        for event in &events {
            self.store.insert_event(event)?;
        }

        let features = self.window.extract(&self.endpoint_id, now)?;
        let metrics = MetricsSnapshot {
            cpu_usage: features.cpu_usage,
            memory_usage: features.memory_usage,
            disk_io: features.disk_io,
            network_traffic: features.network_traffic,
            num_processes: sample.process_count,
            file_changes: summary.file_changes as u64,
        };

        Ok(self.publish(&self.endpoint_id, now, &features, metrics, &summary.anomalies))
    }

    /// Run one push-path pass for an inbound submission
    ///
    /// The submission is persisted as a telemetry sample so later pull
    /// passes see it, but the verdict is computed from the submitted
    /// values directly, treating the submission as a one-sample window.
    pub fn submit(
        &self,
        submission: &TelemetrySubmission,
        now: Timestamp,
    ) -> Result<Verdict, PipelineError> {
        let metrics = submission.metrics.clone();
        let sample = TelemetrySample {
            endpoint_id: submission.endpoint_id.clone(),
            timestamp: now,
            cpu_pct: metrics.cpu_usage,
            mem_pct: metrics.memory_usage,
            disk_read_bytes: metrics.disk_io,
            disk_write_bytes: 0.0,
            net_sent_bytes: metrics.network_traffic,
            net_recv_bytes: 0.0,
            gpu_pct: 0.0,
            process_count: metrics.num_processes,
        };
        self.store.insert_sample(&sample)?;

        let features = FeatureVector {
            cpu_usage: metrics.cpu_usage,
            memory_usage: metrics.memory_usage,
            disk_io: metrics.disk_io,
            network_traffic: metrics.network_traffic,
            num_processes: metrics.num_processes as f64,
            cpu_mean_1h: metrics.cpu_usage,
            cpu_std_1h: 0.0,
            mem_mean_1h: metrics.memory_usage,
            mem_trend: 0.0,
            cpu_stress_ratio: if metrics.cpu_usage > 80.0 { 1.0 } else { 0.0 },
            event_count: metrics.file_changes as f64,
        };

        let mut heuristic_alerts = Vec::new();
        if metrics.file_changes > self.submission_alert_threshold {
            heuristic_alerts.push(format!(
                "high file-modification rate: {} changes",
                metrics.file_changes
            ));
        }

        Ok(self.publish(
            &submission.endpoint_id,
            now,
            &features,
            metrics,
            &heuristic_alerts,
        ))
    }

    /// Fuse, upsert, alert and emit gauges; shared by both paths
    fn publish(
        &self,
        endpoint_id: &str,
        now: Timestamp,
        features: &FeatureVector,
        metrics: MetricsSnapshot,
        heuristic_alerts: &[String],
    ) -> Verdict {
        let assessment = self.engine.score(features, &metrics, heuristic_alerts);

        let verdict = Verdict {
            endpoint_id: endpoint_id.to_string(),
            timestamp: now,
            health_score: assessment.health_score,
            risk_prob: assessment.risk_prob,
            status: assessment.status,
            trend: assessment.trend,
            metrics,
            recommendations: assessment.recommendations,
            action: assessment.action,
        };

        self.registry.upsert(verdict.clone());

        if verdict.status != HealthStatus::Healthy {
            warn!(
                "Endpoint {} is {:?} (score {}, risk {:.2}): {}",
                endpoint_id, verdict.status, verdict.health_score, verdict.risk_prob, verdict.action
            );
            self.registry.append_alert(Alert {
                timestamp: now,
                endpoint_id: endpoint_id.to_string(),
                status: verdict.status,
                risk_prob: verdict.risk_prob,
                action: verdict.action.clone(),
            });
        } else {
            info!(
                "Endpoint {} is healthy (score {})",
                endpoint_id, verdict.health_score
            );
        }

        self.gauges.record(
            endpoint_id,
            GaugeValues {
                health_score: verdict.health_score,
                risk_prob: verdict.risk_prob,
                cpu_usage: verdict.metrics.cpu_usage,
                memory_usage: verdict.metrics.memory_usage,
            },
        );

        verdict
    }
}
