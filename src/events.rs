//! Core data types for the endpoint sentinel
//!
//! This module defines the fundamental data structures used throughout the
//! pipeline: raw telemetry samples, classified security events, and the
//! per-endpoint verdicts and alerts derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Timestamp type for consistent time handling across the application
pub type Timestamp = DateTime<Utc>;

/// A single point-in-time measurement of one endpoint's resource usage
///
/// Samples are immutable once recorded and append-only per endpoint,
/// ordered by timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySample {
    /// Stable identifier of the monitored endpoint
    pub endpoint_id: String,
    /// When the sample was taken
    pub timestamp: Timestamp,
    /// CPU usage as a percentage (0-100)
    pub cpu_pct: f64,
    /// Memory usage as a percentage (0-100)
    pub mem_pct: f64,
    /// Cumulative disk read counter in bytes
    pub disk_read_bytes: f64,
    /// Cumulative disk write counter in bytes
    pub disk_write_bytes: f64,
    /// Cumulative network bytes sent
    pub net_sent_bytes: f64,
    /// Cumulative network bytes received
    pub net_recv_bytes: f64,
    /// GPU usage as a percentage, 0 when no GPU is available
    pub gpu_pct: f64,
    /// Number of running processes
    pub process_count: u64,
}

/// Category assigned to a security-log record by its record name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    /// Filesystem activity (e.g. large file creation)
    File,
    /// Process activity (e.g. high-load processes)
    Process,
    /// Network socket activity (e.g. listening ports)
    Socket,
}

/// Severity level for security events and alerts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// May require attention
    Warning,
    /// Requires immediate attention
    Critical,
}

/// A classified security event parsed from the security log
///
/// Events are immutable and source-ordered: they follow log line order,
/// which is not necessarily timestamp order across restarts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecurityEvent {
    /// Endpoint the event belongs to
    pub endpoint_id: String,
    /// Event time, taken from the record's unix timestamp when present
    pub timestamp: Timestamp,
    /// Category derived from the record name; `None` for unrecognized names
    pub category: Option<EventCategory>,
    /// Record name as it appeared in the log (e.g. "large_files")
    pub name: String,
    /// Record action (e.g. "added", "removed")
    pub action: String,
    /// Raw record columns, kept verbatim
    pub raw_fields: HashMap<String, String>,
    /// Severity assigned at classification time
    pub severity: Severity,
}

/// Overall health assessment of one endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HealthStatus {
    /// No signal indicates a problem
    Healthy,
    /// Anomalous but not yet confirmed compromised
    Warning,
    /// High risk probability or active heuristic alerts
    Compromised,
}

/// Direction the endpoint's health is expected to move
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Trend {
    /// Health is expected to improve
    Improve,
    /// No significant change expected
    Stable,
    /// Health is expected to degrade
    Degrade,
}

/// The raw metric values the recommendation rules operate on
///
/// This is also the body of an inbound push-path submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MetricsSnapshot {
    /// CPU usage percentage
    pub cpu_usage: f64,
    /// Memory usage percentage
    pub memory_usage: f64,
    /// Combined disk read + write activity
    pub disk_io: f64,
    /// Combined network sent + received traffic
    pub network_traffic: f64,
    /// Number of running processes
    pub num_processes: u64,
    /// File modifications observed in the current window
    pub file_changes: u64,
}

/// The current computed risk/health judgment for one endpoint
///
/// Exactly one verdict exists per endpoint at a time; each scoring pass
/// replaces the prior one whole. History is retained only through the
/// alert log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    /// Endpoint this verdict applies to
    pub endpoint_id: String,
    /// When the verdict was produced; staleness signals a failing pipeline
    pub timestamp: Timestamp,
    /// Unified health score, always within [0, 100]
    pub health_score: u8,
    /// Probability of compromise, always within [0.0, 1.0]
    pub risk_prob: f64,
    /// Overall status derived from the fused signals
    pub status: HealthStatus,
    /// Forecast direction of the endpoint's health
    pub trend: Trend,
    /// Raw metric values the verdict was computed from
    pub metrics: MetricsSnapshot,
    /// Full ordered recommendation list, first matching rules first
    pub recommendations: Vec<String>,
    /// The single recommended action (first entry of the list)
    pub action: String,
}

/// An alert raised when a verdict's status is not Healthy
///
/// Alerts live in a bounded FIFO log; the oldest entries are dropped
/// silently once capacity is exceeded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    /// When the alert was raised
    pub timestamp: Timestamp,
    /// Endpoint the alert concerns
    pub endpoint_id: String,
    /// Status at the time of the alert
    pub status: HealthStatus,
    /// Risk probability at the time of the alert
    pub risk_prob: f64,
    /// Recommended action at the time of the alert
    pub action: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_telemetry_sample_serialization() {
        let sample = TelemetrySample {
            endpoint_id: "ep-01".to_string(),
            timestamp: Utc::now(),
            cpu_pct: 42.5,
            mem_pct: 61.0,
            disk_read_bytes: 1024.0,
            disk_write_bytes: 2048.0,
            net_sent_bytes: 512.0,
            net_recv_bytes: 4096.0,
            gpu_pct: 0.0,
            process_count: 123,
        };

        let json = serde_json::to_string(&sample).unwrap();
        let deserialized: TelemetrySample = serde_json::from_str(&json).unwrap();
        assert_eq!(sample, deserialized);
    }

    #[test]
    fn test_event_category_serialization() {
        assert_eq!(
            serde_json::to_string(&EventCategory::File).unwrap(),
            "\"file\""
        );
        assert_eq!(
            serde_json::to_string(&EventCategory::Process).unwrap(),
            "\"process\""
        );
        assert_eq!(
            serde_json::to_string(&EventCategory::Socket).unwrap(),
            "\"socket\""
        );
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }

    #[test]
    fn test_health_status_ordering() {
        assert!(HealthStatus::Healthy < HealthStatus::Warning);
        assert!(HealthStatus::Warning < HealthStatus::Compromised);
    }

    #[test]
    fn test_verdict_serialization() {
        let verdict = Verdict {
            endpoint_id: "ep-01".to_string(),
            timestamp: Utc::now(),
            health_score: 85,
            risk_prob: 0.1,
            status: HealthStatus::Healthy,
            trend: Trend::Stable,
            metrics: MetricsSnapshot::default(),
            recommendations: vec!["no action required".to_string()],
            action: "no action required".to_string(),
        };

        let json = serde_json::to_string(&verdict).unwrap();
        let deserialized: Verdict = serde_json::from_str(&json).unwrap();
        assert_eq!(verdict, deserialized);
    }
}
