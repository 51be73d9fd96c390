//! Security event classification and heuristic summarization
//!
//! Raw security-log lines (one JSON record per line) are classified into
//! file/process/socket events, then summarized into per-category counts and
//! heuristic anomaly strings. The deny-lists and the record-name → category
//! map are configuration data, not literals.

use crate::config::IndicatorConfig;
use crate::events::{EventCategory, SecurityEvent, Severity, Timestamp};
use chrono::{TimeZone, Utc};
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;

/// One raw security-log record as written by the log source
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "unixTime")]
    unix_time: Option<i64>,
    name: String,
    #[serde(default)]
    action: String,
    #[serde(default)]
    columns: HashMap<String, serde_json::Value>,
}

/// Per-category counts and heuristic anomalies for one batch of events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSummary {
    /// Number of file-category events
    pub file_changes: usize,
    /// Number of process-category events
    pub process_events: usize,
    /// Number of socket-category events
    pub socket_events: usize,
    /// Number of events whose record name is not in the category map
    pub unclassified: usize,
    /// Heuristic anomaly descriptions, in input event order
    pub anomalies: Vec<String>,
}

/// Classifies raw log lines and applies heuristic anomaly rules
pub struct EventAggregator {
    indicators: IndicatorConfig,
}

impl EventAggregator {
    /// Create an aggregator with the given indicator data
    pub fn new(indicators: IndicatorConfig) -> Self {
        Self { indicators }
    }

    /// Parse and classify a batch of raw log lines
    ///
    /// Malformed lines are dropped individually and never abort the batch;
    /// valid records come back in their original relative order. A record
    /// whose name is not in the category map still produces an event, just
    /// without a category.
    pub fn classify(
        &self,
        endpoint_id: &str,
        lines: &[String],
        now: Timestamp,
    ) -> Vec<SecurityEvent> {
        let mut events = Vec::new();

        for line in lines {
            let record: RawRecord = match serde_json::from_str(line) {
                Ok(record) => record,
                Err(e) => {
                    debug!("Dropping malformed security log line: {}", e);
                    continue;
                }
            };

            let timestamp = record
                .unix_time
                .and_then(|t| Utc.timestamp_opt(t, 0).single())
                .unwrap_or(now);

            let raw_fields = record
                .columns
                .into_iter()
                .map(|(k, v)| {
                    let value = match v {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (k, value)
                })
                .collect();

            events.push(SecurityEvent {
                endpoint_id: endpoint_id.to_string(),
                timestamp,
                category: self.indicators.categories.get(&record.name).copied(),
                name: record.name,
                action: record.action,
                raw_fields,
                severity: Severity::Warning,
            });
        }

        events
    }

    /// Aggregate classified events into counts and heuristic anomalies
    ///
    /// Anomaly strings follow input event order. Heuristics:
    /// - every file-category (large file) record is anomalous
    /// - process-category records whose process name is on the deny-list
    /// - socket-category records whose port is on the deny-list
    pub fn summarize(&self, events: &[SecurityEvent]) -> EventSummary {
        let mut summary = EventSummary::default();

        for event in events {
            match event.category {
                Some(EventCategory::File) => {
                    summary.file_changes += 1;
                    let path = event.raw_fields.get("path").map(String::as_str).unwrap_or("?");
                    let size = event.raw_fields.get("size").map(String::as_str).unwrap_or("?");
                    summary
                        .anomalies
                        .push(format!("large file detected: {} ({} bytes)", path, size));
                }
                Some(EventCategory::Process) => {
                    summary.process_events += 1;
                    if let Some(name) = event.raw_fields.get("name") {
                        if self.indicators.suspicious_processes.contains(name) {
                            summary
                                .anomalies
                                .push(format!("suspicious process detected: {}", name));
                        }
                    }
                }
                Some(EventCategory::Socket) => {
                    summary.socket_events += 1;
                    if let Some(port) = event.raw_fields.get("port") {
                        if self.indicators.suspicious_ports.contains(port) {
                            summary
                                .anomalies
                                .push(format!("suspicious port open: {}", port));
                        }
                    }
                }
                None => {
                    summary.unclassified += 1;
                }
            }
        }

        summary
    }
}
