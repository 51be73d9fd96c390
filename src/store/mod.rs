//! Persistence store abstraction
//!
//! The pipeline issues only the operations the feature extractor needs:
//! inserts of raw telemetry and security events, plus time-bounded queries
//! per endpoint. The concrete storage engine is an external collaborator;
//! an in-memory implementation is provided for local runs and tests.

use crate::error::StoreError;
use crate::events::{SecurityEvent, TelemetrySample, Timestamp};
use std::collections::HashMap;
use std::sync::Mutex;

/// Store of recorded telemetry samples and security events
#[cfg_attr(test, mockall::automock)]
pub trait TelemetryStore: Send + Sync {
    /// Record one telemetry sample
    fn insert_sample(&self, sample: &TelemetrySample) -> Result<(), StoreError>;

    /// Record one security event
    fn insert_event(&self, event: &SecurityEvent) -> Result<(), StoreError>;

    /// All samples for the endpoint with timestamp >= `since`,
    /// ordered most-recent-first
    fn samples_since(
        &self,
        endpoint_id: &str,
        since: Timestamp,
    ) -> Result<Vec<TelemetrySample>, StoreError>;

    /// Number of security events for the endpoint with timestamp >= `since`
    fn event_count_since(&self, endpoint_id: &str, since: Timestamp)
        -> Result<usize, StoreError>;
}

/// In-memory store keyed by endpoint id
///
/// Suitable for single-process deployments and tests; data does not
/// survive a restart.
#[derive(Default)]
pub struct MemoryStore {
    samples: Mutex<HashMap<String, Vec<TelemetrySample>>>,
    events: Mutex<HashMap<String, Vec<SecurityEvent>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl TelemetryStore for MemoryStore {
    fn insert_sample(&self, sample: &TelemetrySample) -> Result<(), StoreError> {
        self.samples
            .lock()
            .unwrap()
            .entry(sample.endpoint_id.clone())
            .or_default()
            .push(sample.clone());
        Ok(())
    }

    fn insert_event(&self, event: &SecurityEvent) -> Result<(), StoreError> {
        self.events
            .lock()
            .unwrap()
            .entry(event.endpoint_id.clone())
            .or_default()
            .push(event.clone());
        Ok(())
    }

    fn samples_since(
        &self,
        endpoint_id: &str,
        since: Timestamp,
    ) -> Result<Vec<TelemetrySample>, StoreError> {
        let samples = self.samples.lock().unwrap();
        let mut matching: Vec<TelemetrySample> = samples
            .get(endpoint_id)
            .map(|list| {
                list.iter()
                    .filter(|s| s.timestamp >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(matching)
    }

    fn event_count_since(
        &self,
        endpoint_id: &str,
        since: Timestamp,
    ) -> Result<usize, StoreError> {
        let events = self.events.lock().unwrap();
        Ok(events
            .get(endpoint_id)
            .map(|list| list.iter().filter(|e| e.timestamp >= since).count())
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Severity;
    use chrono::{Duration, Utc};
    use std::collections::HashMap as StdHashMap;

    fn sample_at(endpoint_id: &str, timestamp: Timestamp, cpu: f64) -> TelemetrySample {
        TelemetrySample {
            endpoint_id: endpoint_id.to_string(),
            timestamp,
            cpu_pct: cpu,
            mem_pct: 50.0,
            disk_read_bytes: 0.0,
            disk_write_bytes: 0.0,
            net_sent_bytes: 0.0,
            net_recv_bytes: 0.0,
            gpu_pct: 0.0,
            process_count: 100,
        }
    }

    #[test]
    fn test_samples_since_filters_and_orders_most_recent_first() {
        let store = MemoryStore::new();
        let now = Utc::now();

        store
            .insert_sample(&sample_at("ep-01", now - Duration::minutes(90), 10.0))
            .unwrap();
        store
            .insert_sample(&sample_at("ep-01", now - Duration::minutes(30), 20.0))
            .unwrap();
        store
            .insert_sample(&sample_at("ep-01", now - Duration::minutes(10), 30.0))
            .unwrap();

        let window = store
            .samples_since("ep-01", now - Duration::hours(1))
            .unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].cpu_pct, 30.0);
        assert_eq!(window[1].cpu_pct, 20.0);
    }

    #[test]
    fn test_samples_are_scoped_per_endpoint() {
        let store = MemoryStore::new();
        let now = Utc::now();

        store.insert_sample(&sample_at("ep-01", now, 10.0)).unwrap();
        store.insert_sample(&sample_at("ep-02", now, 20.0)).unwrap();

        let window = store
            .samples_since("ep-01", now - Duration::hours(1))
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].endpoint_id, "ep-01");
    }

    #[test]
    fn test_event_count_since() {
        let store = MemoryStore::new();
        let now = Utc::now();

        for minutes_ago in [90, 30, 5] {
            store
                .insert_event(&SecurityEvent {
                    endpoint_id: "ep-01".to_string(),
                    timestamp: now - Duration::minutes(minutes_ago),
                    category: None,
                    name: "test".to_string(),
                    action: "added".to_string(),
                    raw_fields: StdHashMap::new(),
                    severity: Severity::Warning,
                })
                .unwrap();
        }

        let count = store
            .event_count_since("ep-01", now - Duration::hours(1))
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            store
                .event_count_since("ep-02", now - Duration::hours(1))
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_unknown_endpoint_yields_empty_results() {
        let store = MemoryStore::new();
        let window = store.samples_since("missing", Utc::now()).unwrap();
        assert!(window.is_empty());
    }
}
