//! Observability gauges
//!
//! Each pipeline pass publishes four scalar gauges keyed by endpoint id:
//! health score, risk probability, cpu usage and memory usage. The
//! exposition format is a collaborator concern; this module only defines
//! the sink seam plus two built-in sinks, one that writes a structured
//! log line and one that holds the latest values in memory for scraping
//! and tests.

use log::info;
use std::collections::HashMap;
use std::sync::Mutex;

/// Latest gauge values for one endpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeValues {
    /// Health score in [0, 100]
    pub health_score: u8,
    /// Compromise probability in [0.0, 1.0]
    pub risk_prob: f64,
    /// CPU usage percentage
    pub cpu_usage: f64,
    /// Memory usage percentage
    pub memory_usage: f64,
}

/// Sink for the per-pass gauges
pub trait GaugeSink: Send + Sync {
    /// Publish the gauges produced by one pass for one endpoint
    fn record(&self, endpoint_id: &str, values: GaugeValues);
}

/// Sink that emits one structured log line per pass
#[derive(Default)]
pub struct LogGaugeSink;

impl GaugeSink for LogGaugeSink {
    fn record(&self, endpoint_id: &str, values: GaugeValues) {
        info!(
            "gauges endpoint={} health_score={} risk_prob={:.3} cpu={:.1} mem={:.1}",
            endpoint_id,
            values.health_score,
            values.risk_prob,
            values.cpu_usage,
            values.memory_usage
        );
    }
}

/// Sink that retains the latest values per endpoint
#[derive(Default)]
pub struct MemoryGaugeSink {
    latest: Mutex<HashMap<String, GaugeValues>>,
}

impl MemoryGaugeSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest recorded values for an endpoint, if any
    pub fn latest(&self, endpoint_id: &str) -> Option<GaugeValues> {
        self.latest.lock().unwrap().get(endpoint_id).copied()
    }
}

impl GaugeSink for MemoryGaugeSink {
    fn record(&self, endpoint_id: &str, values: GaugeValues) {
        self.latest
            .lock()
            .unwrap()
            .insert(endpoint_id.to_string(), values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_keeps_latest_per_endpoint() {
        let sink = MemoryGaugeSink::new();

        sink.record(
            "ep-01",
            GaugeValues {
                health_score: 90,
                risk_prob: 0.1,
                cpu_usage: 20.0,
                memory_usage: 40.0,
            },
        );
        sink.record(
            "ep-01",
            GaugeValues {
                health_score: 50,
                risk_prob: 0.3,
                cpu_usage: 80.0,
                memory_usage: 70.0,
            },
        );

        let latest = sink.latest("ep-01").unwrap();
        assert_eq!(latest.health_score, 50);
        assert_eq!(latest.cpu_usage, 80.0);
        assert!(sink.latest("ep-02").is_none());
    }
}
