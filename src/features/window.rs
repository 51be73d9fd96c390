//! Time-windowed feature extraction
//!
//! Builds a feature vector from an endpoint's recent telemetry history.
//! The window is always bounded to the configured horizon regardless of
//! sample density, and the vector is rebuilt from scratch on every scoring
//! invocation, never mutated in place.

use crate::error::StoreError;
use crate::events::{TelemetrySample, Timestamp};
use crate::store::TelemetryStore;
use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;

/// Derived, ephemeral feature vector for one endpoint at one moment
///
/// All fields are exactly 0 on cold start (no history in the window).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FeatureVector {
    /// CPU usage of the most recent sample
    pub cpu_usage: f64,
    /// Memory usage of the most recent sample
    pub memory_usage: f64,
    /// Disk read + write of the most recent sample
    pub disk_io: f64,
    /// Network sent + received of the most recent sample
    pub network_traffic: f64,
    /// Process count of the most recent sample
    pub num_processes: f64,
    /// Mean CPU usage over the window
    pub cpu_mean_1h: f64,
    /// Sample standard deviation of CPU usage over the window
    pub cpu_std_1h: f64,
    /// Mean memory usage over the window
    pub mem_mean_1h: f64,
    /// Least-squares slope of memory usage against sample index
    /// (window is newest-first, so negative means memory is rising)
    pub mem_trend: f64,
    /// Fraction of window samples with CPU above 80%
    pub cpu_stress_ratio: f64,
    /// Security events for the endpoint within the window
    pub event_count: f64,
}

/// Extracts feature vectors from the persisted telemetry history
pub struct FeatureWindow {
    store: Arc<dyn TelemetryStore>,
    horizon: Duration,
}

impl FeatureWindow {
    /// Create an extractor over the given store and lookback horizon
    pub fn new(store: Arc<dyn TelemetryStore>, horizon: Duration) -> Self {
        Self { store, horizon }
    }

    /// Build the feature vector for one endpoint as of `now`
    ///
    /// An empty window (cold start) yields an all-zero vector and never
    /// fails. Store errors propagate: the caller aborts the pass and
    /// retries on the next tick.
    pub fn extract(&self, endpoint_id: &str, now: Timestamp) -> Result<FeatureVector, StoreError> {
        let since = now - self.horizon;
        let window = self.store.samples_since(endpoint_id, since)?;

        if window.is_empty() {
            return Ok(FeatureVector::default());
        }

        let event_count = self.store.event_count_since(endpoint_id, since)? as f64;
        Ok(Self::from_window(&window, event_count))
    }

    /// Compute the vector from a non-empty, newest-first sample window
    fn from_window(window: &[TelemetrySample], event_count: f64) -> FeatureVector {
        let latest = &window[0];
        let cpu: Vec<f64> = window.iter().map(|s| s.cpu_pct).collect();
        let mem: Vec<f64> = window.iter().map(|s| s.mem_pct).collect();

        let stressed = cpu.iter().filter(|&&c| c > 80.0).count();

        FeatureVector {
            cpu_usage: latest.cpu_pct,
            memory_usage: latest.mem_pct,
            disk_io: latest.disk_read_bytes + latest.disk_write_bytes,
            network_traffic: latest.net_sent_bytes + latest.net_recv_bytes,
            num_processes: latest.process_count as f64,
            cpu_mean_1h: mean(&cpu),
            cpu_std_1h: sample_std(&cpu),
            mem_mean_1h: mean(&mem),
            mem_trend: least_squares_slope(&mem),
            cpu_stress_ratio: stressed as f64 / window.len() as f64,
            event_count,
        }
    }
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator); 0 with fewer than 2 values
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Least-squares linear regression slope of `values` against their index
///
/// Returns 0 with fewer than 2 values or when the fit is numerically
/// degenerate.
pub fn least_squares_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = mean(values);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        return 0.0;
    }
    let slope = numerator / denominator;
    if slope.is_finite() {
        slope
    } else {
        0.0
    }
}
