/// Error types for the sentinel pipeline
pub mod error;

/// Core data types: telemetry samples, security events, verdicts
pub mod events;

/// Log tailer and telemetry source collectors
pub mod collectors;

/// Security event classification and heuristic summarization
pub mod aggregator;

/// Telemetry and event persistence
pub mod store;

/// Time-windowed feature extraction
pub mod features;

/// Risk signal producers and fusion engine
pub mod fusion;

/// Shared verdict registry and bounded alert log
pub mod registry;

/// Pipeline orchestration over the pull and push paths
pub mod pipeline;

/// Observability gauges
pub mod monitoring;

/// Configuration management
pub mod config;

// Re-export commonly used types
pub use error::{ConfigError, PipelineError, SignalError, StoreError, TailError};
