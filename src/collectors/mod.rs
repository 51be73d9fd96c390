/// Incremental tailer for the append-only security log
pub mod log_tailer;

/// Telemetry sources for raw endpoint resource counters
pub mod telemetry;

pub use log_tailer::LogTailer;
pub use telemetry::{SysinfoSource, TelemetrySource};
