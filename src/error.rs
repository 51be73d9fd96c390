use thiserror::Error;

/// Errors that can occur while tailing the security log
#[derive(Error, Debug)]
pub enum TailError {
    #[error("Failed to create log source: {0}")]
    CreateFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors reported by the persistence store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unreachable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

/// Errors raised by a risk-signal producer
///
/// Producer errors never abort a scoring pass; the fusion engine
/// substitutes the documented neutral default for the failing signal.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Model artifact unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Errors that abort a single pipeline pass
///
/// A failed pass never mutates the registry; it is retried on the next
/// cadence tick or the next submission.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Log tail failed: {0}")]
    Tail(#[from] TailError),

    #[error("Persistence failed: {0}")]
    Store(#[from] StoreError),
}
