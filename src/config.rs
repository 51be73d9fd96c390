//! Configuration management
//!
//! Configuration is loaded from a TOML file; every section falls back to
//! built-in defaults so the sentinel starts with no config file at all.
//! Heuristic deny-lists and the record-name → category map live here as
//! data, not as literals inside the fusion logic.

use crate::error::ConfigError;
use crate::events::EventCategory;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pipeline cadence and windowing
    pub pipeline: PipelineConfig,
    /// Security log source
    pub security_log: SecurityLogConfig,
    /// Alert log settings
    pub alerts: AlertConfig,
    /// Recommendation and status thresholds
    pub thresholds: ThresholdConfig,
    /// Heuristic indicator data for the event aggregator
    pub indicators: IndicatorConfig,
    /// Model artifact locations
    pub models: ModelConfig,
}

/// Cadence and feature-window settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Endpoint id reported by the pull path; empty means "use hostname"
    pub endpoint_id: String,
    /// Seconds between background pipeline passes
    pub cadence_seconds: u64,
    /// Rolling feature window horizon in minutes
    pub horizon_minutes: i64,
}

/// Location of the tailed security log
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityLogConfig {
    /// Path to the append-only JSON-lines security log
    pub path: String,
}

/// Alert log settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Maximum number of alerts retained; oldest evicted first
    pub capacity: usize,
}

/// Thresholds driving status and recommendation rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// CPU percentage above which mitigation is recommended
    pub cpu_pct: f64,
    /// Network traffic above which exfiltration blocking is recommended
    pub network_traffic: f64,
    /// Disk I/O above which ransomware containment is recommended
    pub disk_io: f64,
    /// File changes above which a filesystem lock is recommended
    pub file_changes: u64,
    /// File changes in a push-path submission that raise a heuristic alert
    pub submission_file_changes: u64,
    /// Risk probability above which the endpoint is considered compromised
    pub compromise_risk: f64,
}

/// Heuristic indicator data consumed by the event aggregator
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Record name → event category map
    pub categories: HashMap<String, EventCategory>,
    /// Process names treated as suspicious (known miners, backdoor tools)
    pub suspicious_processes: Vec<String>,
    /// Listening ports treated as suspicious (known C2 ports)
    pub suspicious_ports: Vec<String>,
}

/// Model artifact locations for the baseline signal producers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Logistic risk classifier weights (JSON)
    pub classifier_path: String,
    /// Per-feature anomaly profile (JSON)
    pub anomaly_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            security_log: SecurityLogConfig::default(),
            alerts: AlertConfig::default(),
            thresholds: ThresholdConfig::default(),
            indicators: IndicatorConfig::default(),
            models: ModelConfig::default(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            endpoint_id: String::new(),
            cadence_seconds: 5,
            horizon_minutes: 60,
        }
    }
}

impl Default for SecurityLogConfig {
    fn default() -> Self {
        Self {
            path: "/var/log/osquery/osqueryd.results.log".to_string(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            cpu_pct: 85.0,
            network_traffic: 2000.0,
            disk_io: 100.0,
            file_changes: 15,
            submission_file_changes: 10,
            compromise_risk: 0.7,
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        let mut categories = HashMap::new();
        categories.insert("large_files".to_string(), EventCategory::File);
        categories.insert("high_load_processes".to_string(), EventCategory::Process);
        categories.insert("listening_ports".to_string(), EventCategory::Socket);

        Self {
            categories,
            suspicious_processes: vec![
                "xmrig".to_string(),
                "nc".to_string(),
                "ncat".to_string(),
            ],
            suspicious_ports: vec!["4444".to_string(), "6667".to_string()],
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            classifier_path: "models/risk_classifier.json".to_string(),
            anomaly_path: "models/anomaly_profile.json".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read,
    /// `ConfigError::TomlError` if it is not valid TOML, or
    /// `ConfigError::ValidationError` if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.cadence_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.cadence_seconds must be greater than 0".to_string(),
            ));
        }
        if self.pipeline.horizon_minutes <= 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.horizon_minutes must be greater than 0".to_string(),
            ));
        }
        if self.alerts.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "alerts.capacity must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.thresholds.compromise_risk) {
            return Err(ConfigError::ValidationError(
                "thresholds.compromise_risk must be within [0.0, 1.0]".to_string(),
            ));
        }
        Ok(())
    }
}
