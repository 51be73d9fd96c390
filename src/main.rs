use clap::Parser;
use log::{error, info, warn};
use sentinel::aggregator::EventAggregator;
use sentinel::collectors::{LogTailer, SysinfoSource};
use sentinel::config::Config;
use sentinel::error::{ConfigError, TailError};
use sentinel::features::FeatureWindow;
use sentinel::fusion::{ProfileClassifier, RiskFusionEngine, SlopeForecaster, ZScoreDetector};
use sentinel::monitoring::LogGaugeSink;
use sentinel::pipeline::PipelineOrchestrator;
use sentinel::registry::EndpointRegistry;
use sentinel::store::{MemoryStore, TelemetryStore};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Command-line arguments for the endpoint sentinel
#[derive(Parser)]
#[command(
    name = "sentinel",
    about = "Endpoint sentinel - telemetry-to-risk monitoring pipeline",
    long_about = "Tails the endpoint security log, samples system telemetry, and fuses \
                  classifier, anomaly and trend signals into a per-endpoint health \
                  verdict with actionable recommendations."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,
}

impl Cli {
    /// Validate the CLI arguments
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Missing files are handled gracefully by falling back to defaults
            if config_path.exists() {
                if !config_path.is_file() {
                    return Err(format!(
                        "Configuration path is not a file: {}",
                        config_path.display()
                    ));
                }

                if let Some(extension) = config_path.extension() {
                    if extension != "toml" {
                        warn!(
                            "Configuration file does not have .toml extension: {}",
                            config_path.display()
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Convert config path to string safely, handling non-UTF-8 paths
    fn config_path_str(&self) -> Result<Option<&str>, String> {
        match &self.config {
            Some(path) => match path.to_str() {
                Some(path_str) => Ok(Some(path_str)),
                None => Err(format!(
                    "Configuration file path contains invalid UTF-8 characters: {}",
                    path.display()
                )),
            },
            None => Ok(None),
        }
    }
}

/// Main application struct that runs the pipeline on a fixed cadence
///
/// Sentinel wires the tailer, aggregator, store, feature window, fusion
/// engine and registry together, then drives one pull-path pass per
/// cadence tick on a background thread until shutdown.
pub struct Sentinel {
    /// Pipeline components shared with the worker thread
    orchestrator: Arc<PipelineOrchestrator>,

    /// Cadence between pull-path passes
    cadence: Duration,

    /// Shutdown signal for the main thread
    shutdown_sender: Sender<()>,
    shutdown_receiver: Receiver<()>,

    /// Shutdown signal for the worker thread
    worker_shutdown: Option<Sender<()>>,

    /// Worker thread handle for cleanup
    worker_handle: Option<JoinHandle<()>>,
}

impl Sentinel {
    /// Wire up all pipeline components from the configuration
    pub fn new(config: Config) -> Result<Self, TailError> {
        info!("Initializing sentinel pipeline");

        let endpoint_id = resolve_endpoint_id(&config);
        info!("Monitoring endpoint '{}'", endpoint_id);

        let tailer = LogTailer::new(&config.security_log.path)?;
        let aggregator = EventAggregator::new(config.indicators.clone());
        let store: Arc<dyn TelemetryStore> = Arc::new(MemoryStore::new());
        let window = FeatureWindow::new(
            Arc::clone(&store),
            chrono::Duration::minutes(config.pipeline.horizon_minutes),
        );

        let engine = RiskFusionEngine::new(
            Box::new(ProfileClassifier::from_file(&config.models.classifier_path)),
            Box::new(ZScoreDetector::from_file(&config.models.anomaly_path)),
            Box::new(SlopeForecaster::default()),
            config.thresholds.clone(),
        );

        let registry = Arc::new(EndpointRegistry::new(config.alerts.capacity));

        let orchestrator = Arc::new(PipelineOrchestrator::new(
            endpoint_id,
            tailer,
            aggregator,
            Box::new(SysinfoSource::new()),
            store,
            window,
            engine,
            registry,
            Box::new(LogGaugeSink),
            config.thresholds.submission_file_changes,
        ));

        let (shutdown_sender, shutdown_receiver) = mpsc::channel();

        Ok(Sentinel {
            orchestrator,
            cadence: Duration::from_secs(config.pipeline.cadence_seconds),
            shutdown_sender,
            shutdown_receiver,
            worker_shutdown: None,
            worker_handle: None,
        })
    }

    /// Load configuration from file or use defaults
    pub fn load_config(config_path: Option<&str>) -> Result<Config, ConfigError> {
        match config_path {
            Some(path) => {
                info!("Loading configuration from: {}", path);
                match Config::from_file(std::path::Path::new(path)) {
                    Ok(config) => Ok(config),
                    Err(ConfigError::ReadError(_)) => {
                        warn!(
                            "Configuration file '{}' not found or unreadable, using defaults",
                            path
                        );
                        Ok(Config::default())
                    }
                    Err(e) => {
                        error!("Configuration error in '{}': {}", path, e);
                        warn!("Using default configuration due to invalid config file");
                        Ok(Config::default())
                    }
                }
            }
            None => {
                info!("Using default configuration");
                Ok(Config::default())
            }
        }
    }

    /// Start the cadence loop on a background thread
    ///
    /// A failing pass is logged and retried on the next tick; the loop
    /// itself never terminates because of a single pass's failure.
    pub fn start(&mut self) {
        let orchestrator = Arc::clone(&self.orchestrator);
        let cadence = self.cadence;
        let (worker_shutdown, worker_receiver) = mpsc::channel();
        self.worker_shutdown = Some(worker_shutdown);

        let handle = std::thread::spawn(move || {
            info!("Pipeline worker started, cadence {:?}", cadence);

            loop {
                match worker_receiver.recv_timeout(cadence) {
                    Ok(()) => {
                        info!("Pipeline worker received shutdown signal");
                        break;
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        info!("Pipeline worker channel disconnected");
                        break;
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if let Err(e) = orchestrator.run_pass(chrono::Utc::now()) {
                            error!("Pipeline pass failed, retrying on next tick: {}", e);
                        }
                    }
                }
            }

            info!("Pipeline worker stopped");
        });

        self.worker_handle = Some(handle);
    }

    /// Stop the worker thread and wait for it to finish
    pub fn stop(&mut self) {
        if let Some(sender) = self.worker_shutdown.take() {
            if let Err(e) = sender.send(()) {
                error!("Failed to send worker shutdown signal: {}", e);
            }
        }
        if let Some(handle) = self.worker_handle.take() {
            if let Err(e) = handle.join() {
                error!("Pipeline worker failed to join: {:?}", e);
            }
        }
    }

    /// Block until a shutdown signal is received
    pub fn wait_for_shutdown(&self) {
        info!("Waiting for shutdown signal...");
        if let Err(e) = self.shutdown_receiver.recv() {
            error!("Error waiting for shutdown: {}", e);
        }
    }
}

/// Endpoint id from the configuration, falling back to the hostname
fn resolve_endpoint_id(config: &Config) -> String {
    if !config.pipeline.endpoint_id.is_empty() {
        return config.pipeline.endpoint_id.clone();
    }
    sysinfo::System::host_name().unwrap_or_else(|| "endpoint".to_string())
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    info!("Starting endpoint sentinel");

    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    let config_path = match cli.config_path_str() {
        Ok(path) => path,
        Err(e) => {
            error!("Invalid configuration path: {}", e);
            std::process::exit(1);
        }
    };

    let config = match Sentinel::load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut sentinel = match Sentinel::new(config) {
        Ok(sentinel) => sentinel,
        Err(e) => {
            error!("Failed to initialize sentinel: {}", e);
            std::process::exit(1);
        }
    };

    sentinel.start();

    let shutdown_sender = sentinel.shutdown_sender.clone();
    ctrlc::set_handler(move || {
        info!("Received interrupt signal (SIGINT), shutting down gracefully...");
        if let Err(e) = shutdown_sender.send(()) {
            error!("Failed to send shutdown signal: {}", e);
        }
    })
    .expect("Error setting SIGINT handler for graceful shutdown");

    info!("Sentinel is running. Press Ctrl+C to stop.");

    sentinel.wait_for_shutdown();
    sentinel.stop();

    info!("Sentinel shutdown complete");
}
