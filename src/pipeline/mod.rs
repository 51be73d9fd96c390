/// Pull-path and push-path pipeline passes
pub mod orchestrator;

pub use orchestrator::{PipelineOrchestrator, TelemetrySubmission};
