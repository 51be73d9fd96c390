/// Security event classification and heuristic summarization
pub mod event_aggregator;

pub use event_aggregator::{EventAggregator, EventSummary};
