/// Time-windowed feature extraction with trend statistics
pub mod window;

pub use window::{FeatureVector, FeatureWindow};
