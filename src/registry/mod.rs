/// Shared verdict registry with a bounded alert log
pub mod endpoint_registry;

pub use endpoint_registry::{EndpointRegistry, RegistrySnapshot};
