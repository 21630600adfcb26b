//! TOML configuration: fetch timeout, storage location, simulated backend.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{Config, FetchConfig, NetworkConfig, StorageConfig};
