use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Composite fetch coordination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// How long a composite fetch may sit without progress before it is
    /// force-reset to idle (default: 30000).
    #[serde(default = "default_fetch_timeout_ms")]
    pub timeout_ms: u64,
}

/// Local persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the JSON documents.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// Simulated backend used by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Delay before each response (default: 150).
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    /// Reject every authenticate call.
    #[serde(default)]
    pub fail_auth: bool,
    /// Fail the account settings sub-fetch.
    #[serde(default)]
    pub fail_settings: bool,
}

fn default_fetch_timeout_ms() -> u64 {
    30_000
}

fn default_latency_ms() -> u64 {
    150
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fluxstore")
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl NetworkConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            fail_auth: false,
            fail_settings: false,
        }
    }
}
