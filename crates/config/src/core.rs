//! Configuration sections shared across crates

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Package service endpoint and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default = "default_pool_idle_timeout")]
    pub pool_idle_timeout: u64, // seconds
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            pool_idle_timeout: default_pool_idle_timeout(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            user_agent: default_user_agent(),
        }
    }
}

impl NetworkConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    #[must_use]
    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout)
    }
}

/// Download behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Suppress progress output
    #[serde(default)]
    pub quiet: bool,
    /// Continue partially downloaded files with a range request
    #[serde(default = "default_true")]
    pub resume: bool,
    /// Verify the artifact checksum after download
    #[serde(default = "default_true")]
    pub verify: bool,
    /// Unpack tar / tar.gz artifacts after download
    #[serde(default = "default_true")]
    pub extract: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            resume: true,
            verify: true,
            extract: true,
        }
    }
}

// Default value functions for serde
fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    300 // 5 minutes for large artifacts
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_pool_idle_timeout() -> u64 {
    90
}

fn default_pool_max_idle_per_host() -> usize {
    10
}

fn default_user_agent() -> String {
    format!("depot/{}", env!("CARGO_PKG_VERSION"))
}

fn default_true() -> bool {
    true
}
