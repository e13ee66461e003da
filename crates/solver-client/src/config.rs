//! Connection settings for the remote solver.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigurationError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    /// Upper bound on a whole run, body included.
    pub request_timeout_ms: u64,
    /// Longest accepted gap between two body chunks.
    pub stall_timeout_ms: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout_ms: 5_000,
            request_timeout_ms: 600_000,
            stall_timeout_ms: 30_000,
        }
    }
}

impl SolverConfig {
    pub fn base_url(&self) -> Result<Url, ConfigurationError> {
        let url = Url::parse(self.base_url.trim()).map_err(|err| {
            ConfigurationError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: err.to_string(),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigurationError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        Ok(url)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms.max(1))
    }
}
