use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;
use tsp_playback::PlaybackConfig;
use tsp_solver_client::{ConfigurationError, GeneticParams, SolverConfig};

pub const SOLVER_URL_ENV: &str = "TSP_SOLVER_URL";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub solver: SolverConfig,
    pub playback: PlaybackConfig,
    /// Defaults for `ga` runs; `--param key=value` overrides them per run.
    pub genetic: GeneticParams,
    pub dataset: DatasetConfig,
}

/// Optional replacements for the bundled ten-city tables.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct DatasetConfig {
    pub locations: Option<PathBuf>,
    pub distances: Option<PathBuf>,
}

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var(SOLVER_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                info!(url, "solver url taken from {}", SOLVER_URL_ENV);
                self.solver.base_url = url.to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.solver.base_url()?;
        self.genetic.validate()
    }
}
