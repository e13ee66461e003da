use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tsp_core_types::Dataset;
use tsp_solver_client::{HttpTransport, SolverTransport};

use super::commands::DataArgs;
use super::output::OutputFormat;
use crate::app_settings::Config;

pub struct CliContext {
    config: Arc<Config>,
    config_path: PathBuf,
    metrics_port: u16,
    output: OutputFormat,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf, metrics_port: u16, output: OutputFormat) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            metrics_port,
            output,
        }
    }

    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn metrics_port(&self) -> u16 {
        self.metrics_port
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    /// Tables from the command line, else from the config file, else bundled.
    pub fn dataset(&self, args: &DataArgs) -> Result<Dataset> {
        let locations = args
            .locations
            .as_deref()
            .or(self.config.dataset.locations.as_deref());
        let distances = args
            .matrix
            .as_deref()
            .or(self.config.dataset.distances.as_deref());
        Dataset::load(locations, distances).context("Failed to load location/distance tables")
    }

    pub fn http_transport(&self) -> Result<Arc<dyn SolverTransport>> {
        let transport =
            HttpTransport::new(&self.config.solver).context("Failed to set up solver client")?;
        Ok(Arc::new(transport))
    }
}
