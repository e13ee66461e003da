use std::sync::Arc;

use tsp_core_types::{DistanceMatrix, SolverMode};

use crate::error::ConfigurationError;
use crate::params::GeneticParams;

/// Immutable description of one submission.
#[derive(Clone, Debug)]
pub struct SolverRequest {
    pub mode: SolverMode,
    pub params: GeneticParams,
    pub distances: Arc<DistanceMatrix>,
}

impl SolverRequest {
    pub fn genetic(params: GeneticParams, distances: Arc<DistanceMatrix>) -> Self {
        Self {
            mode: SolverMode::Genetic,
            params,
            distances,
        }
    }

    pub fn best_first(distances: Arc<DistanceMatrix>) -> Self {
        Self::new(SolverMode::BestFirst, distances)
    }

    pub fn brute_force(distances: Arc<DistanceMatrix>) -> Self {
        Self::new(SolverMode::BruteForce, distances)
    }

    pub fn new(mode: SolverMode, distances: Arc<DistanceMatrix>) -> Self {
        Self {
            mode,
            params: GeneticParams::default(),
            distances,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let min = match self.mode {
            SolverMode::Genetic => {
                self.params.validate()?;
                2
            }
            SolverMode::BestFirst | SolverMode::BruteForce => 1,
        };
        if self.distances.len() < min {
            return Err(ConfigurationError::TooFewLocations {
                mode: self.mode.as_str(),
                min,
                actual: self.distances.len(),
            });
        }
        Ok(())
    }

    /// Generation number reported for an exhaustive search over this table.
    pub fn search_space(&self) -> u64 {
        self.distances.exhaustive_search_space()
    }
}
