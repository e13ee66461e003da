//! Shared primitives for the TSP route visualizer: solver payloads, run
//! identity and the static location/distance tables.

pub mod dataset;
pub mod distance;
pub mod error;
pub mod location;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use dataset::Dataset;
pub use distance::{exhaustive_search_space, Asymmetry, DistanceMatrix};
pub use error::TableError;
pub use location::{Coordinate, LocationTable};

/// One candidate tour emitted by the solver. Never mutated after decoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub generation: u64,
    pub route: Vec<usize>,
    pub distance: f64,
    pub fitness: f64,
}

/// Terminal frame of a run carrying the solver's wall-clock time in ms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_time: f64,
}

/// A decoded frame payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Solution(Solution),
    Summary(RunSummary),
}

/// Monotonic run generation number; a new submission always gets a larger one.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RunId(pub u64);

impl RunId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverMode {
    Genetic,
    BestFirst,
    BruteForce,
}

impl SolverMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SolverMode::Genetic => "genetic",
            SolverMode::BestFirst => "best-first",
            SolverMode::BruteForce => "brute-force",
        }
    }

    /// Whether the solver answers with a frame stream rather than one JSON body.
    pub fn is_streaming(self) -> bool {
        !matches!(self, SolverMode::BruteForce)
    }
}

impl fmt::Display for SolverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown solver mode {0:?} (expected genetic, best-first or brute-force)")]
pub struct ParseModeError(String);

impl FromStr for SolverMode {
    type Err = ParseModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "genetic" | "ga" => Ok(SolverMode::Genetic),
            "best-first" | "search" => Ok(SolverMode::BestFirst),
            "brute-force" | "brute" => Ok(SolverMode::BruteForce),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}
