//! Playback cadence settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tsp_core_types::SolverMode;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub genetic_cadence_ms: u64,
    pub search_cadence_ms: u64,
    pub brute_force_cadence_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            genetic_cadence_ms: 1000,
            search_cadence_ms: 200,
            brute_force_cadence_ms: 200,
        }
    }
}

impl PlaybackConfig {
    pub fn cadence(&self, mode: SolverMode) -> Duration {
        let ms = match mode {
            SolverMode::Genetic => self.genetic_cadence_ms,
            SolverMode::BestFirst => self.search_cadence_ms,
            SolverMode::BruteForce => self.brute_force_cadence_ms,
        };
        Duration::from_millis(ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_is_per_mode_and_never_zero() {
        let mut config = PlaybackConfig::default();
        assert_eq!(config.cadence(SolverMode::Genetic), Duration::from_millis(1000));
        assert_eq!(config.cadence(SolverMode::BestFirst), Duration::from_millis(200));
        config.brute_force_cadence_ms = 0;
        assert_eq!(config.cadence(SolverMode::BruteForce), Duration::from_millis(1));
    }
}
