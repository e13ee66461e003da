//! Single-shot exhaustive search response.

use serde::Deserialize;
use tsp_core_types::Solution;

use crate::error::TransportError;

#[derive(Debug, Deserialize)]
pub struct BruteForceResponse {
    pub final_best_route: Vec<usize>,
    pub final_best_distance: f64,
    pub total_time: f64,
}

impl BruteForceResponse {
    pub fn parse(body: &[u8]) -> Result<Self, TransportError> {
        let response: Self = serde_json::from_slice(body)
            .map_err(|err| TransportError::InvalidResponse(err.to_string()))?;
        if !response.final_best_distance.is_finite() || response.final_best_distance < 0.0 {
            return Err(TransportError::InvalidResponse(format!(
                "final_best_distance {} is not a non-negative number",
                response.final_best_distance
            )));
        }
        if !response.total_time.is_finite() || response.total_time < 0.0 {
            return Err(TransportError::InvalidResponse(format!(
                "total_time {} is not a non-negative number",
                response.total_time
            )));
        }
        Ok(response)
    }

    /// The one solution of the run; `generation` is the size of the space searched.
    pub fn into_solution(self, search_space: u64) -> (Solution, f64) {
        let fitness = if self.final_best_distance > 0.0 {
            1.0 / self.final_best_distance
        } else {
            0.0
        };
        let solution = Solution {
            generation: search_space,
            route: self.final_best_route,
            distance: self.final_best_distance,
            fitness,
        };
        (solution, self.total_time)
    }
}
