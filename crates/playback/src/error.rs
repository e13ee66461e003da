use thiserror::Error;
use tsp_core_types::RunId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("{token} was superseded by {current}")]
    StaleRun { token: RunId, current: RunId },
}
