use std::time::Duration;

use thiserror::Error;
use tsp_core_types::TableError;

/// Rejected before anything is reset or sent to the solver.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("{field} must be a number, got {value:?}")]
    NotANumber { field: &'static str, value: String },
    #[error("{field} must be true or false, got {value:?}")]
    NotABool { field: &'static str, value: String },
    #[error("{field} = {value} is out of range ({expected})")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("unknown solver parameter {0:?}")]
    UnknownParameter(String),
    #[error("expected key=value, got {0:?}")]
    MalformedOverride(String),
    #[error("invalid solver url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("distance table needs at least {min} locations for {mode}, got {actual}")]
    TooFewLocations {
        mode: &'static str,
        min: usize,
        actual: usize,
    },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("solver answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("no data from solver for {}ms", .0.as_millis())]
    Stalled(Duration),
    #[error("unexpected solver response: {0}")]
    InvalidResponse(String),
    #[error("could not encode distance table: {0}")]
    Encode(#[from] TableError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum HttpSetupError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Why an ingest task stopped early.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("run was superseded by a newer submission")]
    Superseded,
}
