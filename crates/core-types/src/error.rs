use thiserror::Error;

/// Errors raised while loading or validating the static lookup tables.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("table has no locations")]
    Empty,
    #[error("duplicate location {0:?}")]
    DuplicateLocation(String),
    #[error("location {0:?} has no coordinate")]
    MissingCoordinate(String),
    #[error("row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("row {row} is labelled {found:?} but column {row} is {expected:?}")]
    LabelMismatch {
        row: usize,
        expected: String,
        found: String,
    },
    #[error("cell [{row}][{column}] is not a valid distance: {value:?}")]
    InvalidCell {
        row: usize,
        column: usize,
        value: String,
    },
    #[error("location table has {locations} entries but distance table has {distances}")]
    SizeMismatch { locations: usize, distances: usize },
    #[error("tables disagree at index {index}: {locations:?} vs {distances:?}")]
    IndexSpaceMismatch {
        index: usize,
        locations: String,
        distances: String,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
