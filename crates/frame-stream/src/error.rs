use thiserror::Error;

/// A single frame could not be turned into a payload. Decoding continues
/// with the next frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("frame payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame payload is not a solution: {0}")]
    InvalidSolution(String),
    #[error("run summary has an invalid total_time: {0}")]
    InvalidSummary(String),
    #[error("frame of {bytes} bytes exceeds the {limit} byte limit")]
    Oversized { bytes: usize, limit: usize },
}

/// Stream-level failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("stream closed with {bytes} undecoded bytes")]
    Truncated { bytes: usize, remainder: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
