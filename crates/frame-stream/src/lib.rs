//! Incremental decoding of the solver's `data: <json>` frame stream.
//!
//! [`FrameCodec`] plugs into `tokio_util::codec::FramedRead`; [`FrameDecoder`]
//! is the push-style wrapper used when chunks arrive from an HTTP body.

pub mod codec;
pub mod decoder;
pub mod error;
pub mod metrics;
pub mod payload;

pub use codec::{FrameCodec, FRAME_DELIMITER, MAX_FRAME_LENGTH};
pub use decoder::FrameDecoder;
pub use error::{DecodeError, FrameError};
pub use metrics::register_metrics;
pub use payload::{classify, encode_frame, parse_frame};
