//! Frames a solver byte stream into payloads.
//!
//! Frames are separated by a blank line (`\n\n`). Each frame is parsed on its
//! own, so a malformed frame yields an `Err` item and decoding carries on
//! with the next one. Only stream-level problems surface as the codec error.
use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::{debug, warn};
use tsp_core_types::Payload;

use crate::error::{DecodeError, FrameError};
use crate::metrics;
use crate::payload::parse_frame;

pub const FRAME_DELIMITER: &[u8] = b"\n\n";

/// Maximum size of a single frame, delimiter excluded.
pub const MAX_FRAME_LENGTH: usize = 1024 * 1024;

#[derive(Debug)]
pub struct FrameCodec {
    max_frame_length: usize,
    /// Discarding the tail of an oversized frame until the next delimiter.
    skipping: bool,
    skipped: usize,
    /// Bytes of the buffered partial frame already searched for a delimiter.
    next_index: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::with_max_frame_length(MAX_FRAME_LENGTH)
    }

    pub fn with_max_frame_length(max_frame_length: usize) -> Self {
        Self {
            max_frame_length,
            skipping: false,
            skipped: 0,
            next_index: 0,
        }
    }

    pub fn max_frame_length(&self) -> usize {
        self.max_frame_length
    }

    /// Pulls the next complete frame out of `src`, skipping blank segments.
    /// Returns `None` when more bytes are needed.
    pub fn next_frame(&mut self, src: &mut BytesMut) -> Option<Result<Payload, FrameError>> {
        loop {
            if self.skipping {
                match find_delimiter(src) {
                    Some(pos) => {
                        let bytes = self.skipped + pos;
                        src.advance(pos + FRAME_DELIMITER.len());
                        self.skipping = false;
                        self.skipped = 0;
                        warn!(bytes, "frame codec: dropped oversized frame");
                        metrics::record_rejected();
                        return Some(Err(FrameError::Oversized {
                            bytes,
                            limit: self.max_frame_length,
                        }));
                    }
                    None => {
                        // The delimiter may straddle chunks; keep the last byte.
                        let keep = usize::from(src.last() == Some(&b'\n'));
                        let drop = src.len() - keep;
                        self.skipped += drop;
                        src.advance(drop);
                        return None;
                    }
                }
            }

            // Step back one byte in case the delimiter straddles two reads.
            let start = self
                .next_index
                .min(src.len())
                .saturating_sub(FRAME_DELIMITER.len() - 1);
            let Some(pos) = find_delimiter(&src[start..]).map(|pos| start + pos) else {
                self.next_index = src.len();
                if src.len() > self.max_frame_length {
                    debug!(
                        buffered = src.len(),
                        "frame codec: partial frame over limit, skipping to next delimiter"
                    );
                    self.skipping = true;
                    self.next_index = 0;
                    continue;
                }
                return None;
            };

            self.next_index = 0;
            let frame = src.split_to(pos);
            src.advance(FRAME_DELIMITER.len());

            if frame.len() > self.max_frame_length {
                warn!(bytes = frame.len(), "frame codec: dropped oversized frame");
                metrics::record_rejected();
                return Some(Err(FrameError::Oversized {
                    bytes: frame.len(),
                    limit: self.max_frame_length,
                }));
            }
            if is_blank(&frame) {
                continue;
            }

            let parsed = parse_frame(&frame);
            match &parsed {
                Ok(_) => metrics::record_decoded(),
                Err(err) => {
                    warn!(error = %err, "frame codec: rejected frame");
                    metrics::record_rejected();
                }
            }
            return Some(parsed);
        }
    }

    /// Called once the byte source is exhausted. Anything left that is not
    /// whitespace was a frame cut off mid-flight, including the unterminated
    /// tail of an oversized frame.
    pub fn finish(&mut self, src: &mut BytesMut) -> Result<(), DecodeError> {
        let was_skipping = std::mem::take(&mut self.skipping);
        let skipped = std::mem::take(&mut self.skipped);
        self.next_index = 0;
        if !was_skipping && is_blank(src) {
            src.clear();
            return Ok(());
        }
        let bytes = skipped + src.len();
        let remainder = String::from_utf8_lossy(src).into_owned();
        src.clear();
        warn!(bytes, "frame codec: stream ended inside a frame");
        metrics::record_truncated();
        Err(DecodeError::Truncated { bytes, remainder })
    }
}

impl Decoder for FrameCodec {
    type Item = Result<Payload, FrameError>;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.next_frame(src))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.next_frame(src) {
            return Ok(Some(item));
        }
        self.finish(src)?;
        Ok(None)
    }
}

fn find_delimiter(src: &[u8]) -> Option<usize> {
    src.windows(FRAME_DELIMITER.len())
        .position(|window| window == FRAME_DELIMITER)
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}
