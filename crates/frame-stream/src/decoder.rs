use bytes::BytesMut;
use tsp_core_types::Payload;

use crate::codec::FrameCodec;
use crate::error::{DecodeError, FrameError};

/// Push-style driver around [`FrameCodec`] for callers that receive the
/// body as arbitrary byte chunks.
///
/// The sequence of results is the same however the input is split.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    codec: FrameCodec,
    buffer: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codec(codec: FrameCodec) -> Self {
        Self {
            codec,
            buffer: BytesMut::new(),
        }
    }

    /// Appends a chunk and returns every frame it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<Payload, FrameError>> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(frame) = self.codec.next_frame(&mut self.buffer) {
            frames.push(frame);
        }
        frames
    }

    /// Bytes held back waiting for a delimiter.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Marks end of input. A non-blank remainder is reported as truncation.
    pub fn finish(mut self) -> Result<(), DecodeError> {
        self.codec.finish(&mut self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsp_core_types::{RunSummary, Solution};

    const SCENARIO: &str = concat!(
        "data: {\"generation\":0,\"route\":[0,1,2],\"distance\":100,\"fitness\":0}\n\n",
        "data: {\"generation\":1,\"route\":[0,2,1],\"distance\":90,\"fitness\":0}\n\n",
        "data: {\"total_time\":50}\n\n",
    );

    fn solution(generation: u64, route: &[usize], distance: f64) -> Payload {
        Payload::Solution(Solution {
            generation,
            route: route.to_vec(),
            distance,
            fitness: 0.0,
        })
    }

    fn accepted(results: Vec<Result<Payload, FrameError>>) -> Vec<Payload> {
        results.into_iter().filter_map(Result::ok).collect()
    }

    fn decode_in_pieces(input: &[u8], cuts: &[usize]) -> Vec<Payload> {
        let mut decoder = FrameDecoder::new();
        let mut out = Vec::new();
        let mut start = 0;
        for &cut in cuts.iter().chain(std::iter::once(&input.len())) {
            out.extend(accepted(decoder.feed(&input[start..cut])));
            start = cut;
        }
        decoder.finish().unwrap();
        out
    }

    #[test]
    fn single_chunk_yields_all_frames() {
        let mut decoder = FrameDecoder::new();
        let payloads = accepted(decoder.feed(SCENARIO.as_bytes()));
        assert_eq!(
            payloads,
            vec![
                solution(0, &[0, 1, 2], 100.0),
                solution(1, &[0, 2, 1], 90.0),
                Payload::Summary(RunSummary { total_time: 50.0 }),
            ]
        );
        assert_eq!(decoder.pending(), 0);
        decoder.finish().unwrap();
    }

    #[test]
    fn result_is_independent_of_chunk_boundaries() {
        let input = SCENARIO.as_bytes();
        let expected = decode_in_pieces(input, &[]);
        assert_eq!(expected.len(), 3);

        for first in 0..=input.len() {
            assert_eq!(decode_in_pieces(input, &[first]), expected, "cut at {first}");
        }
        for first in (0..input.len()).step_by(7) {
            for second in first..=input.len() {
                assert_eq!(
                    decode_in_pieces(input, &[first, second]),
                    expected,
                    "cuts at {first} and {second}"
                );
            }
        }
    }

    #[test]
    fn byte_at_a_time() {
        let input = SCENARIO.as_bytes();
        let cuts: Vec<usize> = (1..input.len()).collect();
        assert_eq!(decode_in_pieces(input, &cuts).len(), 3);
    }

    #[test]
    fn multibyte_text_split_across_chunks() {
        let frame = "data: {\"generation\":2,\"route\":[1],\"distance\":5,\"fitness\":0,\"note\":\"Zürich → Köln\"}\n\n";
        let bytes = frame.as_bytes();
        let split = frame.find('ü').unwrap() + 1;
        assert!(!frame.is_char_boundary(split));
        assert_eq!(decode_in_pieces(bytes, &[split]), vec![solution(2, &[1], 5.0)]);
    }

    #[test]
    fn malformed_frame_then_valid_frame() {
        let mut decoder = FrameDecoder::new();
        let mut results = decoder.feed(b"data: {\"generation\":0,\"ro");
        assert!(results.is_empty());
        results.extend(decoder.feed(
            b"ute\":[0,1],\"distance\":\"x\",\"fitness\":0}\n\ndata: {\"generation\":1,\"route\":[1,0],\"distance\":7,\"fitness\":0}\n\n",
        ));
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Err(FrameError::InvalidSolution(_))));
        assert_eq!(results[1].as_ref().unwrap(), &solution(1, &[1, 0], 7.0));
    }

    #[test]
    fn unterminated_tail_is_truncation() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(accepted(decoder.feed(b"data: {\"total_time\":50}")).len(), 0);
        assert!(decoder.pending() > 0);
        assert!(matches!(
            decoder.finish(),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn unterminated_oversized_frame_is_truncation() {
        let mut decoder = FrameDecoder::with_codec(FrameCodec::with_max_frame_length(8));
        assert!(decoder
            .feed(b"data: {\"generation\":1,\"route\":[0,1,2]")
            .is_empty());
        assert_eq!(decoder.pending(), 0);
        match decoder.finish() {
            Err(DecodeError::Truncated { bytes, .. }) => assert_eq!(bytes, 37),
            other => panic!("expected truncation, got {other:?}"),
        }
    }
}
