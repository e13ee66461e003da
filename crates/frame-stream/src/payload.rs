use serde_json::Value;
use tsp_core_types::{Payload, RunSummary, Solution};

use crate::error::FrameError;

pub const DATA_PREFIX: &str = "data:";

/// Parses one complete frame (delimiter already removed).
pub fn parse_frame(frame: &[u8]) -> Result<Payload, FrameError> {
    let text = std::str::from_utf8(frame)?.trim();
    let body = text
        .strip_prefix(DATA_PREFIX)
        .map(str::trim_start)
        .unwrap_or(text);
    let value: Value = serde_json::from_str(body)?;
    classify(value)
}

/// A payload carrying `total_time` is a run summary; anything else must be a
/// structurally valid solution.
pub fn classify(value: Value) -> Result<Payload, FrameError> {
    let Value::Object(map) = value else {
        return Err(FrameError::InvalidSolution(format!(
            "expected a JSON object, got {value}"
        )));
    };

    if let Some(total) = map.get("total_time") {
        let total_time = total
            .as_f64()
            .filter(|ms| ms.is_finite() && *ms >= 0.0)
            .ok_or_else(|| FrameError::InvalidSummary(total.to_string()))?;
        return Ok(Payload::Summary(RunSummary { total_time }));
    }

    let solution: Solution = serde_json::from_value(Value::Object(map))
        .map_err(|err| FrameError::InvalidSolution(err.to_string()))?;
    if !solution.distance.is_finite() || solution.distance < 0.0 {
        return Err(FrameError::InvalidSolution(format!(
            "distance {} is not a non-negative number",
            solution.distance
        )));
    }
    Ok(Payload::Solution(solution))
}

/// Serialises a payload as the solver would put it on the wire.
pub fn encode_frame(payload: &Payload) -> Result<String, serde_json::Error> {
    let body = match payload {
        Payload::Solution(solution) => serde_json::to_string(solution)?,
        Payload::Summary(summary) => serde_json::to_string(summary)?,
    };
    Ok(format!("data: {body}\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_the_data_prefix() {
        let payload =
            parse_frame(br#"data: {"generation":0,"route":[0,1,2],"distance":100,"fitness":0}"#)
                .unwrap();
        match payload {
            Payload::Solution(solution) => {
                assert_eq!(solution.route, vec![0, 1, 2]);
                assert_eq!(solution.distance, 100.0);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn bare_json_is_accepted() {
        assert_eq!(
            parse_frame(br#"{"total_time": 50}"#).unwrap(),
            Payload::Summary(RunSummary { total_time: 50.0 })
        );
    }

    #[test]
    fn total_time_wins_over_solution_fields() {
        let payload = parse_frame(
            br#"data: {"total_time":1.5,"generation":1,"route":[0],"distance":1,"fitness":1}"#,
        )
        .unwrap();
        assert!(matches!(payload, Payload::Summary(_)));
    }

    #[test]
    fn structural_problems_are_reported() {
        let cases: [&[u8]; 6] = [
            br#"data: {"generation":0,"route":[0,"x"],"distance":1,"fitness":0}"#,
            br#"data: {"generation":1.5,"route":[0],"distance":1,"fitness":0}"#,
            br#"data: {"generation":0,"route":[0],"distance":"far","fitness":0}"#,
            br#"data: {"generation":0,"route":[0],"distance":-4,"fitness":0}"#,
            br#"data: {"generation":0,"route":[0],"distance":4}"#,
            br#"data: [1,2,3]"#,
        ];
        for case in cases {
            assert!(
                matches!(parse_frame(case), Err(FrameError::InvalidSolution(_))),
                "{}",
                String::from_utf8_lossy(case)
            );
        }
        assert!(matches!(
            parse_frame(br#"data: {"total_time":-1}"#),
            Err(FrameError::InvalidSummary(_))
        ));
        assert!(matches!(
            parse_frame(b"data: {not valid json"),
            Err(FrameError::Json(_))
        ));
    }

    #[test]
    fn encoded_frames_end_with_a_blank_line() {
        let frame = encode_frame(&Payload::Summary(RunSummary { total_time: 20.0 })).unwrap();
        assert_eq!(frame, "data: {\"total_time\":20.0}\n\n");
    }
}
