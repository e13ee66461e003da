//! Turns playback frames and run reports into what the terminal shows.

use std::time::Duration;

use serde::Serialize;
use tsp_core_types::{Coordinate, RunId};
use tsp_geometry::{GeometryError, GeometryResolver};
use tsp_playback::{PlaybackFrame, PlaybackPhase};
use tsp_solver_client::{RunOutcome, RunReport};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegView {
    pub from: String,
    pub to: String,
    pub km: f64,
}

/// The solution under the playback cursor, resolved against the dataset.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SolutionView {
    pub run: RunId,
    /// 1-based position in the run.
    pub position: usize,
    pub total: usize,
    pub phase: PlaybackPhase,
    pub generation: u64,
    pub distance: f64,
    pub fitness: f64,
    pub route: Vec<usize>,
    pub stops: Vec<String>,
    pub coordinates: Vec<Coordinate>,
    pub legs: Vec<LegView>,
    pub leg_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<String>,
}

impl SolutionView {
    /// `Ok(None)` when the frame has nothing to draw.
    pub fn from_frame(
        resolver: &GeometryResolver,
        frame: &PlaybackFrame,
    ) -> Result<Option<Self>, GeometryError> {
        let Some(solution) = frame.solution.as_ref() else {
            return Ok(None);
        };
        let geometry = resolver.resolve(&solution.route)?;
        let locations = &resolver.dataset().locations;
        let name = |index: usize| locations.name(index).unwrap_or("?").to_string();
        let legs = geometry
            .edges
            .iter()
            .map(|edge| LegView {
                from: name(edge.from),
                to: name(edge.to),
                km: edge.kilometers(),
            })
            .collect();

        Ok(Some(Self {
            run: frame.run,
            position: frame.cursor + 1,
            total: frame.total,
            phase: frame.phase,
            generation: solution.generation,
            distance: solution.distance,
            fitness: solution.fitness,
            route: solution.route.clone(),
            stops: resolver
                .location_names(&solution.route)
                .into_iter()
                .map(str::to_string)
                .collect(),
            coordinates: geometry.coordinates.clone(),
            leg_km: geometry.total_kilometers(),
            legs,
            execution_time: frame.execution_time.map(format_execution_time),
        }))
    }

    pub fn human(&self) -> String {
        format!(
            "[{} {}/{} {}] generation {}: distance {:.2} ({:.1} km over {} legs) {}",
            self.run,
            self.position,
            self.total,
            phase_label(self.phase),
            self.generation,
            self.distance,
            self.leg_km,
            self.legs.len(),
            self.stops.join(" -> "),
        )
    }
}

/// Summary printed once a run has ended.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportView {
    #[serde(flatten)]
    pub report: RunReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_human: Option<String>,
}

impl From<RunReport> for ReportView {
    fn from(report: RunReport) -> Self {
        let execution_time_human = report.execution_time.map(format_execution_time);
        Self {
            report,
            execution_time_human,
        }
    }
}

impl ReportView {
    pub fn human(&self) -> String {
        let report = &self.report;
        let mut text = match &report.outcome {
            RunOutcome::Completed => format!(
                "{} ({}) complete: {} solutions",
                report.run, report.mode, report.appended
            ),
            RunOutcome::Failed(reason) => format!(
                "{} ({}) failed after {} solutions: {}",
                report.run, report.mode, report.appended, reason
            ),
            RunOutcome::Superseded => format!("{} ({}) interrupted", report.run, report.mode),
        };
        if report.rejected > 0 {
            text.push_str(&format!(", {} malformed frames skipped", report.rejected));
        }
        if report.truncated {
            text.push_str(", stream ended mid-frame");
        }
        if let Some(time) = &self.execution_time_human {
            text.push_str(&format!("\nexecution time: {time}"));
        }
        text
    }
}

/// Formats the solver's millisecond wall-clock time, e.g. `1s 234ms`.
pub fn format_execution_time(millis: f64) -> String {
    match Duration::try_from_secs_f64(millis / 1000.0) {
        Ok(duration) => {
            let rounded = Duration::from_millis(duration.as_millis() as u64);
            if rounded.is_zero() {
                format!("{millis:.3}ms")
            } else {
                humantime::format_duration(rounded).to_string()
            }
        }
        Err(_) => format!("{millis}ms"),
    }
}

fn phase_label(phase: PlaybackPhase) -> &'static str {
    match phase {
        PlaybackPhase::Idle => "idle",
        PlaybackPhase::Playing => "playing",
        PlaybackPhase::Settled => "settled",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tsp_core_types::{Dataset, Solution, SolverMode};
    use tsp_playback::RunStatus;

    use super::*;

    fn frame(route: Vec<usize>, phase: PlaybackPhase) -> PlaybackFrame {
        PlaybackFrame {
            run: RunId(3),
            cursor: 1,
            total: 2,
            phase,
            solution: Some(Arc::new(Solution {
                generation: 7,
                route,
                distance: 123.456,
                fitness: 0.008,
            })),
            execution_time: Some(1234.0),
            status: RunStatus::Complete,
        }
    }

    #[test]
    fn solution_view_resolves_names_and_legs() {
        let resolver = GeometryResolver::new(Dataset::bundled().unwrap());
        let view = SolutionView::from_frame(&resolver, &frame(vec![0, 1, 2], PlaybackPhase::Playing))
            .unwrap()
            .unwrap();

        assert_eq!(view.position, 2);
        assert_eq!(view.stops.len(), 3);
        assert_eq!(view.coordinates.len(), 4);
        assert_eq!(view.legs.len(), 3);
        assert_eq!(view.legs[2].to, view.stops[0]);
        let sum: f64 = view.legs.iter().map(|leg| leg.km).sum();
        assert!((sum - view.leg_km).abs() < 1e-9);

        let line = view.human();
        assert!(line.starts_with("[run-3 2/2 playing] generation 7: distance 123.46"));
        assert!(line.ends_with(&view.stops.join(" -> ")));
    }

    #[test]
    fn execution_time_is_carried_for_structured_output() {
        let resolver = GeometryResolver::new(Dataset::bundled().unwrap());
        let view = SolutionView::from_frame(&resolver, &frame(vec![0, 1], PlaybackPhase::Settled))
            .unwrap()
            .unwrap();
        assert_eq!(view.execution_time.as_deref(), Some("1s 234ms"));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["phase"], "settled");
        assert_eq!(json["legs"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn empty_frame_has_no_view() {
        let resolver = GeometryResolver::new(Dataset::bundled().unwrap());
        let frame = PlaybackFrame::default();
        assert!(SolutionView::from_frame(&resolver, &frame).unwrap().is_none());
    }

    #[test]
    fn out_of_range_route_is_an_error() {
        let resolver = GeometryResolver::new(Dataset::bundled().unwrap());
        let result = SolutionView::from_frame(&resolver, &frame(vec![0, 42], PlaybackPhase::Playing));
        assert_eq!(result, Err(GeometryError::UnknownLocation { index: 42 }));
    }

    #[test]
    fn report_summary_lists_anomalies() {
        let view = ReportView::from(RunReport {
            run: RunId(1),
            mode: SolverMode::Genetic,
            appended: 4,
            rejected: 1,
            truncated: true,
            execution_time: Some(250.0),
            outcome: RunOutcome::Completed,
        });
        let text = view.human();
        assert!(text.starts_with("run-1 (genetic) complete: 4 solutions"));
        assert!(text.contains("1 malformed frames skipped"));
        assert!(text.contains("stream ended mid-frame"));
        assert!(text.contains("execution time: 250ms"));
    }

    #[test]
    fn execution_time_formatting() {
        assert_eq!(format_execution_time(1234.0), "1s 234ms");
        assert_eq!(format_execution_time(0.25), "0.250ms");
        assert_eq!(format_execution_time(f64::INFINITY), "infms");
    }
}
