use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use tsp_geometry::GeometryResolver;
use tsp_playback::{PlaybackConfig, PlaybackFrame, PlaybackPhase, RunStatus};
use tsp_solver_client::{
    RunEvent, RunOrchestrator, RunOutcome, RunReport, SolverRequest, SolverTransport,
};

use super::context::CliContext;
use super::output::{emit, OutputFormat};
use crate::render::{ReportView, SolutionView};

/// Submits one run and renders its playback until it settles, fails or is
/// interrupted.
pub async fn play(
    ctx: &CliContext,
    transport: Arc<dyn SolverTransport>,
    request: SolverRequest,
    resolver: GeometryResolver,
    playback: PlaybackConfig,
) -> Result<()> {
    let orchestrator =
        RunOrchestrator::new(transport, playback, ctx.config().solver.stall_timeout());
    let mut frames = orchestrator.scheduler().subscribe();
    let mut events = orchestrator.subscribe();
    let mut printer = FramePrinter::new(ctx.output(), resolver);

    let handle = orchestrator.submit(request)?;
    let run = handle.run();
    let report = handle.wait();
    tokio::pin!(report);
    let mut finished: Option<RunReport> = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!(run = %run, "interrupted, cancelling run");
                orchestrator.shutdown();
                break;
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                if frame.run != run {
                    continue;
                }
                printer.show(&frame)?;
                if frame.phase == PlaybackPhase::Settled
                    || matches!(frame.status, RunStatus::Failed(_))
                {
                    break;
                }
            }
            result = &mut report, if finished.is_none() => {
                let ended = !matches!(result.outcome, RunOutcome::Completed);
                finished = Some(result);
                if ended {
                    break;
                }
            }
            event = events.recv() => match event {
                Ok(RunEvent::FrameRejected { run, error }) => {
                    warn!(run = %run, %error, "skipped malformed frame");
                }
                Ok(other) => debug!(?other, "run event"),
                Err(RecvError::Lagged(missed)) => debug!(missed, "run events lagged"),
                Err(RecvError::Closed) => {}
            },
        }
    }

    let report = match finished {
        Some(report) => report,
        None => report.await,
    };
    let failure = match &report.outcome {
        RunOutcome::Failed(reason) => Some(reason.clone()),
        _ => None,
    };
    emit(ctx.output(), &ReportView::from(report), ReportView::human)?;
    if let Some(reason) = failure {
        bail!("solver run failed: {reason}");
    }
    Ok(())
}

/// Prints a frame whenever the displayed solution or the phase changes.
struct FramePrinter {
    format: OutputFormat,
    resolver: GeometryResolver,
    shown: Option<(usize, PlaybackPhase)>,
}

impl FramePrinter {
    fn new(format: OutputFormat, resolver: GeometryResolver) -> Self {
        Self {
            format,
            resolver,
            shown: None,
        }
    }

    /// Records `frame` as displayed; false when it would repeat the last line.
    fn claim(&mut self, frame: &PlaybackFrame) -> bool {
        let key = (frame.cursor, frame.phase);
        if frame.solution.is_none() || self.shown == Some(key) {
            return false;
        }
        self.shown = Some(key);
        true
    }

    fn show(&mut self, frame: &PlaybackFrame) -> Result<()> {
        if !self.claim(frame) {
            return Ok(());
        }
        match SolutionView::from_frame(&self.resolver, frame) {
            Ok(Some(view)) => emit(self.format, &view, SolutionView::human),
            Ok(None) => Ok(()),
            Err(err) => {
                warn!(run = %frame.run, cursor = frame.cursor, %err, "cannot draw solution");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tsp_core_types::{Dataset, RunId, Solution};

    use super::*;

    fn frame(cursor: usize, phase: PlaybackPhase) -> PlaybackFrame {
        PlaybackFrame {
            run: RunId(1),
            cursor,
            total: 2,
            phase,
            solution: Some(Arc::new(Solution {
                generation: cursor as u64,
                route: vec![0, 1],
                distance: 10.0,
                fitness: 0.1,
            })),
            execution_time: None,
            status: RunStatus::InFlight,
        }
    }

    #[test]
    fn settling_on_a_shown_solution_prints_again() {
        let resolver = GeometryResolver::new(Dataset::bundled().unwrap());
        let mut printer = FramePrinter::new(OutputFormat::Json, resolver);

        assert!(!printer.claim(&PlaybackFrame::default()));
        assert!(printer.claim(&frame(0, PlaybackPhase::Playing)));
        assert!(!printer.claim(&frame(0, PlaybackPhase::Playing)));
        assert!(printer.claim(&frame(1, PlaybackPhase::Playing)));
        assert!(printer.claim(&frame(1, PlaybackPhase::Settled)));
        assert!(!printer.claim(&frame(1, PlaybackPhase::Settled)));
    }
}
