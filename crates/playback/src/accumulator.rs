//! Append-only log of the solutions received for the current run.
//!
//! Every write carries the [`RunToken`] handed out by [`SolutionAccumulator::reset`].
//! Once a newer run has been started, writes from the old one are rejected,
//! so a superseded response can never leak frames into the fresh log.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use tokio::sync::watch;
use tracing::{debug, warn};
use tsp_core_types::{RunId, Solution};

use crate::error::PlaybackError;
use crate::metrics;

/// Proof of ownership of one run. Only [`SolutionAccumulator::reset`] creates one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunToken(RunId);

impl RunToken {
    pub fn run(&self) -> RunId {
        self.0
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum RunStatus {
    #[default]
    Idle,
    InFlight,
    Complete,
    Failed(String),
}

impl RunStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunStatus::Complete | RunStatus::Failed(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::InFlight => "in-flight",
            RunStatus::Complete => "complete",
            RunStatus::Failed(_) => "failed",
        }
    }
}

/// Cheap summary of the accumulator, published on every change.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunView {
    pub run: RunId,
    pub len: usize,
    pub execution_time: Option<f64>,
    pub status: RunStatus,
}

/// Owned copy of the log at one instant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub run: RunId,
    pub solutions: Vec<Arc<Solution>>,
    pub execution_time: Option<f64>,
    pub status: RunStatus,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn last(&self) -> Option<&Arc<Solution>> {
        self.solutions.last()
    }
}

#[derive(Debug, Default)]
struct State {
    run: RunId,
    solutions: Vec<Arc<Solution>>,
    execution_time: Option<f64>,
    status: RunStatus,
}

impl State {
    fn view(&self) -> RunView {
        RunView {
            run: self.run,
            len: self.solutions.len(),
            execution_time: self.execution_time,
            status: self.status.clone(),
        }
    }
}

/// Consistent read access to the log; holds a shared lock while alive.
pub struct RunReader<'a> {
    state: RwLockReadGuard<'a, State>,
}

impl RunReader<'_> {
    pub fn run(&self) -> RunId {
        self.state.run
    }

    pub fn len(&self) -> usize {
        self.state.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.solutions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Solution>> {
        self.state.solutions.get(index)
    }

    pub fn execution_time(&self) -> Option<f64> {
        self.state.execution_time
    }

    pub fn status(&self) -> &RunStatus {
        &self.state.status
    }

    pub fn view(&self) -> RunView {
        self.state.view()
    }
}

#[derive(Debug)]
pub struct SolutionAccumulator {
    state: RwLock<State>,
    changes: watch::Sender<RunView>,
}

impl Default for SolutionAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl SolutionAccumulator {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(RunView::default());
        Self {
            state: RwLock::new(State::default()),
            changes,
        }
    }

    /// Starts a new run: clears solutions and execution time in one step and
    /// invalidates every token issued before.
    pub fn reset(&self) -> RunToken {
        let mut state = self.state.write();
        state.run = state.run.next();
        state.solutions.clear();
        state.execution_time = None;
        state.status = RunStatus::InFlight;
        self.changes.send_replace(state.view());
        metrics::record_run_started();
        metrics::set_buffered(0);
        debug!(run = %state.run, "accumulator reset");
        RunToken(state.run)
    }

    /// Appends a solution and returns the new length.
    pub fn append(&self, token: RunToken, solution: Solution) -> Result<usize, PlaybackError> {
        self.update(token, |state| {
            state.solutions.push(Arc::new(solution));
            metrics::set_buffered(state.solutions.len());
            state.solutions.len()
        })
    }

    pub fn set_execution_time(&self, token: RunToken, millis: f64) -> Result<(), PlaybackError> {
        self.update(token, |state| {
            if let Some(previous) = state.execution_time {
                debug!(run = %state.run, previous, millis, "execution time overwritten");
            }
            state.execution_time = Some(millis);
        })
    }

    pub fn complete(&self, token: RunToken) -> Result<(), PlaybackError> {
        self.update(token, |state| state.status = RunStatus::Complete)
    }

    /// Marks the run failed. Solutions already received stay readable.
    pub fn fail(&self, token: RunToken, reason: impl Into<String>) -> Result<(), PlaybackError> {
        let reason = reason.into();
        self.update(token, |state| state.status = RunStatus::Failed(reason))
    }

    pub fn is_current(&self, token: RunToken) -> bool {
        self.state.read().run == token.0
    }

    pub fn current_run(&self) -> RunId {
        self.state.read().run
    }

    pub fn read(&self) -> RunReader<'_> {
        RunReader {
            state: self.state.read(),
        }
    }

    pub fn view(&self) -> RunView {
        self.state.read().view()
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.read();
        Snapshot {
            run: state.run,
            solutions: state.solutions.clone(),
            execution_time: state.execution_time,
            status: state.status.clone(),
        }
    }

    /// Receives the latest [`RunView`] after every reset, append or status change.
    pub fn subscribe(&self) -> watch::Receiver<RunView> {
        self.changes.subscribe()
    }

    fn update<R>(
        &self,
        token: RunToken,
        apply: impl FnOnce(&mut State) -> R,
    ) -> Result<R, PlaybackError> {
        let mut state = self.state.write();
        if state.run != token.0 {
            metrics::record_stale_write();
            warn!(token = %token.0, current = %state.run, "dropping write from superseded run");
            return Err(PlaybackError::StaleRun {
                token: token.0,
                current: state.run,
            });
        }
        let result = apply(&mut state);
        self.changes.send_replace(state.view());
        Ok(result)
    }
}
