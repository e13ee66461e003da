//! Cadence-driven cursor over the [`SolutionAccumulator`].
//!
//! The scheduler reacts to two events only: a timer tick, which advances the
//! cursor by at most one position, and an accumulator change, which
//! recomputes the phase without moving the cursor. Ingestion speed never
//! moves the cursor.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use tsp_core_types::{RunId, Solution};

use crate::accumulator::{RunReader, RunStatus, SolutionAccumulator};
use crate::metrics;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    /// No run, or the run failed.
    #[default]
    Idle,
    Playing,
    /// Caught up with the last solution of a completed run.
    Settled,
}

/// What the render surface should show right now.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackFrame {
    pub run: RunId,
    pub cursor: usize,
    pub total: usize,
    pub phase: PlaybackPhase,
    pub solution: Option<Arc<Solution>>,
    pub execution_time: Option<f64>,
    pub status: RunStatus,
}

#[derive(Debug, Default)]
struct Cursor {
    run: RunId,
    index: usize,
}

impl Cursor {
    /// A cursor from an older run restarts at the head of the new one.
    fn follow(&mut self, run: RunId) {
        if self.run != run {
            self.run = run;
            self.index = 0;
        }
    }
}

struct Ticker {
    cadence: Duration,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

pub struct PlaybackScheduler {
    accumulator: Arc<SolutionAccumulator>,
    cursor: Mutex<Cursor>,
    ticker: Mutex<Option<Ticker>>,
    frames: watch::Sender<PlaybackFrame>,
}

impl PlaybackScheduler {
    pub fn new(accumulator: Arc<SolutionAccumulator>) -> Self {
        let (frames, _) = watch::channel(PlaybackFrame::default());
        Self {
            accumulator,
            cursor: Mutex::new(Cursor::default()),
            ticker: Mutex::new(None),
            frames,
        }
    }

    pub fn accumulator(&self) -> &Arc<SolutionAccumulator> {
        &self.accumulator
    }

    /// Advances the cursor by one if a later solution is available.
    pub fn tick(&self) -> PlaybackFrame {
        self.step(true)
    }

    /// Re-evaluates the phase after the accumulator changed.
    pub fn on_frame_appended(&self) -> PlaybackFrame {
        self.step(false)
    }

    /// The solution at `min(cursor, len - 1)`, or `None` while the run is empty.
    pub fn current(&self) -> Option<Arc<Solution>> {
        self.frame().solution
    }

    pub fn cursor(&self) -> usize {
        self.frame().cursor
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.frame().phase
    }

    pub fn is_settled(&self) -> bool {
        self.phase() == PlaybackPhase::Settled
    }

    /// Busy indicator: a run is in progress or playback has not caught up yet.
    pub fn is_busy(&self) -> bool {
        self.phase() == PlaybackPhase::Playing
    }

    /// Current state, without publishing it.
    pub fn frame(&self) -> PlaybackFrame {
        let mut cursor = self.cursor.lock();
        let reader = self.accumulator.read();
        cursor.follow(reader.run());
        compose(&cursor, &reader)
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackFrame> {
        self.frames.subscribe()
    }

    /// Starts the playback timer. Calling it again while a timer with the same
    /// cadence is running is a no-op; a different cadence replaces the timer.
    pub fn start(self: &Arc<Self>, cadence: Duration) {
        let mut slot = self.ticker.lock();
        if let Some(ticker) = slot.as_ref() {
            if ticker.cadence == cadence && !ticker.task.is_finished() {
                return;
            }
        }
        // Dropping the previous ticker cancels it.
        *slot = Some(self.spawn_ticker(cadence));
        debug!(cadence_ms = cadence.as_millis() as u64, "playback timer started");
    }

    /// Stops the timer. The cursor and displayed solution are kept.
    pub fn stop(&self) {
        if self.ticker.lock().take().is_some() {
            debug!("playback timer stopped");
        }
        self.step(false);
    }

    pub fn is_running(&self) -> bool {
        self.ticker
            .lock()
            .as_ref()
            .map(|ticker| !ticker.task.is_finished())
            .unwrap_or(false)
    }

    fn spawn_ticker(self: &Arc<Self>, cadence: Duration) -> Ticker {
        let scheduler: Weak<Self> = Arc::downgrade(self);
        let mut changes = self.accumulator.subscribe();
        let cancel = CancellationToken::new();
        let loop_token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + cadence, cadence);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                let advance = tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = ticker.tick() => true,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        false
                    }
                };
                let Some(scheduler) = scheduler.upgrade() else {
                    break;
                };
                let frame = scheduler.step(advance);
                if frame.phase != PlaybackPhase::Playing {
                    debug!(run = %frame.run, phase = ?frame.phase, "playback timer finished");
                    break;
                }
            }
        });
        Ticker {
            cadence,
            cancel,
            task,
        }
    }

    fn step(&self, advance: bool) -> PlaybackFrame {
        let mut cursor = self.cursor.lock();
        let reader = self.accumulator.read();
        cursor.follow(reader.run());
        let playable = matches!(reader.status(), RunStatus::InFlight | RunStatus::Complete);
        if advance && playable && cursor.index + 1 < reader.len() {
            cursor.index += 1;
            trace!(run = %cursor.run, cursor = cursor.index, "playback advanced");
        }
        let frame = compose(&cursor, &reader);
        drop(reader);
        metrics::set_cursor(frame.cursor);
        self.frames.send_if_modified(|published| {
            if *published == frame {
                false
            } else {
                *published = frame.clone();
                true
            }
        });
        frame
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        self.ticker.get_mut().take();
    }
}

fn compose(cursor: &Cursor, reader: &RunReader<'_>) -> PlaybackFrame {
    let total = reader.len();
    let last = total.checked_sub(1);
    let index = last.map(|last| cursor.index.min(last)).unwrap_or(0);
    let status = reader.status().clone();
    let phase = match &status {
        RunStatus::Idle | RunStatus::Failed(_) => PlaybackPhase::Idle,
        RunStatus::Complete if last.map_or(true, |last| index == last) => PlaybackPhase::Settled,
        RunStatus::Complete | RunStatus::InFlight => PlaybackPhase::Playing,
    };
    PlaybackFrame {
        run: reader.run(),
        cursor: index,
        total,
        phase,
        solution: reader.get(index).cloned(),
        execution_time: reader.execution_time(),
        status,
    }
}
