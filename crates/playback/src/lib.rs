//! Solution accumulation and timed playback.
//!
//! [`SolutionAccumulator`] is the append-only log filled by ingestion;
//! [`PlaybackScheduler`] walks a cursor over it on a fixed cadence and
//! publishes what should be displayed.

pub mod accumulator;
pub mod config;
pub mod error;
pub mod metrics;
pub mod scheduler;

pub use accumulator::{RunReader, RunStatus, RunToken, RunView, Snapshot, SolutionAccumulator};
pub use config::PlaybackConfig;
pub use error::PlaybackError;
pub use metrics::register_metrics;
pub use scheduler::{PlaybackFrame, PlaybackPhase, PlaybackScheduler};
