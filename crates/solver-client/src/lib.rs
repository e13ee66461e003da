//! Talks to the remote TSP solver and drives the ingestion pipeline.
//!
//! A [`RunOrchestrator`] owns the accumulator and the playback scheduler of
//! one session. Each [`SolverRequest`] is sent through a [`SolverTransport`]
//! (HTTP, or a recorded body on disk) and its frames flow into the
//! accumulator until the run completes, fails or is superseded.

pub mod brute;
pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod params;
pub mod request;
pub mod transport;

pub use brute::BruteForceResponse;
pub use config::SolverConfig;
pub use error::{ConfigurationError, HttpSetupError, RunError, TransportError};
pub use metrics::register_metrics;
pub use orchestrator::{RunEvent, RunHandle, RunOrchestrator, RunOutcome, RunReport};
pub use params::GeneticParams;
pub use request::SolverRequest;
pub use transport::{ByteStream, FileTransport, HttpTransport, SolverTransport};
