//! Submits solver runs and feeds their responses into the accumulator.
//!
//! Each submission resets the accumulator, restarts the playback timer and
//! spawns one ingest task. Starting a new run cancels the previous task, and
//! its accumulator token goes stale, so late frames from it are dropped.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{broadcast, oneshot};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tsp_core_types::{Payload, RunId, SolverMode};
use tsp_frame_stream::{DecodeError, FrameDecoder};
use tsp_playback::{
    PlaybackConfig, PlaybackError, PlaybackScheduler, RunToken, SolutionAccumulator,
};

use crate::brute::BruteForceResponse;
use crate::error::{ConfigurationError, RunError, TransportError};
use crate::metrics;
use crate::request::SolverRequest;
use crate::transport::{ByteStream, SolverTransport};

const EVENT_BUFFER: usize = 256;

#[derive(Clone, Debug, PartialEq)]
pub enum RunEvent {
    Started { run: RunId, mode: SolverMode },
    FrameRejected { run: RunId, error: String },
    Truncated { run: RunId, bytes: usize },
    Failed { run: RunId, error: String },
    Completed { run: RunId, solutions: usize, execution_time: Option<f64> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "lowercase")]
pub enum RunOutcome {
    Completed,
    Failed(String),
    Superseded,
}

/// Final account of one run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunReport {
    pub run: RunId,
    pub mode: SolverMode,
    pub appended: usize,
    pub rejected: usize,
    pub truncated: bool,
    pub execution_time: Option<f64>,
    /// Serialised inline as `outcome` plus `reason` for failures.
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

impl RunReport {
    fn new(run: RunId, mode: SolverMode) -> Self {
        Self {
            run,
            mode,
            appended: 0,
            rejected: 0,
            truncated: false,
            execution_time: None,
            outcome: RunOutcome::Completed,
        }
    }
}

pub struct RunHandle {
    run: RunId,
    mode: SolverMode,
    report: oneshot::Receiver<RunReport>,
}

impl RunHandle {
    pub fn run(&self) -> RunId {
        self.run
    }

    /// Waits for the ingest task to finish.
    pub async fn wait(self) -> RunReport {
        match self.report.await {
            Ok(report) => report,
            Err(_) => {
                let mut report = RunReport::new(self.run, self.mode);
                report.outcome = RunOutcome::Failed("ingest task ended unexpectedly".into());
                report
            }
        }
    }
}

struct ActiveRun {
    run: RunId,
    cancel: CancellationToken,
}

pub struct RunOrchestrator {
    transport: Arc<dyn SolverTransport>,
    accumulator: Arc<SolutionAccumulator>,
    scheduler: Arc<PlaybackScheduler>,
    playback: PlaybackConfig,
    stall_timeout: Duration,
    events: broadcast::Sender<RunEvent>,
    active: Mutex<Option<ActiveRun>>,
}

impl RunOrchestrator {
    pub fn new(
        transport: Arc<dyn SolverTransport>,
        playback: PlaybackConfig,
        stall_timeout: Duration,
    ) -> Self {
        let accumulator = Arc::new(SolutionAccumulator::new());
        let scheduler = Arc::new(PlaybackScheduler::new(Arc::clone(&accumulator)));
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            transport,
            accumulator,
            scheduler,
            playback,
            stall_timeout,
            events,
            active: Mutex::new(None),
        }
    }

    pub fn accumulator(&self) -> &Arc<SolutionAccumulator> {
        &self.accumulator
    }

    pub fn scheduler(&self) -> &Arc<PlaybackScheduler> {
        &self.scheduler
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    /// Starts a run. Invalid parameters are rejected before any state changes.
    pub fn submit(&self, request: SolverRequest) -> Result<RunHandle, ConfigurationError> {
        request.validate()?;

        let mut active = self.active.lock();
        if let Some(previous) = active.take() {
            debug!(run = %previous.run, "superseding in-flight run");
            previous.cancel.cancel();
        }
        self.scheduler.stop();
        let token = self.accumulator.reset();
        self.scheduler.start(self.playback.cadence(request.mode));

        let run = token.run();
        let mode = request.mode;
        let cancel = CancellationToken::new();
        *active = Some(ActiveRun {
            run,
            cancel: cancel.clone(),
        });
        drop(active);

        info!(run = %run, mode = %mode, locations = request.distances.len(), "run submitted");
        let _ = self.events.send(RunEvent::Started { run, mode });

        let ingest = Ingest {
            transport: Arc::clone(&self.transport),
            accumulator: Arc::clone(&self.accumulator),
            events: self.events.clone(),
            stall_timeout: self.stall_timeout,
            token,
            report: RunReport::new(run, mode),
        };
        let (report_tx, report_rx) = oneshot::channel();
        tokio::spawn(async move {
            let report = ingest.run(request, cancel).await;
            let _ = report_tx.send(report);
        });

        Ok(RunHandle {
            run,
            mode,
            report: report_rx,
        })
    }

    /// Cancels the in-flight run, if any, and stops playback.
    pub fn shutdown(&self) {
        if let Some(active) = self.active.lock().take() {
            active.cancel.cancel();
        }
        self.scheduler.stop();
    }
}

struct Ingest {
    transport: Arc<dyn SolverTransport>,
    accumulator: Arc<SolutionAccumulator>,
    events: broadcast::Sender<RunEvent>,
    stall_timeout: Duration,
    token: RunToken,
    report: RunReport,
}

impl Ingest {
    async fn run(mut self, request: SolverRequest, cancel: CancellationToken) -> RunReport {
        let run = self.token.run();
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(RunError::Superseded),
            result = self.drive(&request) => result,
        };

        match result {
            Ok(()) => match self.accumulator.complete(self.token) {
                Ok(()) => {
                    metrics::record_run("completed");
                    info!(
                        run = %run,
                        solutions = self.report.appended,
                        rejected = self.report.rejected,
                        execution_time_ms = ?self.report.execution_time,
                        "run complete"
                    );
                    let _ = self.events.send(RunEvent::Completed {
                        run,
                        solutions: self.report.appended,
                        execution_time: self.report.execution_time,
                    });
                }
                Err(PlaybackError::StaleRun { .. }) => self.superseded(),
            },
            Err(RunError::Superseded) => self.superseded(),
            Err(RunError::Transport(err)) => {
                let reason = err.to_string();
                match self.accumulator.fail(self.token, reason.clone()) {
                    Ok(()) => {
                        metrics::record_run("failed");
                        warn!(run = %run, error = %reason, "run failed");
                        let _ = self.events.send(RunEvent::Failed {
                            run,
                            error: reason.clone(),
                        });
                        self.report.outcome = RunOutcome::Failed(reason);
                    }
                    Err(PlaybackError::StaleRun { .. }) => self.superseded(),
                }
            }
        }
        self.report
    }

    fn superseded(&mut self) {
        metrics::record_run("superseded");
        debug!(run = %self.token.run(), "run superseded, ingest stopped");
        self.report.outcome = RunOutcome::Superseded;
    }

    async fn drive(&mut self, request: &SolverRequest) -> Result<(), RunError> {
        let mut body = self.transport.open(request).await?;
        if request.mode.is_streaming() {
            self.stream_frames(&mut body).await
        } else {
            self.single_shot(&mut body, request.search_space()).await
        }
    }

    async fn next_chunk(&self, body: &mut ByteStream) -> Result<Option<Bytes>, TransportError> {
        match timeout(self.stall_timeout, body.next()).await {
            Err(_) => Err(TransportError::Stalled(self.stall_timeout)),
            Ok(None) => Ok(None),
            Ok(Some(chunk)) => chunk.map(Some),
        }
    }

    async fn stream_frames(&mut self, body: &mut ByteStream) -> Result<(), RunError> {
        let mut decoder = FrameDecoder::new();
        while let Some(chunk) = self.next_chunk(body).await? {
            for frame in decoder.feed(&chunk) {
                match frame {
                    Ok(payload) => self.apply(payload)?,
                    Err(err) => {
                        self.report.rejected += 1;
                        let _ = self.events.send(RunEvent::FrameRejected {
                            run: self.token.run(),
                            error: err.to_string(),
                        });
                    }
                }
            }
        }
        match decoder.finish() {
            Ok(()) => {}
            Err(DecodeError::Truncated { bytes, .. }) => {
                self.report.truncated = true;
                warn!(run = %self.token.run(), bytes, "stream ended inside a frame");
                let _ = self.events.send(RunEvent::Truncated {
                    run: self.token.run(),
                    bytes,
                });
            }
            Err(DecodeError::Io(err)) => return Err(TransportError::Io(err).into()),
        }
        Ok(())
    }

    async fn single_shot(&mut self, body: &mut ByteStream, search_space: u64) -> Result<(), RunError> {
        let mut buffer = Vec::new();
        while let Some(chunk) = self.next_chunk(body).await? {
            buffer.extend_from_slice(&chunk);
        }
        let (solution, total_time) = BruteForceResponse::parse(&buffer)?.into_solution(search_space);
        self.apply(Payload::Solution(solution))?;
        self.apply(Payload::Summary(tsp_core_types::RunSummary { total_time }))
    }

    fn apply(&mut self, payload: Payload) -> Result<(), RunError> {
        let result = match payload {
            Payload::Solution(solution) => self
                .accumulator
                .append(self.token, solution)
                .map(|_| self.report.appended += 1),
            Payload::Summary(summary) => self
                .accumulator
                .set_execution_time(self.token, summary.total_time)
                .map(|()| self.report.execution_time = Some(summary.total_time)),
        };
        result.map_err(|PlaybackError::StaleRun { .. }| RunError::Superseded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::stream;
    use tokio::sync::mpsc;
    use tsp_core_types::DistanceMatrix;
    use tsp_playback::RunStatus;

    use crate::params::GeneticParams;

    #[test]
    fn report_outcome_serialises_inline() {
        let report = RunReport::new(RunId(1), SolverMode::Genetic);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "completed");
        assert!(json.get("reason").is_none());

        let mut failed = report;
        failed.outcome = RunOutcome::Failed("solver answered 500".into());
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["reason"], "solver answered 500");
    }

    /// Hands out pre-scripted bodies, one per `open` call.
    struct ScriptedTransport {
        bodies: Mutex<Vec<Result<ByteStream, TransportError>>>,
    }

    impl ScriptedTransport {
        fn new(bodies: Vec<Result<ByteStream, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                bodies: Mutex::new(bodies.into_iter().rev().collect()),
            })
        }
    }

    #[async_trait]
    impl SolverTransport for ScriptedTransport {
        async fn open(&self, _request: &SolverRequest) -> Result<ByteStream, TransportError> {
            self.bodies
                .lock()
                .pop()
                .unwrap_or_else(|| Err(TransportError::InvalidResponse("no script".into())))
        }
    }

    fn chunks(parts: &[&'static str]) -> ByteStream {
        stream::iter(
            parts
                .iter()
                .map(|part| Ok(Bytes::from_static(part.as_bytes())))
                .collect::<Vec<_>>(),
        )
        .boxed()
    }

    /// Body fed through a channel so tests control when chunks arrive.
    fn channel_body() -> (mpsc::UnboundedSender<Result<Bytes, TransportError>>, ByteStream) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let body = stream::poll_fn(move |cx| rx.poll_recv(cx)).boxed();
        (tx, body)
    }

    fn three_cities() -> Arc<DistanceMatrix> {
        let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let cells = vec![
            vec![0.0, 10.0, 20.0],
            vec![11.0, 0.0, 30.0],
            vec![21.0, 31.0, 0.0],
        ];
        Arc::new(DistanceMatrix::new(names, cells).unwrap())
    }

    fn orchestrator(transport: Arc<dyn SolverTransport>) -> RunOrchestrator {
        RunOrchestrator::new(transport, PlaybackConfig::default(), Duration::from_secs(5))
    }

    const SCENARIO_A: &str = concat!(
        "data: {\"generation\":0,\"route\":[0,1,2],\"distance\":100,\"fitness\":0}\n\n",
        "data: {\"generation\":1,\"route\":[0,2,1],\"distance\":90,\"fitness\":0}\n\n",
        "data: {\"total_time\":50}\n\n",
    );

    #[tokio::test]
    async fn streaming_run_accumulates_frames() {
        let transport = ScriptedTransport::new(vec![Ok(chunks(&[
            &SCENARIO_A[..37],
            &SCENARIO_A[37..121],
            &SCENARIO_A[121..],
        ]))]);
        let orchestrator = orchestrator(transport);
        let handle = orchestrator
            .submit(SolverRequest::best_first(three_cities()))
            .unwrap();
        let report = handle.wait().await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.appended, 2);
        assert_eq!(report.execution_time, Some(50.0));
        let snapshot = orchestrator.accumulator().snapshot();
        let generations: Vec<u64> = snapshot.solutions.iter().map(|s| s.generation).collect();
        assert_eq!(generations, vec![0, 1]);
        assert_eq!(snapshot.execution_time, Some(50.0));
        assert_eq!(snapshot.status, RunStatus::Complete);
    }

    #[tokio::test]
    async fn brute_force_synthesizes_one_solution() {
        let transport = ScriptedTransport::new(vec![Ok(chunks(&[
            "{\"final_best_route\":[0,1,2],",
            "\"final_best_distance\":300,\"total_time\":20}",
        ]))]);
        let orchestrator = orchestrator(transport);
        let report = orchestrator
            .submit(SolverRequest::brute_force(three_cities()))
            .unwrap()
            .wait()
            .await;

        assert_eq!(report.appended, 1);
        let snapshot = orchestrator.accumulator().snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.solutions[0].generation, 6);
        assert_eq!(snapshot.solutions[0].distance, 300.0);
        assert_eq!(snapshot.execution_time, Some(20.0));
    }

    #[tokio::test]
    async fn malformed_frames_are_reported_not_fatal() {
        let transport = ScriptedTransport::new(vec![Ok(chunks(&[
            "data: {not valid json\n\n",
            "data: {\"generation\":4,\"route\":[2,1,0],\"distance\":61,\"fitness\":0}\n\n",
        ]))]);
        let orchestrator = orchestrator(transport);
        let mut events = orchestrator.subscribe();
        let report = orchestrator
            .submit(SolverRequest::best_first(three_cities()))
            .unwrap()
            .wait()
            .await;

        assert_eq!(report.appended, 1);
        assert_eq!(report.rejected, 1);
        assert!(matches!(events.recv().await.unwrap(), RunEvent::Started { .. }));
        assert!(matches!(
            events.recv().await.unwrap(),
            RunEvent::FrameRejected { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            RunEvent::Completed { solutions: 1, .. }
        ));
    }

    #[tokio::test]
    async fn truncated_stream_still_completes() {
        let transport = ScriptedTransport::new(vec![Ok(chunks(&[
            "data: {\"generation\":0,\"route\":[0,1,2],\"distance\":100,\"fitness\":0}\n\n",
            "data: {\"generation\":1,\"rou",
        ]))]);
        let orchestrator = orchestrator(transport);
        let report = orchestrator
            .submit(SolverRequest::best_first(three_cities()))
            .unwrap()
            .wait()
            .await;

        assert!(report.truncated);
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(orchestrator.accumulator().view().len, 1);
    }

    #[tokio::test]
    async fn transport_failure_keeps_partial_results() {
        let transport = ScriptedTransport::new(vec![Ok(stream::iter(vec![
            Ok(Bytes::from_static(
                b"data: {\"generation\":0,\"route\":[0,1,2],\"distance\":100,\"fitness\":0}\n\n",
            )),
            Err(TransportError::InvalidResponse("connection reset".into())),
        ])
        .boxed())]);
        let orchestrator = orchestrator(transport);
        let report = orchestrator
            .submit(SolverRequest::best_first(three_cities()))
            .unwrap()
            .wait()
            .await;

        assert!(matches!(report.outcome, RunOutcome::Failed(_)));
        let snapshot = orchestrator.accumulator().snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(matches!(snapshot.status, RunStatus::Failed(_)));
    }

    #[tokio::test]
    async fn rejected_request_is_a_failed_run() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Status {
            status: 400,
            body: "Distance matrix contains invalid values.".into(),
        })]);
        let orchestrator = orchestrator(transport);
        let report = orchestrator
            .submit(SolverRequest::best_first(three_cities()))
            .unwrap()
            .wait()
            .await;
        match report.outcome {
            RunOutcome::Failed(reason) => assert!(reason.contains("400")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_parameters_never_touch_state() {
        let transport = ScriptedTransport::new(vec![Ok(chunks(&[SCENARIO_A]))]);
        let orchestrator = orchestrator(transport);
        let first = orchestrator
            .submit(SolverRequest::best_first(three_cities()))
            .unwrap();
        first.wait().await;
        let before = orchestrator.accumulator().snapshot();

        let params = GeneticParams {
            mutation_rate: 3.0,
            ..GeneticParams::default()
        };
        let err = orchestrator
            .submit(SolverRequest::genetic(params, three_cities()))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigurationError::OutOfRange { field: "mutation_rate", .. }));
        assert_eq!(orchestrator.accumulator().snapshot(), before);
    }

    #[tokio::test]
    async fn stalled_body_times_out() {
        let (_tx, body) = channel_body();
        let transport = ScriptedTransport::new(vec![Ok(body)]);
        let orchestrator =
            RunOrchestrator::new(transport, PlaybackConfig::default(), Duration::from_millis(20));
        let report = orchestrator
            .submit(SolverRequest::best_first(three_cities()))
            .unwrap()
            .wait()
            .await;
        match report.outcome {
            RunOutcome::Failed(reason) => assert!(reason.contains("no data"), "{reason}"),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn new_submission_supersedes_the_in_flight_run() {
        let (old_tx, old_body) = channel_body();
        let transport = ScriptedTransport::new(vec![
            Ok(old_body),
            Ok(chunks(&[
                "data: {\"generation\":9,\"route\":[1,0,2],\"distance\":42,\"fitness\":0}\n\n",
            ])),
        ]);
        let orchestrator = orchestrator(transport);

        let first = orchestrator
            .submit(SolverRequest::best_first(three_cities()))
            .unwrap();
        old_tx
            .send(Ok(Bytes::from_static(
                b"data: {\"generation\":0,\"route\":[0,1,2],\"distance\":100,\"fitness\":0}\n\n",
            )))
            .unwrap();
        tokio::task::yield_now().await;

        let second = orchestrator
            .submit(SolverRequest::best_first(three_cities()))
            .unwrap();
        assert!(second.run() > first.run());

        // Late data for the old run must not reach the new log.
        let _ = old_tx.send(Ok(Bytes::from_static(
            b"data: {\"generation\":1,\"route\":[0,2,1],\"distance\":90,\"fitness\":0}\n\n",
        )));
        drop(old_tx);

        assert_eq!(first.wait().await.outcome, RunOutcome::Superseded);
        let report = second.wait().await;
        assert_eq!(report.outcome, RunOutcome::Completed);

        let snapshot = orchestrator.accumulator().snapshot();
        assert_eq!(snapshot.run, report.run);
        let generations: Vec<u64> = snapshot.solutions.iter().map(|s| s.generation).collect();
        assert_eq!(generations, vec![9]);
    }

    #[tokio::test]
    async fn stale_token_stops_ingest() {
        let orchestrator = orchestrator(ScriptedTransport::new(vec![]));
        let accumulator = Arc::clone(orchestrator.accumulator());
        let stale = accumulator.reset();
        let _current = accumulator.reset();

        let mut ingest = Ingest {
            transport: ScriptedTransport::new(vec![]),
            accumulator,
            events: broadcast::channel(4).0,
            stall_timeout: Duration::from_secs(1),
            token: stale,
            report: RunReport::new(stale.run(), SolverMode::BestFirst),
        };
        let payload = Payload::Summary(tsp_core_types::RunSummary { total_time: 1.0 });
        assert!(matches!(ingest.apply(payload), Err(RunError::Superseded)));
        assert_eq!(ingest.report.execution_time, None);
    }
}
