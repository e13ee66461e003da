use lazy_static::lazy_static;
use prometheus::{core::Collector, IntCounter, IntGauge, Registry};
use tracing::error;

lazy_static! {
    static ref RUNS_STARTED: IntCounter =
        IntCounter::new("tsp_runs_started_total", "Runs started (accumulator resets)").unwrap();
    static ref STALE_WRITES: IntCounter = IntCounter::new(
        "tsp_stale_writes_total",
        "Writes rejected because their run was superseded",
    )
    .unwrap();
    static ref SOLUTIONS_BUFFERED: IntGauge = IntGauge::new(
        "tsp_solutions_buffered",
        "Solutions accumulated for the current run",
    )
    .unwrap();
    static ref PLAYBACK_CURSOR: IntGauge =
        IntGauge::new("tsp_playback_cursor", "Index of the displayed solution").unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register playback metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, RUNS_STARTED.clone());
    register(registry, STALE_WRITES.clone());
    register(registry, SOLUTIONS_BUFFERED.clone());
    register(registry, PLAYBACK_CURSOR.clone());
}

pub(crate) fn record_run_started() {
    RUNS_STARTED.inc();
}

pub(crate) fn record_stale_write() {
    STALE_WRITES.inc();
}

pub(crate) fn set_buffered(count: usize) {
    SOLUTIONS_BUFFERED.set(count as i64);
}

pub(crate) fn set_cursor(index: usize) {
    PLAYBACK_CURSOR.set(index as i64);
}
