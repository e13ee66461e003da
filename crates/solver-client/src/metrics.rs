use lazy_static::lazy_static;
use prometheus::{core::Collector, opts, IntCounterVec, Registry};
use tracing::error;

lazy_static! {
    static ref RUNS_FINISHED: IntCounterVec = IntCounterVec::new(
        opts!("tsp_runs_finished_total", "Solver runs grouped by outcome"),
        &["outcome"]
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register solver metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, RUNS_FINISHED.clone());
}

pub(crate) fn record_run(outcome: &str) {
    RUNS_FINISHED.with_label_values(&[outcome]).inc();
}
