use lazy_static::lazy_static;
use prometheus::{core::Collector, IntCounter, Registry};
use tracing::error;

lazy_static! {
    static ref FRAMES_DECODED: IntCounter =
        IntCounter::new("tsp_frames_decoded_total", "Frames decoded into payloads").unwrap();
    static ref FRAMES_REJECTED: IntCounter = IntCounter::new(
        "tsp_frames_rejected_total",
        "Frames dropped as malformed or oversized",
    )
    .unwrap();
    static ref STREAMS_TRUNCATED: IntCounter = IntCounter::new(
        "tsp_streams_truncated_total",
        "Streams that ended inside a frame",
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register frame metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, FRAMES_DECODED.clone());
    register(registry, FRAMES_REJECTED.clone());
    register(registry, STREAMS_TRUNCATED.clone());
}

pub(crate) fn record_decoded() {
    FRAMES_DECODED.inc();
}

pub(crate) fn record_rejected() {
    FRAMES_REJECTED.inc();
}

pub(crate) fn record_truncated() {
    STREAMS_TRUNCATED.inc();
}
