use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{Span, field};

use super::TraceId;

/// Root span for one run of a periodic job (a sampling tick, an alert sweep).
pub fn run_span(job: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "run",
        job = %job,
        trace_id = %trace_id,
        assets = field::Empty,
    )
}

/// Child span covering one asset's pipeline inside a tick.
pub fn asset_span(asset: &str) -> Span {
    tracing::info_span!("asset", asset = %asset, price = field::Empty)
}

/// Child span covering the evaluation of a single alert.
pub fn alert_span(alert_id: &str) -> Span {
    tracing::debug_span!("alert", alert_id = %alert_id)
}

/// Awaits `fut` and emits a `performance` warning when it took longer than `max`.
pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
