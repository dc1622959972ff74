//! Long-running loops around the sampler and the alert sweep.
//!
//! The sampling loop awaits each tick before taking the next one and skips
//! missed ticks, so two ticks never run at the same time. The sweep loop is a
//! separate task and can overlap with a tick; the alert store's conditional
//! flip keeps that safe.

use std::sync::Arc;
use std::time::Duration;

use common::logger::{TraceId, run_span};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, error, info};

use crate::evaluator::TargetAlertEvaluator;
use crate::metrics::counters::Counters;
use crate::scheduler::sampler::Sampler;
use crate::time::now;

pub async fn run_sampling_loop(sampler: Arc<Sampler>, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(every_secs = every.as_secs(), "sampling loop started");

    loop {
        ticker.tick().await;

        let trace_id = TraceId::new();
        sampler
            .on_tick(now())
            .instrument(run_span("sample", &trace_id))
            .await;
    }
}

pub async fn run_sweep_loop(targets: Arc<TargetAlertEvaluator>, every: Duration, counters: Counters) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(every_secs = every.as_secs(), "alert sweep loop started");

    loop {
        ticker.tick().await;

        Counters::incr(&counters.sweeps);
        let trace_id = TraceId::new();
        let res = targets
            .sweep(now())
            .instrument(run_span("sweep", &trace_id))
            .await;

        if let Err(e) = res {
            // Store unavailable: this sweep is lost, the next one runs as usual.
            Counters::incr(&counters.store_failures);
            error!(error = %e, %trace_id, "alert sweep aborted");
        }
    }
}
