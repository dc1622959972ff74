//! Sampling tick.
//!
//! Responsibilities:
//! - Pull one quote per tracked asset, bounded by a per-request timeout.
//! - Append the sample to the price store.
//! - Hand the new price to the percentage-move and target-alert evaluators.
//!
//! Each asset runs its own pipeline. A failed fetch, a timeout or a store
//! error for one asset leaves the other untouched, and an asset whose fetch
//! failed gets no write and no evaluation this tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::logger::{asset_span, warn_if_slow};
use futures::future::join_all;
use tracing::{Instrument, Span, debug, error, field, info, warn};

use crate::error::AppError;
use crate::evaluator::{PercentageMoveEvaluator, TargetAlertEvaluator};
use crate::market::{QuoteSource, TrackedAsset};
use crate::metrics::counters::Counters;
use crate::prices::{NewPricePoint, PricePoint, PriceRepository};

/// What happened to each asset during one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    pub written: Vec<PricePoint>,
    pub failed: Vec<(String, AppError)>,
}

pub struct Sampler {
    assets: Vec<TrackedAsset>,
    quotes: Arc<dyn QuoteSource>,
    prices: Arc<dyn PriceRepository>,
    moves: PercentageMoveEvaluator,
    targets: Arc<TargetAlertEvaluator>,
    quote_timeout: Duration,
    counters: Counters,
}

impl Sampler {
    pub fn new(
        assets: Vec<TrackedAsset>,
        quotes: Arc<dyn QuoteSource>,
        prices: Arc<dyn PriceRepository>,
        moves: PercentageMoveEvaluator,
        targets: Arc<TargetAlertEvaluator>,
        quote_timeout: Duration,
        counters: Counters,
    ) -> Self {
        Self {
            assets,
            quotes,
            prices,
            moves,
            targets,
            quote_timeout,
            counters,
        }
    }

    /// Runs one tick for every tracked asset. Assets are processed
    /// concurrently; the call returns once all pipelines have finished.
    pub async fn on_tick(&self, now: DateTime<Utc>) -> TickReport {
        Counters::incr(&self.counters.ticks);
        Span::current().record("assets", self.assets.len());
        debug!(assets = self.assets.len(), "starting sampling tick");

        let results = join_all(self.assets.iter().map(|asset| {
            self.sample_asset(asset, now)
                .instrument(asset_span(&asset.id))
        }))
        .await;

        let mut report = TickReport::default();
        for (asset, res) in self.assets.iter().zip(results) {
            match res {
                Ok(point) => report.written.push(point),
                Err(e) => report.failed.push((asset.id.clone(), e)),
            }
        }

        info!(
            written = report.written.len(),
            failed = report.failed.len(),
            "sampling tick finished"
        );
        report
    }

    async fn sample_asset(
        &self,
        asset: &TrackedAsset,
        now: DateTime<Utc>,
    ) -> Result<PricePoint, AppError> {
        let quote = match tokio::time::timeout(self.quote_timeout, self.quotes.fetch_price(asset)).await
        {
            Ok(Ok(q)) => q,
            Ok(Err(source)) => {
                Counters::incr(&self.counters.fetch_failures);
                let e = AppError::TransientFetch {
                    asset: asset.id.clone(),
                    source,
                };
                warn!(error = %e, "quote fetch failed; skipping asset this tick");
                return Err(e);
            }
            Err(_) => {
                Counters::incr(&self.counters.fetch_timeouts);
                let e = AppError::FetchTimeout {
                    asset: asset.id.clone(),
                    timeout_ms: saturating_millis(self.quote_timeout),
                };
                warn!(error = %e, "quote fetch timed out; skipping asset this tick");
                return Err(e);
            }
        };

        Span::current().record("price", field::display(quote.price));

        let point = warn_if_slow("db_insert_price", Duration::from_millis(100), async {
            self.prices
                .insert(NewPricePoint {
                    asset: asset.id.clone(),
                    price: quote.price,
                    percent_change: quote.percent_change,
                    recorded_at: now,
                })
                .await
        })
        .await
        .map_err(|e| {
            Counters::incr(&self.counters.store_failures);
            let e = AppError::Store(e);
            error!(error = %e, "failed to store price point");
            e
        })?;

        Counters::incr(&self.counters.points_written);
        info!(
            price = %point.price,
            percent_change = ?point.percent_change,
            "price point stored"
        );

        // The two rules are independent; a failure in one does not skip the other.
        if let Err(e) = self.moves.evaluate(&asset.id, point.price, now).await {
            Counters::incr(&self.counters.store_failures);
            error!(error = %e, "percentage move evaluation failed");
        }

        if let Err(e) = self.targets.on_price(&asset.id, point.price, now).await {
            Counters::incr(&self.counters.store_failures);
            error!(error = %e, "target alert evaluation failed");
        }

        Ok(point)
    }
}

/// Whole milliseconds of `d`, capped at `u64::MAX`.
fn saturating_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
