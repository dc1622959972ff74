//! Per-subscriber target price alerts.
//!
//! Two entry points share one rule (`observed >= target`):
//! - [`TargetAlertEvaluator::on_price`] runs right after a sample is stored,
//!   against the untriggered alerts of that asset;
//! - [`TargetAlertEvaluator::sweep`] runs on its own cadence over every
//!   untriggered alert, using the latest stored price of each asset.
//!
//! Both paths may evaluate the same alert at the same time. The store's
//! conditional flip decides who wins and only the winner notifies.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::logger::{alert_span, warn_if_slow};
use rust_decimal::Decimal;
use tracing::{Instrument, debug, error, info, instrument, warn};

use crate::alerts::{Alert, AlertRepository};
use crate::error::AppError;
use crate::metrics::counters::Counters;
use crate::notify::{Notification, Notifier, TargetReached};
use crate::prices::PriceRepository;

/// Outcome counts of one evaluation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    pub checked: usize,
    /// Alerts this pass flipped to triggered.
    pub triggered: usize,
    /// Alerts whose flip was taken by another path first.
    pub claim_lost: usize,
    pub notify_failed: usize,
    pub skipped_no_price: usize,
    pub errors: usize,
}

pub struct TargetAlertEvaluator {
    alerts: Arc<dyn AlertRepository>,
    prices: Arc<dyn PriceRepository>,
    notifier: Arc<dyn Notifier>,
    counters: Counters,
}

impl TargetAlertEvaluator {
    pub fn new(
        alerts: Arc<dyn AlertRepository>,
        prices: Arc<dyn PriceRepository>,
        notifier: Arc<dyn Notifier>,
        counters: Counters,
    ) -> Self {
        Self {
            alerts,
            prices,
            notifier,
            counters,
        }
    }

    /// Reactive path: checks the untriggered alerts of `asset` against a
    /// freshly observed price.
    #[instrument(skip(self, now), target = "evaluator", fields(asset = %asset, observed = %observed))]
    pub async fn on_price(
        &self,
        asset: &str,
        observed: Decimal,
        now: DateTime<Utc>,
    ) -> Result<PassReport, AppError> {
        let candidates = warn_if_slow("db_untriggered_for_asset", Duration::from_millis(100), async {
            self.alerts.untriggered_for_asset(asset).await
        })
        .await
        .map_err(AppError::Store)?;

        let mut report = PassReport::default();
        for alert in &candidates {
            self.evaluate_one(alert, observed, now, &mut report)
                .instrument(alert_span(&alert.id.to_string()))
                .await;
        }

        debug!(?report, "reactive alert pass finished");
        Ok(report)
    }

    /// Sweep path: every untriggered alert against the latest stored price
    /// of its asset. Alerts whose asset has no stored price are skipped.
    #[instrument(skip(self, now), target = "evaluator")]
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<PassReport, AppError> {
        let candidates = warn_if_slow("db_untriggered", Duration::from_millis(200), async {
            self.alerts.untriggered().await
        })
        .await
        .map_err(AppError::Store)?;

        let mut report = PassReport::default();
        // One latest-price lookup per asset per sweep.
        let mut latest: HashMap<String, Option<Decimal>> = HashMap::new();

        for alert in &candidates {
            let observed = match latest.get(&alert.asset) {
                Some(p) => *p,
                None => match self.prices.latest(&alert.asset).await {
                    Ok(p) => {
                        let p = p.map(|point| point.price);
                        latest.insert(alert.asset.clone(), p);
                        p
                    }
                    Err(e) => {
                        Counters::incr(&self.counters.store_failures);
                        error!(
                            alert_id = %alert.id,
                            asset = %alert.asset,
                            error = %AppError::Store(e),
                            "latest price lookup failed"
                        );
                        report.errors += 1;
                        continue;
                    }
                },
            };

            let Some(observed) = observed else {
                warn!(alert_id = %alert.id, asset = %alert.asset, "no price data for asset; skipping alert");
                report.skipped_no_price += 1;
                continue;
            };

            self.evaluate_one(alert, observed, now, &mut report)
                .instrument(alert_span(&alert.id.to_string()))
                .await;
        }

        info!(
            checked = report.checked,
            triggered = report.triggered,
            skipped_no_price = report.skipped_no_price,
            errors = report.errors,
            "alert sweep finished"
        );
        Ok(report)
    }

    /// Claim, then notify. Failures stay inside this alert.
    async fn evaluate_one(
        &self,
        alert: &Alert,
        observed: Decimal,
        now: DateTime<Utc>,
        report: &mut PassReport,
    ) {
        report.checked += 1;

        if !alert.is_reached_by(observed) {
            return;
        }

        let claimed = match self.alerts.try_mark_triggered(&alert.id, now).await {
            Ok(claimed) => claimed,
            Err(e) => {
                Counters::incr(&self.counters.store_failures);
                error!(error = %AppError::Store(e), "failed to mark alert triggered");
                report.errors += 1;
                return;
            }
        };

        if !claimed {
            Counters::incr(&self.counters.alerts_claim_lost);
            debug!("alert already triggered by a concurrent evaluation");
            report.claim_lost += 1;
            return;
        }

        Counters::incr(&self.counters.alerts_triggered);
        report.triggered += 1;
        info!(
            asset = %alert.asset,
            target = %alert.target_price,
            observed = %observed,
            "alert triggered"
        );

        let notification = Notification::TargetReached(TargetReached {
            alert_id: alert.id,
            asset: alert.asset.clone(),
            target_price: alert.target_price,
            current_price: observed,
        });

        if let Err(e) = self.notifier.send(&notification, &alert.subscriber).await {
            // The flip is not rolled back: at most one notification per alert.
            Counters::incr(&self.counters.notify_failures);
            error!(
                subscriber = %alert.subscriber,
                error = %AppError::NotificationDelivery(e),
                "target alert notification failed"
            );
            report.notify_failed += 1;
        }
    }
}
