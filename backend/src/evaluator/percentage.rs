//! Global percentage-move rule.
//!
//! Compares a fresh sample with the newest stored point that is at least
//! `lookback` old and notifies the operator when the increase is strictly
//! above the threshold.
//!
//! The evaluator keeps no state between ticks: while the condition holds it
//! fires on every tick. There is no cooldown record.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::logger::warn_if_slow;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, error, info, instrument, warn};

use crate::error::AppError;
use crate::metrics::counters::Counters;
use crate::notify::{Notification, Notifier, PercentageMove};
use crate::prices::PriceRepository;

#[derive(Clone, Debug)]
pub struct MoveRule {
    pub threshold_pct: Decimal,
    pub lookback: chrono::Duration,
    pub operator_contact: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MoveOutcome {
    /// Nothing stored old enough to compare with.
    NoHistory,
    BelowThreshold { percent: Decimal },
    Fired { percent: Decimal, delivered: bool },
}

/// `(current - old) / old * 100`, or `None` when `old` is not positive.
pub fn percent_change(old: Decimal, current: Decimal) -> Option<Decimal> {
    if old <= Decimal::ZERO {
        return None;
    }
    (current - old)
        .checked_div(old)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

pub struct PercentageMoveEvaluator {
    prices: Arc<dyn PriceRepository>,
    notifier: Arc<dyn Notifier>,
    rule: MoveRule,
    counters: Counters,
}

impl PercentageMoveEvaluator {
    pub fn new(
        prices: Arc<dyn PriceRepository>,
        notifier: Arc<dyn Notifier>,
        rule: MoveRule,
        counters: Counters,
    ) -> Self {
        Self {
            prices,
            notifier,
            rule,
            counters,
        }
    }

    #[instrument(skip(self, now), target = "evaluator", fields(asset = %asset, current = %current))]
    pub async fn evaluate(
        &self,
        asset: &str,
        current: Decimal,
        now: DateTime<Utc>,
    ) -> Result<MoveOutcome, AppError> {
        let cutoff = now - self.rule.lookback;

        let old = warn_if_slow("db_latest_at_or_before", Duration::from_millis(100), async {
            self.prices.latest_at_or_before(asset, cutoff).await
        })
        .await
        .map_err(AppError::Store)?;

        let Some(old) = old else {
            debug!(%cutoff, "no price old enough for comparison");
            return Ok(MoveOutcome::NoHistory);
        };

        let Some(percent) = percent_change(old.price, current) else {
            warn!(old_price = %old.price, "stored comparison price is not positive; skipping");
            return Ok(MoveOutcome::NoHistory);
        };

        if percent <= self.rule.threshold_pct {
            debug!(old_price = %old.price, %percent, "move below threshold");
            return Ok(MoveOutcome::BelowThreshold { percent });
        }

        let rounded = percent.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        info!(
            old_price = %old.price,
            old_at = %old.recorded_at,
            percent = %rounded,
            "price increased above threshold"
        );
        Counters::incr(&self.counters.moves_fired);

        let notification = Notification::PercentageMove(PercentageMove {
            asset: asset.to_string(),
            old_price: old.price,
            new_price: current,
            percent: rounded,
        });

        let delivered = match self
            .notifier
            .send(&notification, &self.rule.operator_contact)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                Counters::incr(&self.counters.notify_failures);
                error!(error = %AppError::NotificationDelivery(e), "percentage move notification failed");
                false
            }
        };

        Ok(MoveOutcome::Fired {
            percent: rounded,
            delivered,
        })
    }
}
