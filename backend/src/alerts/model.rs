use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

pub type AlertId = Uuid;

/// A subscriber's "notify me when the price reaches X" rule.
///
/// `triggered` only ever moves from false to true. Once set the alert is
/// out of evaluation for good.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Alert {
    pub id: AlertId,
    pub asset: String,
    pub target_price: Decimal,
    pub triggered: bool,
    pub subscriber: String,
    pub created_at: DateTime<Utc>,
    pub triggered_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Price condition of the rule. Whether the alert is still armed is a
    /// separate question answered by the store.
    pub fn is_reached_by(&self, observed: Decimal) -> bool {
        observed >= self.target_price
    }
}

/// Validated input for a new alert.
#[derive(Clone, Debug)]
pub struct NewAlert {
    pub asset: String,
    pub target_price: Decimal,
    pub subscriber: String,
}
