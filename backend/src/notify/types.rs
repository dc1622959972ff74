use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Global "price moved up more than the threshold" event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentageMove {
    pub asset: String,
    pub old_price: Decimal,
    pub new_price: Decimal,
    /// Already rounded to two decimal places.
    pub percent: Decimal,
}

/// A subscriber's target price was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetReached {
    pub alert_id: Uuid,
    pub asset: String,
    pub target_price: Decimal,
    pub current_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Notification {
    PercentageMove(PercentageMove),
    TargetReached(TargetReached),
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::PercentageMove(_) => "percentage-move",
            Notification::TargetReached(_) => "target-reached",
        }
    }

    pub fn asset(&self) -> &str {
        match self {
            Notification::PercentageMove(m) => &m.asset,
            Notification::TargetReached(t) => &t.asset,
        }
    }
}
