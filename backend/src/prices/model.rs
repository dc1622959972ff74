use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// One stored price observation. Immutable once written.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricePoint {
    pub asset: String,
    pub price: Decimal,
    pub percent_change: Option<Decimal>,
    pub recorded_at: DateTime<Utc>,
    /// Insertion order across the table. Breaks timestamp ties: the higher
    /// `seq` is the more recent write.
    pub seq: i64,
}

/// A sample about to be appended by the scheduler.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPricePoint {
    pub asset: String,
    pub price: Decimal,
    pub percent_change: Option<Decimal>,
    pub recorded_at: DateTime<Utc>,
}
