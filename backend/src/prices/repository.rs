use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::prices::model::{NewPricePoint, PricePoint};

/// Append-only ordered record of price samples.
///
/// Every "latest" query orders by `(recorded_at, seq)` descending, so two
/// points with the same timestamp resolve to the one inserted last.
#[async_trait]
pub trait PriceRepository: Send + Sync {
    async fn insert(&self, point: NewPricePoint) -> Result<PricePoint>;

    async fn latest(&self, asset: &str) -> Result<Option<PricePoint>>;

    /// Most recent point with `recorded_at <= at`.
    async fn latest_at_or_before(
        &self,
        asset: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<PricePoint>>;

    /// Points with `after < recorded_at <= until`, newest first.
    async fn range_desc(
        &self,
        asset: &str,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<PricePoint>>;
}
