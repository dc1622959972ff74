//! Hourly view of the price series.
//!
//! One representative sample per clock hour (UTC) over the trailing 24
//! hours, newest hour first. The representative is the latest sample inside
//! the hour. Hours without samples are left out, so the result can be
//! shorter than 24.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::prices::{PricePoint, PriceRepository};

pub const MAX_BUCKETS: usize = 24;

const LABEL_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HourlyPrice {
    /// Start of the clock hour.
    pub hour: DateTime<Utc>,
    /// `hour` as `yyyy-MM-dd HH:mm`.
    pub label: String,
    pub asset: String,
    pub price: Decimal,
    pub percent_change: Option<Decimal>,
    pub recorded_at: DateTime<Utc>,
}

pub fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp();
    let floored = secs - secs.rem_euclid(3_600);
    Utc.timestamp_opt(floored, 0).single().unwrap_or(ts)
}

/// Buckets newest-first points by hour. The first point seen for an hour is
/// its representative; collection stops at [`MAX_BUCKETS`].
pub fn hourly_buckets(points_desc: &[PricePoint]) -> Vec<HourlyPrice> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(MAX_BUCKETS);

    for p in points_desc {
        let hour = floor_to_hour(p.recorded_at);
        if !seen.insert(hour) {
            continue;
        }

        out.push(HourlyPrice {
            hour,
            label: hour.format(LABEL_FORMAT).to_string(),
            asset: p.asset.clone(),
            price: p.price,
            percent_change: p.percent_change,
            recorded_at: p.recorded_at,
        });

        if out.len() >= MAX_BUCKETS {
            break;
        }
    }

    out
}

/// Query surface for the request layer: the hourly series of `asset` over
/// `(now - 24h, now]`.
pub async fn get_hourly_series(
    prices: &dyn PriceRepository,
    asset: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<HourlyPrice>> {
    let since = now - chrono::Duration::hours(MAX_BUCKETS as i64);
    let points = prices.range_desc(asset, since, now).await?;

    let series = hourly_buckets(&points);
    tracing::debug!(asset, points = points.len(), buckets = series.len(), "hourly series built");
    Ok(series)
}
