use std::str::FromStr;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{AnyPool, Row};

use crate::prices::model::{NewPricePoint, PricePoint};
use crate::prices::repository::PriceRepository;
use crate::time::{from_ms, to_ms};

const SELECT_COLUMNS: &str = "asset, price, percent_change, recorded_ms, seq";

/// SQLx-backed implementation of PriceRepository.
/// Responsible only for persistence and row mapping.
pub struct SqlxPriceRepository {
    pool: AnyPool,
}

impl SqlxPriceRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PriceRepository for SqlxPriceRepository {
    async fn insert(&self, point: NewPricePoint) -> anyhow::Result<PricePoint> {
        // seq is generated by the database
        let row = sqlx::query(
            r#"
INSERT INTO price_points (asset, price, percent_change, recorded_ms)
VALUES ($1, $2, $3, $4)
RETURNING seq;
"#,
        )
        .bind(&point.asset)
        .bind(point.price.to_string())
        .bind(point.percent_change.map(|d| d.to_string()))
        .bind(to_ms(point.recorded_at))
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("insert price point for {}", point.asset))?;

        let seq: i64 = row.try_get("seq").context("read assigned seq")?;

        Ok(PricePoint {
            asset: point.asset,
            price: point.price,
            percent_change: point.percent_change,
            recorded_at: point.recorded_at,
            seq,
        })
    }

    async fn latest(&self, asset: &str) -> anyhow::Result<Option<PricePoint>> {
        let row = sqlx::query(&format!(
            r#"
SELECT {SELECT_COLUMNS}
FROM price_points
WHERE asset = $1
ORDER BY recorded_ms DESC, seq DESC
LIMIT 1;
"#
        ))
        .bind(asset)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("fetch latest price for {asset}"))?;

        row.as_ref().map(row_to_point).transpose()
    }

    async fn latest_at_or_before(
        &self,
        asset: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<PricePoint>> {
        let row = sqlx::query(&format!(
            r#"
SELECT {SELECT_COLUMNS}
FROM price_points
WHERE asset = $1 AND recorded_ms <= $2
ORDER BY recorded_ms DESC, seq DESC
LIMIT 1;
"#
        ))
        .bind(asset)
        .bind(to_ms(at))
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("fetch price for {asset} at or before {at}"))?;

        row.as_ref().map(row_to_point).transpose()
    }

    async fn range_desc(
        &self,
        asset: &str,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PricePoint>> {
        let rows = sqlx::query(&format!(
            r#"
SELECT {SELECT_COLUMNS}
FROM price_points
WHERE asset = $1 AND recorded_ms > $2 AND recorded_ms <= $3
ORDER BY recorded_ms DESC, seq DESC;
"#
        ))
        .bind(asset)
        .bind(to_ms(after))
        .bind(to_ms(until))
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("fetch price range for {asset}"))?;

        let mut out = Vec::with_capacity(rows.len());
        for r in &rows {
            match row_to_point(r) {
                Ok(p) => out.push(p),
                Err(e) => {
                    // poison-row resilience: skip but don't fail the series
                    tracing::warn!(error = %e, asset, "skipping malformed price row");
                }
            }
        }

        Ok(out)
    }
}

/* =========================
Row mapping
========================= */

fn row_to_point(r: &sqlx::any::AnyRow) -> anyhow::Result<PricePoint> {
    let price_str: String = r.try_get("price")?;
    let price = Decimal::from_str(&price_str).context("invalid price")?;
    if price <= Decimal::ZERO {
        return Err(anyhow!("non-positive stored price: {price}"));
    }

    let percent_change = r
        .try_get::<Option<String>, _>("percent_change")?
        .map(|s| Decimal::from_str(&s))
        .transpose()
        .context("invalid percent_change")?;

    Ok(PricePoint {
        asset: r.try_get("asset")?,
        price,
        percent_change,
        recorded_at: from_ms(r.try_get("recorded_ms")?)?,
        seq: r.try_get("seq")?,
    })
}
