use std::str::FromStr;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{AnyPool, Row};
use uuid::Uuid;

use crate::alerts::model::{Alert, AlertId, NewAlert};
use crate::alerts::repository::AlertRepository;
use crate::time::{from_ms, to_ms};

const SELECT_COLUMNS: &str =
    "alert_id, asset, target_price, triggered, subscriber, created_ms, triggered_ms";

/// SQLx-backed implementation of AlertRepository.
pub struct SqlxAlertRepository {
    pool: AnyPool,
}

impl SqlxAlertRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    async fn fetch_many(&self, sql: &str, asset: Option<&str>) -> anyhow::Result<Vec<Alert>> {
        let mut q = sqlx::query(sql);
        if let Some(asset) = asset {
            q = q.bind(asset);
        }
        let rows = q
            .fetch_all(&self.pool)
            .await
            .context("fetch untriggered alerts")?;

        let mut out = Vec::with_capacity(rows.len());
        for r in &rows {
            match row_to_alert(r) {
                Ok(a) => out.push(a),
                Err(e) => {
                    // poison-row resilience: one bad alert must not hide the rest
                    tracing::warn!(error = %e, "skipping malformed alert row");
                }
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl AlertRepository for SqlxAlertRepository {
    async fn insert(&self, alert: NewAlert, created_at: DateTime<Utc>) -> anyhow::Result<Alert> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
INSERT INTO alerts (alert_id, asset, target_price, triggered, subscriber, created_ms, triggered_ms)
VALUES ($1, $2, $3, 0, $4, $5, NULL);
"#,
        )
        .bind(id.to_string())
        .bind(&alert.asset)
        .bind(alert.target_price.to_string())
        .bind(&alert.subscriber)
        .bind(to_ms(created_at))
        .execute(&self.pool)
        .await
        .context("insert alert")?;

        Ok(Alert {
            id,
            asset: alert.asset,
            target_price: alert.target_price,
            triggered: false,
            subscriber: alert.subscriber,
            created_at,
            triggered_at: None,
        })
    }

    async fn fetch_by_id(&self, id: &AlertId) -> anyhow::Result<Option<Alert>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM alerts WHERE alert_id = $1;"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("fetch alert {id}"))?;

        row.as_ref().map(row_to_alert).transpose()
    }

    async fn untriggered_for_asset(&self, asset: &str) -> anyhow::Result<Vec<Alert>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM alerts WHERE triggered = 0 AND asset = $1 ORDER BY created_ms;"
        );
        self.fetch_many(&sql, Some(asset)).await
    }

    async fn untriggered(&self) -> anyhow::Result<Vec<Alert>> {
        let sql =
            format!("SELECT {SELECT_COLUMNS} FROM alerts WHERE triggered = 0 ORDER BY created_ms;");
        self.fetch_many(&sql, None).await
    }

    async fn try_mark_triggered(&self, id: &AlertId, at: DateTime<Utc>) -> anyhow::Result<bool> {
        // The WHERE clause is the guard: of two concurrent callers only one
        // sees a changed row.
        let res = sqlx::query(
            r#"
UPDATE alerts
SET triggered = 1, triggered_ms = $1
WHERE alert_id = $2 AND triggered = 0;
"#,
        )
        .bind(to_ms(at))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .with_context(|| format!("mark alert {id} triggered"))?;

        Ok(res.rows_affected() == 1)
    }
}

/* =========================
Row mapping
========================= */

fn row_to_alert(r: &sqlx::any::AnyRow) -> anyhow::Result<Alert> {
    let id_str: String = r.try_get("alert_id")?;
    let id = Uuid::parse_str(&id_str).context("invalid alert_id")?;

    let target_str: String = r.try_get("target_price")?;
    let target_price = Decimal::from_str(&target_str).context("invalid target_price")?;

    let triggered = match r.try_get::<i64, _>("triggered")? {
        0 => false,
        1 => true,
        other => return Err(anyhow!("invalid triggered flag: {other}")),
    };

    let triggered_at = r
        .try_get::<Option<i64>, _>("triggered_ms")?
        .map(from_ms)
        .transpose()?;

    Ok(Alert {
        id,
        asset: r.try_get("asset")?,
        target_price,
        triggered,
        subscriber: r.try_get("subscriber")?,
        created_at: from_ms(r.try_get("created_ms")?)?,
        triggered_at,
    })
}
