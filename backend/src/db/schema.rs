use anyhow::Context;
use sqlx::AnyPool;

/// Column definition for `price_points.seq`, generated by the database so
/// concurrent inserts get distinct values.
pub fn seq_column(database_url: &str) -> &'static str {
    if database_url.starts_with("postgres") {
        "seq BIGSERIAL PRIMARY KEY"
    } else {
        "seq INTEGER PRIMARY KEY AUTOINCREMENT"
    }
}

/// Idempotent schema setup. Portable between SQLite and Postgres:
/// decimals are TEXT, timestamps are unix milliseconds, flags are 0/1.
pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    let seq = seq_column(pool.connect_options().database_url.as_str());

    // Price time series
    sqlx::query(&format!(
        r#"
CREATE TABLE IF NOT EXISTS price_points (
  {seq},
  asset TEXT NOT NULL,
  price TEXT NOT NULL,
  percent_change TEXT,
  recorded_ms BIGINT NOT NULL
);
"#
    ))
    .execute(pool)
    .await
    .context("create price_points")?;

    // Target alerts
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS alerts (
  alert_id TEXT PRIMARY KEY,
  asset TEXT NOT NULL,
  target_price TEXT NOT NULL,
  triggered BIGINT NOT NULL DEFAULT 0 CHECK (triggered IN (0,1)),
  subscriber TEXT NOT NULL,
  created_ms BIGINT NOT NULL,
  triggered_ms BIGINT
);
"#,
    )
    .execute(pool)
    .await
    .context("create alerts")?;

    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_price_points_asset_time ON price_points(asset, recorded_ms, seq);"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_alerts_untriggered ON alerts(triggered, asset);"#)
        .execute(pool)
        .await?;

    Ok(())
}
