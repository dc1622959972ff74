use std::time::Duration;

use anyhow::{Context, anyhow};
use rust_decimal::Decimal;

use crate::market::TrackedAsset;

/// MATIC ERC-20 contract on Ethereum mainnet.
const MATIC_ERC20_ETHEREUM: &str = "0x7D1AfA7B718fb893dB30A3aBc0Cfc608AaCfeBB0";
/// Native MATIC on Polygon PoS.
const MATIC_NATIVE_POLYGON: &str = "0x0000000000000000000000000000000000001010";

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string (sqlx Any: `sqlite://` or `postgres://`).
    pub database_url: String,

    // =========================
    // Quote provider
    // =========================
    pub moralis_api_key: String,
    pub moralis_base_url: String,

    /// Assets sampled on every tick. Order is only used for logging.
    pub assets: Vec<TrackedAsset>,

    // =========================
    // Cadence
    // =========================
    /// Fixed sampling cadence. Not drift-corrected.
    pub sample_interval: Duration,

    /// Cadence of the system-wide target alert sweep.
    pub sweep_interval: Duration,

    /// Upper bound on a single quote request, so one slow asset
    /// cannot hold back the other within a tick.
    pub quote_timeout: Duration,

    // =========================
    // Percentage-move rule
    // =========================
    /// Strict threshold in percent; a move must exceed it to fire.
    pub move_threshold_pct: Decimal,

    /// How far back the comparison point must be.
    pub move_lookback: chrono::Duration,

    /// Fixed recipient of percentage-move notifications.
    pub operator_contact: String,

    // =========================
    // Notification transport
    // =========================
    /// Mail relay endpoint. When unset notifications are only logged.
    pub notify_webhook_url: Option<String>,
    pub notify_from: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` is the
    /// production entry point; tests pass a map.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let assets = vec![
            TrackedAsset::new(
                "ethereum",
                or("ETHEREUM_CHAIN_ID", "0x1"),
                or("MATIC_ERC20_ETHEREUM", MATIC_ERC20_ETHEREUM),
            ),
            TrackedAsset::new(
                "polygon",
                or("POLYGON_CHAIN_ID", "0x89"),
                or("MATIC_NATIVE_POLYGON", MATIC_NATIVE_POLYGON),
            ),
        ];

        let move_threshold_pct = match get("MOVE_THRESHOLD_PCT") {
            Some(v) => v
                .trim()
                .parse::<Decimal>()
                .with_context(|| format!("MOVE_THRESHOLD_PCT is not a decimal: {v}"))?,
            None => Decimal::from(3),
        };
        if move_threshold_pct.is_sign_negative() {
            return Err(anyhow!("MOVE_THRESHOLD_PCT must not be negative"));
        }

        let lookback_secs = secs(&get, "MOVE_LOOKBACK_SECS", 3_600)?;
        let move_lookback = i64::try_from(lookback_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| anyhow!("MOVE_LOOKBACK_SECS is out of range: {lookback_secs}"))?;

        Ok(Self {
            database_url: or("DATABASE_URL", "sqlite://pricewatch_dev.db?mode=rwc"),

            moralis_api_key: or("MORALIS_API_KEY", ""),
            moralis_base_url: or("MORALIS_BASE_URL", "https://deep-index.moralis.io/api/v2.2"),

            assets,

            sample_interval: Duration::from_secs(secs(&get, "SAMPLE_INTERVAL_SECS", 300)?),
            sweep_interval: Duration::from_secs(secs(&get, "SWEEP_INTERVAL_SECS", 60)?),
            quote_timeout: Duration::from_secs(secs(&get, "QUOTE_TIMEOUT_SECS", 10)?),

            move_threshold_pct,
            move_lookback,
            operator_contact: or("PERCENTAGE_EMAIL_SEND_TO", "operator@localhost"),

            notify_webhook_url: get("NOTIFY_WEBHOOK_URL").filter(|v| !v.trim().is_empty()),
            notify_from: or("NOTIFY_FROM", "alerts@pricewatch.local"),
        })
    }
}

fn secs<F>(get: &F, key: &str, default: u64) -> anyhow::Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    let v: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} is not a whole number of seconds: {raw}"))?;
    if v == 0 {
        return Err(anyhow!("{key} must be greater than zero"));
    }
    Ok(v)
}
