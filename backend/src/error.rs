use thiserror::Error;

use crate::market::QuoteError;
use crate::notify::NotifyError;

/// Failure taxonomy of the engine. Every variant is scoped to one asset,
/// one alert or one run; none of them stops the process.
#[derive(Error, Debug)]
pub enum AppError {
    /// Quote source unreachable or returned something unusable.
    /// The asset is skipped for this tick, no retry.
    #[error("quote fetch failed for {asset}: {source}")]
    TransientFetch {
        asset: String,
        #[source]
        source: QuoteError,
    },

    #[error("quote fetch for {asset} timed out after {timeout_ms}ms")]
    FetchTimeout { asset: String, timeout_ms: u64 },

    /// Logged and dropped. Store mutations made before the send stay.
    #[error("notification delivery failed: {0}")]
    NotificationDelivery(#[from] NotifyError),

    /// Persistence unavailable. Aborts the current tick or sweep only.
    #[error("store unavailable: {0:#}")]
    Store(#[source] anyhow::Error),

    #[error("invalid alert: {0}")]
    InvalidAlert(String),
}

