use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::alerts::model::{Alert, AlertId, NewAlert};

#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn insert(&self, alert: NewAlert, created_at: DateTime<Utc>) -> Result<Alert>;

    async fn fetch_by_id(&self, id: &AlertId) -> Result<Option<Alert>>;

    async fn untriggered_for_asset(&self, asset: &str) -> Result<Vec<Alert>>;

    async fn untriggered(&self) -> Result<Vec<Alert>>;

    /// Flips `triggered` to true only if it is still false.
    ///
    /// Returns `true` when this call made the change, `false` when the alert
    /// was already triggered (or does not exist). Callers notify only on
    /// `true`, which makes the flip the single point of truth for
    /// "exactly one notification".
    async fn try_mark_triggered(&self, id: &AlertId, at: DateTime<Utc>) -> Result<bool>;
}
