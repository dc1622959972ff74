use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::alerts::model::{Alert, NewAlert};
use crate::alerts::repository::AlertRepository;
use crate::error::AppError;
use crate::market::TrackedAsset;

/// Alert intake used by the request layer.
///
/// Validates the input against the tracked asset set and stores the alert
/// untriggered, stamped with `now`.
#[instrument(skip(repo, tracked, subscriber), fields(asset = %asset, target = %target_price))]
pub async fn create_alert(
    repo: &dyn AlertRepository,
    tracked: &[TrackedAsset],
    asset: &str,
    target_price: Decimal,
    subscriber: &str,
    now: DateTime<Utc>,
) -> Result<Alert, AppError> {
    let asset = asset.trim().to_lowercase();
    if !tracked.iter().any(|a| a.id == asset) {
        return Err(AppError::InvalidAlert(format!("untracked asset: {asset}")));
    }
    if target_price <= Decimal::ZERO {
        return Err(AppError::InvalidAlert(format!(
            "target price must be positive, got {target_price}"
        )));
    }
    let subscriber = subscriber.trim();
    if !looks_like_address(subscriber) {
        return Err(AppError::InvalidAlert(format!(
            "invalid subscriber address: {subscriber:?}"
        )));
    }

    let alert = repo
        .insert(
            NewAlert {
                asset,
                target_price,
                subscriber: subscriber.to_string(),
            },
            now,
        )
        .await
        .map_err(AppError::Store)?;

    info!(alert_id = %alert.id, "alert created");
    Ok(alert)
}

fn looks_like_address(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !s.contains(' ')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_shape() {
        assert!(looks_like_address("alice@example.com"));
        assert!(!looks_like_address("alice"));
        assert!(!looks_like_address("@example.com"));
        assert!(!looks_like_address("alice@"));
        assert!(!looks_like_address("a@b@c"));
        assert!(!looks_like_address("al ice@example.com"));
    }
}
