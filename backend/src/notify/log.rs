use async_trait::async_trait;
use tracing::info;

use crate::notify::{Notification, Notifier, NotifyError, render};

/// Writes notifications to the log instead of delivering them.
/// Used when no relay is configured.
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification, recipient: &str) -> Result<(), NotifyError> {
        let msg = render(notification);
        info!(
            kind = notification.kind(),
            asset = notification.asset(),
            to = recipient,
            subject = %msg.subject,
            "notification (log only)"
        );
        Ok(())
    }
}
