pub mod errors;
pub mod log;
pub mod render;
pub mod types;
pub mod webhook;

use async_trait::async_trait;

pub use errors::NotifyError;
pub use log::LogNotifier;
pub use render::{RenderedMessage, render};
pub use types::{Notification, PercentageMove, TargetReached};
pub use webhook::WebhookNotifier;

/// Outbound delivery of alert notifications.
///
/// Implementations report failure; callers log it and carry on. A failed
/// send never rolls back store state.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification, recipient: &str) -> Result<(), NotifyError>;
}
