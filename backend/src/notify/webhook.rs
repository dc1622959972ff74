use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::notify::{Notification, Notifier, NotifyError, render};

/// Delivers notifications as JSON to a mail relay endpoint.
#[derive(Clone)]
pub struct WebhookNotifier {
    http: Client,
    url: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    kind: &'a str,
}

impl WebhookNotifier {
    pub fn new(url: String, from: String) -> Result<Self, NotifyError> {
        if url.trim().is_empty() {
            return Err(NotifyError::Unavailable("relay url is empty".into()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, url, from })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[instrument(
        skip(self, notification, recipient),
        fields(kind = notification.kind(), asset = notification.asset()),
        level = "debug"
    )]
    async fn send(&self, notification: &Notification, recipient: &str) -> Result<(), NotifyError> {
        let msg = render(notification);
        let body = RelayMessage {
            from: &self.from,
            to: recipient,
            subject: &msg.subject,
            text: &msg.text,
            kind: notification.kind(),
        };

        let resp = self.http.post(&self.url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }

        debug!(%status, "notification accepted by relay");
        Ok(())
    }
}
