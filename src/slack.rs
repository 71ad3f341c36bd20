//! Slack incoming-webhook delivery

use std::future::Future;
use tracing::{debug, warn};

use crate::notification::NotificationPayload;

/// One reason a message did not reach Slack.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryFailure {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Something that can hand a notification to a chat webhook.
/// Returns every failure it ran into; an empty list means delivered.
pub trait ChatDelivery {
    fn deliver(
        &self,
        webhook_url: &str,
        payload: &NotificationPayload,
    ) -> impl Future<Output = Vec<DeliveryFailure>> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct SlackClient {
    http: reqwest::Client,
}

impl SlackClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl ChatDelivery for SlackClient {
    async fn deliver(
        &self,
        webhook_url: &str,
        payload: &NotificationPayload,
    ) -> Vec<DeliveryFailure> {
        debug!(text = %payload.text, "Posting message to Slack");

        let response = match self.http.post(webhook_url).json(payload).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "Slack webhook request failed");
                return vec![DeliveryFailure::Transport(e)];
            }
        };

        if response.status().is_success() {
            return Vec::new();
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!(status, body = %body, "Slack webhook rejected the message");
        vec![DeliveryFailure::Rejected { status, body }]
    }
}
