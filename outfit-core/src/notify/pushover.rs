use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    error::{PipelineError, describe_transport_error},
    model::{NotificationReceipt, NotificationRequest},
};

use super::Notifier;

/// Pushover `1/messages.json` client.
#[derive(Clone)]
pub struct PushoverNotifier {
    base_url: String,
    api_token: String,
    user_key: String,
    http: Client,
}

// Keep credentials out of logs.
impl std::fmt::Debug for PushoverNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushoverNotifier").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct PushoverAck {
    status: Option<i64>,
    request: Option<String>,
}

impl PushoverNotifier {
    pub fn new(
        base_url: &str,
        api_token: &str,
        user_key: &str,
        timeout_secs: u64,
    ) -> Result<Self, PipelineError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            user_key: user_key.to_string(),
            http,
        })
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn send(
        &self,
        request: &NotificationRequest,
    ) -> Result<NotificationReceipt, PipelineError> {
        let url = format!("{}/1/messages.json", self.base_url);
        let priority = request.priority.to_string();

        let res = self
            .http
            .post(&url)
            .form(&[
                ("token", self.api_token.as_str()),
                ("user", self.user_key.as_str()),
                ("title", request.title.as_str()),
                ("message", request.message.as_str()),
                ("priority", priority.as_str()),
                ("sound", request.sound.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PipelineError::DeliveryUnreachable(describe_transport_error(&e)))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            PipelineError::DeliveryUnreachable(format!(
                "Failed to read Pushover response body: {}",
                describe_transport_error(&e)
            ))
        })?;

        if status.as_u16() >= 400 {
            tracing::warn!(status = status.as_u16(), body = %body, "Pushover rejected notification");
            return Err(PipelineError::DeliveryRejected { status: status.as_u16(), body });
        }

        let receipt = match serde_json::from_str::<PushoverAck>(&body) {
            Ok(ack) => NotificationReceipt { status: ack.status, request: ack.request, raw: body },
            Err(_) => NotificationReceipt { status: None, request: None, raw: body },
        };

        Ok(receipt)
    }
}
