// HTTP Email Channel (JSON + bearer-token provider API)

use async_trait::async_trait;
use lineup_core::port::notify::{ChannelError, ChannelKind, NotificationChannel, OutboundMessage};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct EmailProviderConfig {
    /// Send endpoint, e.g. https://api.provider.dev/emails
    pub api_url: String,
    pub api_key: String,
    /// From header, e.g. "Lineup <noreply@lineup.dev>"
    pub from: String,
}

pub struct HttpEmailChannel {
    config: EmailProviderConfig,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

impl HttpEmailChannel {
    pub fn new(config: EmailProviderConfig) -> Result<Self, ChannelError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl NotificationChannel for HttpEmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(&self, message: &OutboundMessage) -> Result<String, ChannelError> {
        let payload = serde_json::json!({
            "from": self.config.from,
            "to": [message.to],
            "subject": message.subject.as_deref().unwrap_or_default(),
            "html": message.body,
        });

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::Provider(format!("{status}: {body}")));
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| ChannelError::Provider(format!("malformed provider response: {e}")))?;
        debug!(provider_id = %sent.id, "email accepted by provider");
        Ok(sent.id)
    }
}
