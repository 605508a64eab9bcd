// HTTP SMS Channel (form-encoded + basic-auth provider API)

use async_trait::async_trait;
use lineup_core::port::notify::{ChannelError, ChannelKind, NotificationChannel, OutboundMessage};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SmsProviderConfig {
    /// Account-scoped messages endpoint, e.g.
    /// https://api.provider.com/2010-04-01/Accounts/{sid}/Messages.json
    pub api_url: String,
    pub account_sid: String,
    pub auth_token: String,
    /// Sending phone number in E.164 form.
    pub from: String,
}

pub struct HttpSmsChannel {
    config: SmsProviderConfig,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct SendResponse {
    sid: String,
}

impl HttpSmsChannel {
    pub fn new(config: SmsProviderConfig) -> Result<Self, ChannelError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl NotificationChannel for HttpSmsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn send(&self, message: &OutboundMessage) -> Result<String, ChannelError> {
        let params = [
            ("To", message.to.as_str()),
            ("From", self.config.from.as_str()),
            ("Body", message.body.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.api_url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
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
        debug!(provider_sid = %sent.sid, "sms accepted by provider");
        Ok(sent.sid)
    }
}
