//! Twilio messaging gateway.
//!
//! Sends replies through the Messages REST endpoint:
//! `POST {api_base_url}/2010-04-01/Accounts/{sid}/Messages.json` with basic
//! auth and form fields `From`, `To`, `Body`. Credentials are held in
//! `secrecy::SecretString`.
//!
//! # Configuration
//!
//! ```ignore
//! let config = TwilioConfig::new(account_sid, auth_token, "whatsapp:+14155238886");
//! let gateway = TwilioGateway::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::MessagingConfig;
use crate::domain::conversation::Identity;
use crate::ports::{DeliveryError, MessagingGateway};

use super::webhook_types::TwilioApiError;

/// Twilio API configuration.
#[derive(Clone)]
pub struct TwilioConfig {
    account_sid: String,
    auth_token: SecretString,
    /// Sender address, channel prefix included.
    sender: String,
    channel_prefix: String,
    api_base_url: String,
    timeout: Duration,
}

impl TwilioConfig {
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: SecretString::new(auth_token.into()),
            sender: sender.into(),
            channel_prefix: "whatsapp:".to_string(),
            api_base_url: "https://api.twilio.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_messaging(config: &MessagingConfig) -> Self {
        Self::new(
            config.account_sid.clone(),
            config.auth_token.clone(),
            config.sender.clone(),
        )
        .with_base_url(config.api_base_url.clone())
        .with_channel_prefix(config.channel_prefix.clone())
        .with_timeout(config.send_timeout())
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_channel_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.channel_prefix = prefix.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base_url.trim_end_matches('/'),
            self.account_sid
        )
    }

    /// Re-applies the channel prefix stripped on the way in.
    fn recipient(&self, to: &Identity) -> String {
        format!("{}{}", self.channel_prefix, to.as_str())
    }
}

/// Outbound gateway backed by the Twilio REST API.
pub struct TwilioGateway {
    config: TwilioConfig,
    http_client: reqwest::Client,
}

impl TwilioGateway {
    pub fn new(config: TwilioConfig) -> Result<Self, DeliveryError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeliveryError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> DeliveryError {
        if e.is_timeout() {
            DeliveryError::Timeout {
                timeout_secs: self.config.timeout.as_secs(),
            }
        } else {
            DeliveryError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl MessagingGateway for TwilioGateway {
    async fn send(&self, to: &Identity, text: &str) -> Result<(), DeliveryError> {
        let recipient = self.config.recipient(to);
        let params = [
            ("From", self.config.sender.as_str()),
            ("To", recipient.as_str()),
            ("Body", text),
        ];

        let response = self
            .http_client
            .post(self.config.messages_url())
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(&params)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(to = %to, "Reply delivered to provider");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<TwilioApiError>(&body)
            .map(|err| match err.code {
                Some(code) => format!("{} (code {})", err.message, code),
                None => err.message,
            })
            .unwrap_or(body);

        tracing::error!(to = %to, status = status.as_u16(), error = %message, "Provider rejected reply");
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
