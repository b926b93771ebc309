//! Messaging provider configuration (Twilio-style WhatsApp API)

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Outbound messaging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingConfig {
    /// Send replies through the provider; when false replies are only logged
    #[serde(default)]
    pub enabled: bool,

    /// Provider account SID
    #[serde(default)]
    pub account_sid: String,

    /// Provider auth token
    #[serde(default)]
    pub auth_token: String,

    /// Sender address including channel prefix, e.g. `whatsapp:+14155238886`
    #[serde(default)]
    pub sender: String,

    /// Provider API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Prefix re-applied to identities when sending
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,

    /// Send request timeout in seconds
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
}

impl MessagingConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    /// Validate messaging configuration
    ///
    /// Credentials are only checked when sending is enabled.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.send_timeout_secs == 0 || self.send_timeout_secs > 60 {
            return Err(ValidationError::InvalidSendTimeout);
        }

        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidMessagingUrl);
        }

        if !self.enabled {
            return Ok(());
        }

        if self.account_sid.is_empty() {
            return Err(ValidationError::MissingRequired("MESSAGING__ACCOUNT_SID"));
        }
        if self.auth_token.is_empty() {
            return Err(ValidationError::MissingRequired("MESSAGING__AUTH_TOKEN"));
        }
        if self.sender.is_empty() {
            return Err(ValidationError::MissingRequired("MESSAGING__SENDER"));
        }

        if !self.account_sid.starts_with("AC") {
            return Err(ValidationError::InvalidAccountSid);
        }
        if !self.sender.starts_with(&self.channel_prefix) {
            return Err(ValidationError::SenderMissingChannelPrefix);
        }

        Ok(())
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            account_sid: String::new(),
            auth_token: String::new(),
            sender: String::new(),
            api_base_url: default_api_base_url(),
            channel_prefix: default_channel_prefix(),
            send_timeout_secs: default_send_timeout(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_channel_prefix() -> String {
    "whatsapp:".to_string()
}

fn default_send_timeout() -> u64 {
    10
}
