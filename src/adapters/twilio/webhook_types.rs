//! Twilio-specific types for the WhatsApp webhook.
//!
//! The provider posts `application/x-www-form-urlencoded` bodies with
//! PascalCase field names. Only the fields the flow needs are kept.

use serde::Deserialize;
use thiserror::Error;

use crate::domain::conversation::{Identity, InboundMessage};
use crate::domain::foundation::{ProviderMessageId, ValidationError};

/// Inbound webhook form as posted by the provider.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TwilioInboundForm {
    /// Sender, e.g. `whatsapp:+5511999999999`.
    #[serde(default)]
    pub from: String,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub profile_name: Option<String>,

    #[serde(default)]
    pub message_sid: Option<String>,

    /// Legacy id field, used when `MessageSid` is absent.
    #[serde(default)]
    pub sms_message_sid: Option<String>,
}

/// Why a webhook form could not become an [`InboundMessage`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WebhookDecodeError {
    #[error("invalid sender: {0}")]
    InvalidSender(ValidationError),

    #[error("missing message id")]
    MissingMessageId,
}

impl TwilioInboundForm {
    fn message_id(&self) -> Option<&str> {
        [self.message_sid.as_deref(), self.sms_message_sid.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|sid| !sid.is_empty())
    }

    /// Normalizes the sender and picks the message id.
    pub fn into_inbound(self) -> Result<InboundMessage, WebhookDecodeError> {
        let identity = Identity::parse(&self.from).map_err(WebhookDecodeError::InvalidSender)?;
        let message_id = self
            .message_id()
            .and_then(|sid| ProviderMessageId::new(sid).ok())
            .ok_or(WebhookDecodeError::MissingMessageId)?;

        let message = InboundMessage::new(identity, self.body, message_id);
        Ok(match self.profile_name {
            Some(name) => message.with_profile_name(name),
            None => message,
        })
    }
}

/// Error body returned by the provider's REST API.
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioApiError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}
