//! Canonical inbound message and outbound reply.

use serde::{Deserialize, Serialize};

use crate::domain::clinic::ActionCommand;
use crate::domain::foundation::{ProviderMessageId, Timestamp};

use super::Identity;

/// One message received from the transport, already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub identity: Identity,
    /// Raw UTF-8 text as sent by the user.
    pub body: String,
    pub profile_name: Option<String>,
    pub received_at: Timestamp,
    pub message_id: ProviderMessageId,
}

impl InboundMessage {
    pub fn new(identity: Identity, body: impl Into<String>, message_id: ProviderMessageId) -> Self {
        Self {
            identity,
            body: body.into(),
            profile_name: None,
            received_at: Timestamp::now(),
            message_id,
        }
    }

    pub fn with_profile_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        self.profile_name = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn with_received_at(mut self, at: Timestamp) -> Self {
        self.received_at = at;
        self
    }
}

/// Reply computed for one inbound message.
///
/// The commands must be executed before the reply is final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundReply {
    pub identity: Identity,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<ActionCommand>,
}

impl OutboundReply {
    pub fn text(identity: Identity, text: impl Into<String>) -> Self {
        Self {
            identity,
            text: text.into(),
            commands: Vec::new(),
        }
    }

    pub fn with_commands(mut self, commands: Vec<ActionCommand>) -> Self {
        self.commands = commands;
        self
    }

    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }
}
