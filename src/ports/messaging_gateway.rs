//! MessagingGateway port - Outbound replies through the chat provider.
//!
//! Delivery failures are reported, never retried by re-running the flow:
//! by the time a reply is sent the conversation has already advanced.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conversation::Identity;

/// Why a reply could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("delivery timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("provider rejected message with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl DeliveryError {
    /// Returns true if a later retry could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            DeliveryError::Timeout { .. } | DeliveryError::Transport(_) => true,
            DeliveryError::Rejected { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

/// Port for sending chat replies.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn send(&self, to: &Identity, text: &str) -> Result<(), DeliveryError>;
}
