//! Messaging gateways that do not talk to a provider.
//!
//! `LoggingGateway` is wired when outbound messaging is disabled;
//! `RecordingGateway` captures replies for test assertions.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::conversation::Identity;
use crate::ports::{DeliveryError, MessagingGateway};

/// Logs replies instead of sending them.
#[derive(Debug, Default)]
pub struct LoggingGateway;

#[async_trait]
impl MessagingGateway for LoggingGateway {
    async fn send(&self, to: &Identity, text: &str) -> Result<(), DeliveryError> {
        tracing::info!(identity = %to, chars = text.chars().count(), "Outbound messaging disabled, reply not sent");
        Ok(())
    }
}

/// A reply captured by `RecordingGateway`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: Identity,
    pub text: String,
}

/// Captures sent replies; can be told to fail.
#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<SentMessage>>,
    failure: Mutex<Option<DeliveryError>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail with `error` (or succeed again with `None`).
    pub fn fail_with(&self, error: Option<DeliveryError>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = error;
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last_text(&self) -> Option<String> {
        self.sent().last().map(|m| m.text.clone())
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send(&self, to: &Identity, text: &str) -> Result<(), DeliveryError> {
        let failure = self.failure.lock().ok().and_then(|f| f.clone());
        if let Some(error) = failure {
            return Err(error);
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentMessage {
                to: to.clone(),
                text: text.to_string(),
            });
        }
        Ok(())
    }
}
