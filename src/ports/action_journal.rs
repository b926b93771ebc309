//! ActionJournal port - Completion record per action key.
//!
//! The executor consults the journal before applying a command and records
//! the outcome afterwards, so replaying the same `ActionKey` after a crash
//! or a reconciliation pass never applies a command twice.

use async_trait::async_trait;

use crate::domain::clinic::{ActionCommand, ActionKey, ActionOutcome};
use crate::domain::foundation::{DomainError, Timestamp};

/// Final status of a journaled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JournalStatus {
    Completed,
    Failed,
}

impl JournalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalStatus::Completed => "completed",
            JournalStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(JournalStatus::Completed),
            "failed" => Some(JournalStatus::Failed),
            _ => None,
        }
    }
}

/// Journal record of one action execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub key: ActionKey,
    /// Command name, e.g. `create_prescription`.
    pub command: String,
    pub status: JournalStatus,
    pub outcome: Option<ActionOutcome>,
    pub failure: Option<String>,
    pub recorded_at: Timestamp,
}

impl JournalEntry {
    pub fn completed(key: ActionKey, command: &ActionCommand, outcome: ActionOutcome) -> Self {
        Self {
            key,
            command: command.name().to_string(),
            status: JournalStatus::Completed,
            outcome: Some(outcome),
            failure: None,
            recorded_at: Timestamp::now(),
        }
    }

    pub fn failed(key: ActionKey, command: &ActionCommand, reason: impl Into<String>) -> Self {
        Self {
            key,
            command: command.name().to_string(),
            status: JournalStatus::Failed,
            outcome: None,
            failure: Some(reason.into()),
            recorded_at: Timestamp::now(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == JournalStatus::Completed
    }
}

/// Port for the action completion journal.
#[async_trait]
pub trait ActionJournal: Send + Sync {
    async fn find(&self, key: &ActionKey) -> Result<Option<JournalEntry>, DomainError>;

    /// Records a successful execution. A completed entry is never overwritten.
    async fn record_completed(
        &self,
        key: &ActionKey,
        command: &ActionCommand,
        outcome: &ActionOutcome,
    ) -> Result<(), DomainError>;

    /// Records a failed execution. A later success for the same key replaces it.
    async fn record_failed(
        &self,
        key: &ActionKey,
        command: &ActionCommand,
        reason: &str,
    ) -> Result<(), DomainError>;

    async fn is_completed(&self, key: &ActionKey) -> Result<bool, DomainError> {
        Ok(self
            .find(key)
            .await?
            .map(|entry| entry.is_completed())
            .unwrap_or(false))
    }
}
