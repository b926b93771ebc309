//! In-memory action journal.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::clinic::{ActionCommand, ActionKey, ActionOutcome};
use crate::domain::foundation::DomainError;
use crate::ports::{ActionJournal, JournalEntry};

#[derive(Default)]
pub struct InMemoryActionJournal {
    entries: RwLock<HashMap<ActionKey, JournalEntry>>,
}

impl InMemoryActionJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ActionJournal for InMemoryActionJournal {
    async fn find(&self, key: &ActionKey) -> Result<Option<JournalEntry>, DomainError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn record_completed(
        &self,
        key: &ActionKey,
        command: &ActionCommand,
        outcome: &ActionOutcome,
    ) -> Result<(), DomainError> {
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(JournalEntry::is_completed) {
            return Ok(());
        }
        entries.insert(
            key.clone(),
            JournalEntry::completed(key.clone(), command, outcome.clone()),
        );
        Ok(())
    }

    async fn record_failed(
        &self,
        key: &ActionKey,
        command: &ActionCommand,
        reason: &str,
    ) -> Result<(), DomainError> {
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(JournalEntry::is_completed) {
            return Ok(());
        }
        entries.insert(key.clone(), JournalEntry::failed(key.clone(), command, reason));
        Ok(())
    }
}
