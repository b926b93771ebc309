//! In-memory conversation store.
//!
//! Used for local development (`database.backend = "memory"`) and tests.
//! State is lost on restart.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::clinic::ActionKey;
use crate::domain::conversation::{ConversationState, FlowStep, Identity};
use crate::domain::foundation::{DomainError, ErrorCode, ProviderMessageId, Timestamp};
use crate::ports::{ActionJournal, ConversationStore, MessageClaim, SwapResult};

type MessageKey = (Identity, ProviderMessageId);

/// Conversation store backed by process memory.
#[derive(Default)]
pub struct InMemoryConversationStore {
    states: RwLock<HashMap<Identity, ConversationState>>,
    messages: RwLock<HashMap<MessageKey, MessageClaim>>,
    /// Journal consulted by `find_awaiting_action` to skip completed actions.
    journal: Option<Arc<dyn ActionJournal>>,
}

impl InMemoryConversationStore {
    /// Store without a journal; every old `TERMINAL_SUCCESS` state counts as awaiting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that shares the executor's journal, like the Postgres store does through SQL.
    pub fn with_journal(journal: Arc<dyn ActionJournal>) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    // === Test Helpers ===

    /// Number of identities with stored state.
    pub async fn state_count(&self) -> usize {
        self.states.read().await.len()
    }

    /// Overwrites the stored state without a version check.
    pub async fn put(&self, state: ConversationState) {
        self.states
            .write()
            .await
            .insert(state.identity.clone(), state);
    }

    /// Overwrites a message claim, e.g. to backdate it.
    pub async fn put_claim(
        &self,
        identity: &Identity,
        message_id: &ProviderMessageId,
        claim: MessageClaim,
    ) {
        self.messages
            .write()
            .await
            .insert((identity.clone(), message_id.clone()), claim);
    }

    async fn first_action_completed(&self, state: &ConversationState) -> Result<bool, DomainError> {
        match &self.journal {
            Some(journal) => {
                let key = ActionKey::for_transition(&state.identity, state.version, 0);
                journal.is_completed(&key).await
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn load(&self, identity: &Identity) -> Result<ConversationState, DomainError> {
        let states = self.states.read().await;
        Ok(states
            .get(identity)
            .cloned()
            .unwrap_or_else(|| ConversationState::initial(identity.clone(), Timestamp::now())))
    }

    async fn compare_and_swap(
        &self,
        identity: &Identity,
        expected_version: u64,
        new_state: &ConversationState,
    ) -> Result<SwapResult, DomainError> {
        if &new_state.identity != identity {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "State identity does not match the target identity",
            ));
        }

        let mut states = self.states.write().await;
        let current_version = states.get(identity).map(|s| s.version).unwrap_or(0);

        if current_version != expected_version {
            return Ok(SwapResult::Conflict { current_version });
        }

        states.insert(identity.clone(), new_state.clone());
        Ok(SwapResult::Swapped)
    }

    async fn record_processed_message(
        &self,
        identity: &Identity,
        message_id: &ProviderMessageId,
    ) -> Result<bool, DomainError> {
        let mut messages = self.messages.write().await;
        let key = (identity.clone(), message_id.clone());
        if messages.contains_key(&key) {
            return Ok(true);
        }
        messages.insert(
            key,
            MessageClaim {
                claimed_at: Timestamp::now(),
                reply: None,
            },
        );
        Ok(false)
    }

    async fn release_processed_message(
        &self,
        identity: &Identity,
        message_id: &ProviderMessageId,
    ) -> Result<(), DomainError> {
        self.messages
            .write()
            .await
            .remove(&(identity.clone(), message_id.clone()));
        Ok(())
    }

    async fn save_reply(
        &self,
        identity: &Identity,
        message_id: &ProviderMessageId,
        reply: &str,
    ) -> Result<(), DomainError> {
        let mut messages = self.messages.write().await;
        let claim = messages
            .entry((identity.clone(), message_id.clone()))
            .or_insert_with(|| MessageClaim {
                claimed_at: Timestamp::now(),
                reply: None,
            });
        claim.reply = Some(reply.to_string());
        Ok(())
    }

    async fn find_claim(
        &self,
        identity: &Identity,
        message_id: &ProviderMessageId,
    ) -> Result<Option<MessageClaim>, DomainError> {
        Ok(self
            .messages
            .read()
            .await
            .get(&(identity.clone(), message_id.clone()))
            .cloned())
    }

    async fn find_awaiting_action(
        &self,
        older_than: Timestamp,
        limit: u32,
    ) -> Result<Vec<ConversationState>, DomainError> {
        let mut candidates: Vec<ConversationState> = {
            let states = self.states.read().await;
            states
                .values()
                .filter(|s| matches!(s.step, FlowStep::TerminalSuccess { .. }))
                .filter(|s| s.updated_at.is_before(&older_than))
                .cloned()
                .collect()
        };
        candidates.sort_by_key(|s| s.updated_at);

        let mut pending = Vec::new();
        for state in candidates {
            if pending.len() >= limit as usize {
                break;
            }
            if !self.first_action_completed(&state).await? {
                pending.push(state);
            }
        }
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryActionJournal;
    use crate::domain::clinic::{ActionCommand, ActionOutcome, NewPrescription, Prescription, RecordSource};
    use crate::domain::conversation::Intent;
    use crate::domain::foundation::ClientId;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn identity() -> Identity {
        Identity::parse("+551199999999").unwrap()
    }

    fn message_id(id: &str) -> ProviderMessageId {
        ProviderMessageId::new(id).unwrap()
    }

    fn draft() -> NewPrescription {
        NewPrescription {
            client_id: ClientId::new("+5511900000001").unwrap(),
            medications: "Dipirona".to_string(),
            instructions: String::new(),
            issue_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            doctor_name: "Dra. Ana".to_string(),
            doctor_crm: "123".to_string(),
            source: RecordSource::Chat,
        }
    }

    fn command() -> ActionCommand {
        ActionCommand::CreatePrescription(draft())
    }

    fn outcome() -> ActionOutcome {
        ActionOutcome::PrescriptionCreated(Prescription::issue(draft(), Timestamp::now()).unwrap())
    }

    fn state_with(step: FlowStep, version: u64, updated_at: Timestamp) -> ConversationState {
        ConversationState {
            identity: identity(),
            step,
            slots: BTreeMap::new(),
            updated_at,
            version,
        }
    }

    mod load_and_swap {
        use super::*;

        #[tokio::test]
        async fn load_unknown_identity_returns_start() {
            let store = InMemoryConversationStore::new();
            let state = store.load(&identity()).await.unwrap();
            assert_eq!(state.step, FlowStep::Start);
            assert_eq!(state.version, 0);
        }

        #[tokio::test]
        async fn first_write_expects_version_zero() {
            let store = InMemoryConversationStore::new();
            let next = state_with(FlowStep::AwaitIntent, 1, Timestamp::now());

            let result = store.compare_and_swap(&identity(), 0, &next).await.unwrap();

            assert_eq!(result, SwapResult::Swapped);
            assert_eq!(store.load(&identity()).await.unwrap(), next);
        }

        #[tokio::test]
        async fn stale_version_conflicts_and_keeps_current_state() {
            let store = InMemoryConversationStore::new();
            let v1 = state_with(FlowStep::AwaitIntent, 1, Timestamp::now());
            store.compare_and_swap(&identity(), 0, &v1).await.unwrap();

            let stale = state_with(FlowStep::TerminalError, 1, Timestamp::now());
            let result = store.compare_and_swap(&identity(), 0, &stale).await.unwrap();

            assert_eq!(result, SwapResult::Conflict { current_version: 1 });
            assert_eq!(store.load(&identity()).await.unwrap(), v1);
        }

        #[tokio::test]
        async fn mismatched_identity_is_rejected() {
            let store = InMemoryConversationStore::new();
            let other = Identity::parse("+5511988887777").unwrap();
            let state = state_with(FlowStep::AwaitIntent, 1, Timestamp::now());

            assert!(store.compare_and_swap(&other, 0, &state).await.is_err());
        }
    }

    mod dedup {
        use super::*;

        #[tokio::test]
        async fn second_claim_reports_duplicate() {
            let store = InMemoryConversationStore::new();
            assert!(!store.record_processed_message(&identity(), &message_id("SM1")).await.unwrap());
            assert!(store.record_processed_message(&identity(), &message_id("SM1")).await.unwrap());
            assert!(!store.record_processed_message(&identity(), &message_id("SM2")).await.unwrap());
        }

        #[tokio::test]
        async fn released_claim_can_be_taken_again() {
            let store = InMemoryConversationStore::new();
            store.record_processed_message(&identity(), &message_id("SM1")).await.unwrap();
            store.release_processed_message(&identity(), &message_id("SM1")).await.unwrap();

            assert!(!store.record_processed_message(&identity(), &message_id("SM1")).await.unwrap());
        }

        #[tokio::test]
        async fn claim_carries_reply_after_save() {
            let store = InMemoryConversationStore::new();
            store.record_processed_message(&identity(), &message_id("SM1")).await.unwrap();
            let claim = store.find_claim(&identity(), &message_id("SM1")).await.unwrap().unwrap();
            assert_eq!(claim.reply, None);

            store.save_reply(&identity(), &message_id("SM1"), "Olá").await.unwrap();

            let saved = store.find_claim(&identity(), &message_id("SM1")).await.unwrap().unwrap();
            assert_eq!(saved.reply.as_deref(), Some("Olá"));
            assert_eq!(saved.claimed_at, claim.claimed_at);
        }

        #[tokio::test]
        async fn released_claim_is_not_found() {
            let store = InMemoryConversationStore::new();
            store.record_processed_message(&identity(), &message_id("SM1")).await.unwrap();
            store.release_processed_message(&identity(), &message_id("SM1")).await.unwrap();

            assert_eq!(store.find_claim(&identity(), &message_id("SM1")).await.unwrap(), None);
        }
    }

    mod awaiting_action {
        use super::*;

        #[tokio::test]
        async fn only_old_success_states_are_returned() {
            let store = InMemoryConversationStore::new();
            let now = Timestamp::now();
            let second = Identity::parse("+5511988887777").unwrap();

            store
                .put(state_with(
                    FlowStep::TerminalSuccess { intent: Intent::Prescription },
                    4,
                    now.minus_secs(120),
                ))
                .await;
            let mut fresh = state_with(
                FlowStep::TerminalSuccess { intent: Intent::Appointment },
                5,
                now,
            );
            fresh.identity = second;
            store.put(fresh).await;

            let pending = store.find_awaiting_action(now.minus_secs(30), 10).await.unwrap();

            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].identity, identity());
        }

        #[tokio::test]
        async fn limit_is_applied() {
            let store = InMemoryConversationStore::new();
            let now = Timestamp::now();
            for (i, number) in ["+5511900000001", "+5511900000002", "+5511900000003"]
                .iter()
                .enumerate()
            {
                let mut s = state_with(
                    FlowStep::TerminalSuccess { intent: Intent::Prescription },
                    2,
                    now.minus_secs(600 - i as u64),
                );
                s.identity = Identity::parse(number).unwrap();
                store.put(s).await;
            }

            let pending = store.find_awaiting_action(now, 2).await.unwrap();

            assert_eq!(pending.len(), 2);
            assert_eq!(pending[0].identity.as_str(), "+5511900000001");
        }

        #[tokio::test]
        async fn completed_actions_do_not_fill_the_batch() {
            let journal = Arc::new(InMemoryActionJournal::new());
            let store = InMemoryConversationStore::with_journal(journal.clone());
            let now = Timestamp::now();
            let numbers = ["+5511900000001", "+5511900000002", "+5511900000003", "+5511900000004"];
            for (i, number) in numbers.iter().enumerate() {
                let mut s = state_with(
                    FlowStep::TerminalSuccess { intent: Intent::Prescription },
                    5,
                    now.minus_secs(600 - i as u64),
                );
                s.identity = Identity::parse(number).unwrap();
                store.put(s).await;
            }
            // The three oldest already ran their action.
            for number in &numbers[..3] {
                let key = ActionKey::for_transition(&Identity::parse(number).unwrap(), 5, 0);
                journal
                    .record_completed(&key, &command(), &outcome())
                    .await
                    .unwrap();
            }

            let pending = store.find_awaiting_action(now, 3).await.unwrap();

            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].identity.as_str(), "+5511900000004");
        }
    }
}
