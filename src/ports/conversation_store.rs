//! ConversationStore port - Durable per-identity conversation state.
//!
//! The store is the only place concurrency is controlled. Every write is a
//! compare-and-swap on `version`: two concurrent deliveries for the same
//! identity will see one `Swapped` and one `Conflict`, and the loser must
//! reload and recompute against the new state.
//!
//! ## Message Deduplication
//!
//! Providers may deliver the same message more than once. The store keeps
//! a claim per `(identity, message id)` and the last reply computed for it,
//! so a redelivery re-sends that reply without re-running the flow. A claim
//! without a reply belongs to a delivery that is still being processed, or
//! to one that crashed; `claimed_at` tells the two apart.

use async_trait::async_trait;

use crate::domain::conversation::{ConversationState, Identity};
use crate::domain::foundation::{DomainError, ProviderMessageId, Timestamp};

/// Outcome of a compare-and-swap write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapResult {
    /// The stored version matched; the new state is now current.
    Swapped,
    /// Another writer got there first.
    Conflict {
        /// Version currently stored (0 if none).
        current_version: u64,
    },
}

impl SwapResult {
    pub fn is_swapped(&self) -> bool {
        matches!(self, SwapResult::Swapped)
    }
}

/// A claimed provider message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageClaim {
    pub claimed_at: Timestamp,
    /// Reply computed for the message, once processing finished.
    pub reply: Option<String>,
}

impl MessageClaim {
    /// True when the claim has no reply and was taken before `cutoff`.
    pub fn is_abandoned(&self, cutoff: Timestamp) -> bool {
        self.reply.is_none() && self.claimed_at.is_before(&cutoff)
    }
}

/// Port for conversation state persistence.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Loads the state of `identity`.
    ///
    /// Returns a fresh `START` state with version 0 when nothing is stored.
    async fn load(&self, identity: &Identity) -> Result<ConversationState, DomainError>;

    /// Replaces the stored state if its version equals `expected_version`.
    ///
    /// `expected_version == 0` inserts only if no record exists yet.
    /// `new_state.identity` must equal `identity`.
    async fn compare_and_swap(
        &self,
        identity: &Identity,
        expected_version: u64,
        new_state: &ConversationState,
    ) -> Result<SwapResult, DomainError>;

    /// Claims a provider message for processing.
    ///
    /// Returns `true` if the message was already claimed (a duplicate).
    async fn record_processed_message(
        &self,
        identity: &Identity,
        message_id: &ProviderMessageId,
    ) -> Result<bool, DomainError>;

    /// Drops a claim so a provider retry is processed again.
    async fn release_processed_message(
        &self,
        identity: &Identity,
        message_id: &ProviderMessageId,
    ) -> Result<(), DomainError>;

    /// Stores the reply computed for a message.
    async fn save_reply(
        &self,
        identity: &Identity,
        message_id: &ProviderMessageId,
        reply: &str,
    ) -> Result<(), DomainError>;

    /// Finds the claim on a message, with its reply if one was recorded.
    ///
    /// Returns `None` when the message was never claimed or the claim was released.
    async fn find_claim(
        &self,
        identity: &Identity,
        message_id: &ProviderMessageId,
    ) -> Result<Option<MessageClaim>, DomainError>;

    /// States in `TERMINAL_SUCCESS` last updated before `older_than`, oldest first.
    ///
    /// States whose first action (`conv:<identity>:<version>:0`) is journaled
    /// as completed are excluded, so they cannot crowd out unexecuted ones.
    async fn find_awaiting_action(
        &self,
        older_than: Timestamp,
        limit: u32,
    ) -> Result<Vec<ConversationState>, DomainError>;
}
