//! HandleInboundMessageHandler - Runs one inbound chat message through the flow.
//!
//! 1. Claim the provider message id; a duplicate re-sends the stored reply
//! 2. Load, transition, compare-and-swap; on conflict reload and recompute
//! 3. Execute the committed commands, keyed by the new version
//! 4. Store the reply, then deliver it
//!
//! Delivery failures are reported but never roll back state or actions.
//!
//! ## Duplicates
//!
//! A duplicate may arrive while the first delivery is still running (a
//! provider retrying on timeout). It waits up to `DuplicatePolicy::wait` for
//! that reply. If none shows up it is acknowledged without sending anything.
//! Only a claim older than `stale_after` with no reply is treated as a crash,
//! and answered with the prompt of the current step.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{self, Instant};

use crate::domain::clinic::ActionKey;
use crate::domain::conversation::{
    action_failed_reply, prompt_for, transition, ConversationState, FlowContext, Identity,
    InboundMessage, Transition, TransitionKind,
};
use crate::domain::foundation::{DomainError, ProviderMessageId, Timestamp};
use crate::ports::{ActionExecutor, ConversationStore, DeliveryError, MessagingGateway, SwapResult};

/// Errors that stop an inbound message from being fully handled.
#[derive(Debug, Error)]
pub enum InboundMessageError {
    #[error("Conversation store error: {0}")]
    Store(#[from] DomainError),

    #[error("State write kept conflicting after {attempts} attempts")]
    ConflictRetriesExhausted { attempts: u32 },

    /// State and actions are committed; only the reply was lost.
    #[error("Reply delivery failed: {0}")]
    Delivery(#[source] DeliveryError),
}

/// How an inbound message was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    Processed {
        state: ConversationState,
        reply: String,
        kind: TransitionKind,
    },
    /// Already seen; the earlier reply was sent again.
    Duplicate { reply: String },
    /// Already seen and still being processed by another delivery; nothing was sent.
    InFlight,
}

impl InboundOutcome {
    /// Reply sent for this delivery, if any.
    pub fn reply(&self) -> Option<&str> {
        match self {
            InboundOutcome::Processed { reply, .. } | InboundOutcome::Duplicate { reply } => {
                Some(reply)
            }
            InboundOutcome::InFlight => None,
        }
    }
}

/// How long a duplicate waits on the delivery that claimed the message first.
#[derive(Debug, Clone)]
pub struct DuplicatePolicy {
    pub wait: Duration,
    pub poll_interval: Duration,
    /// Age after which an unanswered claim is considered abandoned.
    pub stale_after: Duration,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
            stale_after: Duration::from_secs(60),
        }
    }
}

/// What a duplicate found out about the delivery that claimed the message.
enum EarlierDelivery {
    Replied(String),
    InFlight,
    Released,
}

pub struct HandleInboundMessageHandler {
    store: Arc<dyn ConversationStore>,
    executor: Arc<dyn ActionExecutor>,
    gateway: Arc<dyn MessagingGateway>,
    flow: FlowContext,
    max_conflict_retries: u32,
    duplicates: DuplicatePolicy,
}

impl HandleInboundMessageHandler {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        executor: Arc<dyn ActionExecutor>,
        gateway: Arc<dyn MessagingGateway>,
        flow: FlowContext,
        max_conflict_retries: u32,
    ) -> Self {
        Self {
            store,
            executor,
            gateway,
            flow,
            max_conflict_retries: max_conflict_retries.max(1),
            duplicates: DuplicatePolicy::default(),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub async fn handle(&self, inbound: InboundMessage) -> Result<InboundOutcome, InboundMessageError> {
        let identity = &inbound.identity;
        let message_id = &inbound.message_id;

        if self.store.record_processed_message(identity, message_id).await? {
            match self.await_earlier_delivery(identity, message_id).await? {
                EarlierDelivery::Replied(reply) => {
                    tracing::info!(identity = %identity, message_id = %message_id, "Duplicate delivery, re-sending previous reply");
                    self.deliver(identity, &reply).await?;
                    return Ok(InboundOutcome::Duplicate { reply });
                }
                EarlierDelivery::InFlight => {
                    tracing::info!(identity = %identity, message_id = %message_id, "Duplicate delivery while the first is still processing");
                    return Ok(InboundOutcome::InFlight);
                }
                EarlierDelivery::Released => {
                    // The first delivery gave up before committing; take the claim over.
                    if self.store.record_processed_message(identity, message_id).await? {
                        return Ok(InboundOutcome::InFlight);
                    }
                }
            }
        }

        let committed = match self.commit(&inbound).await {
            Ok(t) => t,
            Err(e) => {
                // Nothing was committed; let a provider retry run the flow again.
                if let Err(release) = self.store.release_processed_message(identity, message_id).await {
                    tracing::warn!(identity = %identity, message_id = %message_id, error = %release, "Failed to release message claim");
                }
                return Err(e);
            }
        };

        tracing::info!(
            identity = %identity,
            message_id = %message_id,
            step = %committed.state.step,
            version = committed.state.version,
            transition = committed.kind.as_str(),
            "Conversation advanced"
        );

        let kind = committed.kind;
        let (state, reply) = self.execute_commands(committed).await?;

        self.store.save_reply(identity, message_id, &reply).await?;
        self.deliver(identity, &reply).await?;

        Ok(InboundOutcome::Processed { state, reply, kind })
    }

    /// Polls the claim until its reply is recorded, the wait runs out, or the claim goes away.
    async fn await_earlier_delivery(
        &self,
        identity: &Identity,
        message_id: &ProviderMessageId,
    ) -> Result<EarlierDelivery, InboundMessageError> {
        let deadline = Instant::now() + self.duplicates.wait;
        loop {
            let claim = match self.store.find_claim(identity, message_id).await? {
                Some(claim) => claim,
                None => return Ok(EarlierDelivery::Released),
            };
            let cutoff = Timestamp::now().minus_secs(self.duplicates.stale_after.as_secs());
            if claim.is_abandoned(cutoff) {
                tracing::warn!(identity = %identity, message_id = %message_id, "Abandoned message claim, answering with current prompt");
                let state = self.store.load(identity).await?;
                return Ok(EarlierDelivery::Replied(prompt_for(&state)));
            }
            if let Some(reply) = claim.reply {
                return Ok(EarlierDelivery::Replied(reply));
            }

            if Instant::now() >= deadline {
                return Ok(EarlierDelivery::InFlight);
            }
            time::sleep(self.duplicates.poll_interval).await;
        }
    }

    /// Transition and compare-and-swap, recomputing against fresh state on conflict.
    async fn commit(&self, inbound: &InboundMessage) -> Result<Transition, InboundMessageError> {
        for attempt in 1..=self.max_conflict_retries {
            let current = self.store.load(&inbound.identity).await?;
            let next = transition(&current, inbound, &self.flow);

            match self
                .store
                .compare_and_swap(&inbound.identity, current.version, &next.state)
                .await?
            {
                SwapResult::Swapped => return Ok(next),
                SwapResult::Conflict { current_version } => {
                    tracing::debug!(
                        identity = %inbound.identity,
                        attempt,
                        expected_version = current.version,
                        current_version,
                        "Concurrent state write, recomputing"
                    );
                }
            }
        }

        tracing::warn!(identity = %inbound.identity, attempts = self.max_conflict_retries, "Giving up after repeated write conflicts");
        Err(InboundMessageError::ConflictRetriesExhausted {
            attempts: self.max_conflict_retries,
        })
    }

    /// Runs the committed commands; a failure moves the conversation to `TERMINAL_ERROR`.
    async fn execute_commands(
        &self,
        committed: Transition,
    ) -> Result<(ConversationState, String), InboundMessageError> {
        let Transition { state, reply, .. } = committed;

        for (index, command) in reply.commands.iter().enumerate() {
            let key = ActionKey::for_transition(&state.identity, state.version, index);
            if let Err(failure) = self.executor.execute(&key, command).await {
                tracing::error!(
                    identity = %state.identity,
                    action_key = %key,
                    command = command.name(),
                    error = %failure,
                    "Action failed"
                );
                let failed = self.record_failure(&state).await?;
                return Ok((failed, action_failed_reply()));
            }
        }

        Ok((state, reply.text))
    }

    async fn record_failure(&self, state: &ConversationState) -> Result<ConversationState, InboundMessageError> {
        let failed = state.fail(Timestamp::now()).map_err(DomainError::from)?;
        match self
            .store
            .compare_and_swap(&state.identity, state.version, &failed)
            .await?
        {
            SwapResult::Swapped => Ok(failed),
            SwapResult::Conflict { current_version } => {
                // A newer message already reset the flow; keep its state.
                tracing::debug!(identity = %state.identity, current_version, "Conversation moved on before failure was recorded");
                Ok(self.store.load(&state.identity).await?)
            }
        }
    }

    async fn deliver(&self, identity: &Identity, reply: &str) -> Result<(), InboundMessageError> {
        self.gateway.send(identity, reply).await.map_err(|e| {
            tracing::warn!(identity = %identity, error = %e, transient = e.is_transient(), "Reply delivery failed");
            InboundMessageError::Delivery(e)
        })
    }
}
