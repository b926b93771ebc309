//! Per-identity conversation state and the flow step machine.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::foundation::{StateMachine, Timestamp, ValidationError};

use super::{Identity, Intent, Slot};

/// Where in the flow a user currently is.
///
/// Step tags as persisted:
/// - `START`: no active flow
/// - `AWAIT_INTENT`: root menu shown
/// - `COLLECTING_<SLOT>`: waiting for the value of one slot
/// - `CONFIRMING`: all slots present, awaiting explicit confirmation
/// - `TERMINAL_SUCCESS` / `TERMINAL_ERROR`: flow finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlowStep {
    #[default]
    Start,
    AwaitIntent,
    Collecting { intent: Intent, slot: Slot },
    Confirming { intent: Intent },
    TerminalSuccess { intent: Intent },
    TerminalError,
}

impl FlowStep {
    /// Persisted tag, e.g. `COLLECTING_ISSUE_DATE`.
    pub fn tag(&self) -> String {
        match self {
            FlowStep::Start => "START".to_string(),
            FlowStep::AwaitIntent => "AWAIT_INTENT".to_string(),
            FlowStep::Collecting { slot, .. } => format!("COLLECTING_{}", slot.tag()),
            FlowStep::Confirming { .. } => "CONFIRMING".to_string(),
            FlowStep::TerminalSuccess { .. } => "TERMINAL_SUCCESS".to_string(),
            FlowStep::TerminalError => "TERMINAL_ERROR".to_string(),
        }
    }

    /// Active intent, if any.
    pub fn intent(&self) -> Option<Intent> {
        match self {
            FlowStep::Collecting { intent, .. }
            | FlowStep::Confirming { intent }
            | FlowStep::TerminalSuccess { intent } => Some(*intent),
            _ => None,
        }
    }

    /// Rebuilds a step from its persisted tag and intent.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidFormat` for unknown tags, or when
    /// the tag requires an intent that is missing or does not own the slot.
    pub fn from_parts(tag: &str, intent: Option<Intent>) -> Result<Self, ValidationError> {
        let missing_intent =
            || ValidationError::invalid_format("step", format!("{} requires an intent", tag));

        let step = match tag {
            "START" => FlowStep::Start,
            "AWAIT_INTENT" => FlowStep::AwaitIntent,
            "CONFIRMING" => FlowStep::Confirming {
                intent: intent.ok_or_else(missing_intent)?,
            },
            "TERMINAL_SUCCESS" => FlowStep::TerminalSuccess {
                intent: intent.ok_or_else(missing_intent)?,
            },
            "TERMINAL_ERROR" => FlowStep::TerminalError,
            other => {
                let slot = other
                    .strip_prefix("COLLECTING_")
                    .and_then(Slot::from_tag)
                    .ok_or_else(|| {
                        ValidationError::invalid_format("step", format!("unknown step {}", other))
                    })?;
                let intent = intent.ok_or_else(missing_intent)?;
                if !intent.slots().contains(&slot) {
                    return Err(ValidationError::invalid_format(
                        "step",
                        format!("{} does not collect {}", intent.as_str(), slot.tag()),
                    ));
                }
                FlowStep::Collecting { intent, slot }
            }
        };
        Ok(step)
    }

    pub fn kind(&self) -> StepKind {
        match self {
            FlowStep::Start => StepKind::Start,
            FlowStep::AwaitIntent => StepKind::AwaitIntent,
            FlowStep::Collecting { .. } => StepKind::Collecting,
            FlowStep::Confirming { .. } => StepKind::Confirming,
            FlowStep::TerminalSuccess { .. } => StepKind::TerminalSuccess,
            FlowStep::TerminalError => StepKind::TerminalError,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowStep::TerminalSuccess { .. } | FlowStep::TerminalError)
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Coarse step category used to validate transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Start,
    AwaitIntent,
    Collecting,
    Confirming,
    TerminalSuccess,
    TerminalError,
}

impl StateMachine for StepKind {
    fn can_transition_to(&self, target: &Self) -> bool {
        use StepKind::*;
        matches!(
            (self, target),
            // Menu shown, or an intent started straight away
            (Start, AwaitIntent) | (Start, Collecting) |
            (AwaitIntent, AwaitIntent) | (AwaitIntent, Collecting) |
            // Slot accepted, rejected, or last slot filled
            (Collecting, Collecting) | (Collecting, Confirming) |
            // Re-ask, confirm, or restart collection
            (Confirming, Confirming) | (Confirming, TerminalSuccess) | (Confirming, Collecting) |
            // Action failed after commit
            (TerminalSuccess, TerminalError) |
            // Terminal states are not sticky
            (TerminalSuccess, AwaitIntent) | (TerminalSuccess, Collecting) |
            (TerminalError, AwaitIntent) | (TerminalError, Collecting)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use StepKind::*;
        match self {
            Start => vec![AwaitIntent, Collecting],
            AwaitIntent => vec![AwaitIntent, Collecting],
            Collecting => vec![Collecting, Confirming],
            Confirming => vec![Confirming, TerminalSuccess, Collecting],
            TerminalSuccess => vec![TerminalError, AwaitIntent, Collecting],
            TerminalError => vec![AwaitIntent, Collecting],
        }
    }
}

/// Durable per-identity conversation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    pub identity: Identity,
    pub step: FlowStep,
    /// Accepted slot values keyed by `Slot::key()`.
    pub slots: BTreeMap<String, String>,
    pub updated_at: Timestamp,
    /// Incremented on every successful transition; 0 means never stored.
    pub version: u64,
}

impl ConversationState {
    /// State of an identity that has never written to the store.
    pub fn initial(identity: Identity, now: Timestamp) -> Self {
        Self {
            identity,
            step: FlowStep::Start,
            slots: BTreeMap::new(),
            updated_at: now,
            version: 0,
        }
    }

    pub fn slot(&self, slot: Slot) -> Option<&str> {
        self.slots.get(slot.key()).map(String::as_str)
    }

    /// Returns a copy moved to `step`, with version and timestamp advanced.
    pub fn advance(&self, step: FlowStep, slots: BTreeMap<String, String>, now: Timestamp) -> Self {
        Self {
            identity: self.identity.clone(),
            step,
            slots,
            updated_at: now,
            version: self.version + 1,
        }
    }

    /// Moves the state to `TERMINAL_ERROR` after a failed action.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidFormat` if the current step cannot fail.
    pub fn fail(&self, now: Timestamp) -> Result<Self, ValidationError> {
        self.step.kind().transition_to(StepKind::TerminalError)?;
        Ok(self.advance(FlowStep::TerminalError, self.slots.clone(), now))
    }
}
