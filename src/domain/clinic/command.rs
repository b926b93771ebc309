//! Typed action commands produced by the flow engine (and the manual-entry form).
//!
//! The flow engine never performs side effects; it emits `ActionCommand`s that the
//! action executor applies once the conversation state is durably persisted.
//! Every execution is keyed by an `ActionKey` so a retry of the same key never
//! applies the command twice.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::conversation::Identity;
use crate::domain::foundation::ValidationError;

use super::{Appointment, NewAppointment, NewPrescription, Prescription};

/// A side effect requested by a completed flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionCommand {
    CreatePrescription(NewPrescription),
    CreateAppointment(NewAppointment),
}

impl ActionCommand {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ActionCommand::CreatePrescription(_) => "create_prescription",
            ActionCommand::CreateAppointment(_) => "create_appointment",
        }
    }
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "record", rename_all = "snake_case")]
pub enum ActionOutcome {
    PrescriptionCreated(Prescription),
    AppointmentCreated(Appointment),
}

/// Why a command could not be executed.
///
/// The message is for logs only; chat replies use a generic retry text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionFailure {
    #[error("Command rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error("Backend failure: {0}")]
    Backend(String),
}

impl ActionFailure {
    pub fn backend(reason: impl fmt::Display) -> Self {
        ActionFailure::Backend(reason.to_string())
    }
}

/// Idempotency key for one command execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionKey(String);

impl ActionKey {
    /// Key of the `index`-th command emitted by the transition that produced `version`.
    pub fn for_transition(identity: &Identity, version: u64, index: usize) -> Self {
        Self(format!("conv:{}:{}:{}", identity, version, index))
    }

    /// Fresh key for a manual-entry request.
    pub fn manual() -> Self {
        Self(format!("manual:{}", Uuid::new_v4()))
    }

    pub fn from_string(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
