//! DomainActionExecutor - Applies action commands against clinic repositories.
//!
//! ## Idempotency
//!
//! 1. Before executing: look the key up in the action journal
//! 2. If completed: return the recorded outcome, touch nothing
//! 3. Otherwise: apply the command, then journal the result
//!
//! Failures are journaled too, but a failed key may be retried and a later
//! success replaces the failure.

use std::sync::Arc;

use crate::domain::clinic::{
    ActionCommand, ActionFailure, ActionKey, ActionOutcome, Appointment, Prescription,
};
use crate::domain::foundation::Timestamp;
use crate::ports::{
    ActionExecutor, ActionJournal, AppointmentRepository, JournalEntry, PrescriptionRepository,
};

use async_trait::async_trait;

/// Action executor backed by the clinic repositories and the action journal.
pub struct DomainActionExecutor {
    journal: Arc<dyn ActionJournal>,
    prescriptions: Arc<dyn PrescriptionRepository>,
    appointments: Arc<dyn AppointmentRepository>,
}

impl DomainActionExecutor {
    pub fn new(
        journal: Arc<dyn ActionJournal>,
        prescriptions: Arc<dyn PrescriptionRepository>,
        appointments: Arc<dyn AppointmentRepository>,
    ) -> Self {
        Self {
            journal,
            prescriptions,
            appointments,
        }
    }

    async fn apply(&self, command: &ActionCommand) -> Result<ActionOutcome, ActionFailure> {
        let now = Timestamp::now();
        match command {
            ActionCommand::CreatePrescription(draft) => {
                let prescription = Prescription::issue(draft.clone(), now)?;
                self.prescriptions
                    .save(&prescription)
                    .await
                    .map_err(ActionFailure::backend)?;
                Ok(ActionOutcome::PrescriptionCreated(prescription))
            }
            ActionCommand::CreateAppointment(draft) => {
                let appointment = Appointment::schedule(draft.clone(), now)?;
                self.appointments
                    .save(&appointment)
                    .await
                    .map_err(ActionFailure::backend)?;
                Ok(ActionOutcome::AppointmentCreated(appointment))
            }
        }
    }
}

#[async_trait]
impl ActionExecutor for DomainActionExecutor {
    async fn execute(
        &self,
        key: &ActionKey,
        command: &ActionCommand,
    ) -> Result<ActionOutcome, ActionFailure> {
        let existing = self
            .journal
            .find(key)
            .await
            .map_err(ActionFailure::backend)?;

        if let Some(outcome) = existing
            .filter(JournalEntry::is_completed)
            .and_then(|entry| entry.outcome)
        {
            tracing::debug!(action_key = %key, command = command.name(), "Action already completed, returning recorded outcome");
            return Ok(outcome);
        }

        match self.apply(command).await {
            Ok(outcome) => {
                // The record exists now; a journal miss only risks a repeat on replay.
                if let Err(e) = self.journal.record_completed(key, command, &outcome).await {
                    tracing::error!(action_key = %key, error = %e, "Failed to journal completed action");
                }
                tracing::info!(action_key = %key, command = command.name(), "Action completed");
                Ok(outcome)
            }
            Err(failure) => {
                if let Err(e) = self
                    .journal
                    .record_failed(key, command, &failure.to_string())
                    .await
                {
                    tracing::warn!(action_key = %key, error = %e, "Failed to journal action failure");
                }
                Err(failure)
            }
        }
    }
}
