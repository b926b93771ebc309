//! CreatePrescriptionHandler - Manual prescription entry.
//!
//! Alternate entry point into the same create-prescription action the chat
//! flow uses. Mandatory fields are checked before the executor is reached.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::clinic::{
    ActionCommand, ActionFailure, ActionKey, ActionOutcome, NewPrescription, Prescription,
    RecordSource,
};
use crate::domain::conversation::FlowContext;
use crate::domain::foundation::{ClientId, ValidationError};
use crate::ports::ActionExecutor;

/// Command to issue a prescription from the clinic form.
#[derive(Debug, Clone, Default)]
pub struct CreatePrescriptionCommand {
    pub client_id: String,
    pub medications: String,
    pub instructions: String,
    /// ISO date, `YYYY-MM-DD`.
    pub issue_date: String,
    pub doctor_name: String,
    pub doctor_crm: String,
}

#[derive(Debug, Error)]
pub enum CreatePrescriptionError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Prescription could not be created: {0}")]
    Action(#[from] ActionFailure),
}

pub struct CreatePrescriptionHandler {
    executor: Arc<dyn ActionExecutor>,
    /// Doctor identification used when the form leaves it blank.
    defaults: FlowContext,
}

impl CreatePrescriptionHandler {
    pub fn new(executor: Arc<dyn ActionExecutor>, defaults: FlowContext) -> Self {
        Self { executor, defaults }
    }

    pub async fn handle(
        &self,
        cmd: CreatePrescriptionCommand,
    ) -> Result<Prescription, CreatePrescriptionError> {
        let draft = self.validate(cmd)?;
        let key = ActionKey::manual();
        let command = ActionCommand::CreatePrescription(draft);

        match self.executor.execute(&key, &command).await {
            Ok(ActionOutcome::PrescriptionCreated(prescription)) => {
                tracing::info!(
                    prescription_id = %prescription.id,
                    client_id = %prescription.client_id,
                    "Prescription created from manual entry"
                );
                Ok(prescription)
            }
            Ok(other) => Err(ActionFailure::backend(format!(
                "unexpected outcome {:?} for create_prescription",
                other
            ))
            .into()),
            Err(failure) => {
                tracing::error!(action_key = %key, error = %failure, "Manual prescription failed");
                Err(failure.into())
            }
        }
    }

    fn validate(&self, cmd: CreatePrescriptionCommand) -> Result<NewPrescription, ValidationError> {
        let client_id = ClientId::new(cmd.client_id)?;

        let medications = cmd.medications.trim();
        if medications.is_empty() {
            return Err(ValidationError::empty_field("medications"));
        }

        let issue_date = cmd.issue_date.trim();
        if issue_date.is_empty() {
            return Err(ValidationError::empty_field("issueDate"));
        }
        let issue_date = NaiveDate::parse_from_str(issue_date, "%Y-%m-%d")
            .map_err(|_| ValidationError::invalid_format("issueDate", "expected YYYY-MM-DD"))?;

        Ok(NewPrescription {
            client_id,
            medications: medications.to_string(),
            instructions: cmd.instructions.trim().to_string(),
            issue_date,
            doctor_name: or_default(&cmd.doctor_name, &self.defaults.doctor_name),
            doctor_crm: or_default(&cmd.doctor_crm, &self.defaults.doctor_crm),
            source: RecordSource::Manual,
        })
    }
}

fn or_default(value: &str, default: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryActionJournal, InMemoryAppointmentRepository, InMemoryPrescriptionRepository,
    };
    use crate::application::handlers::action::DomainActionExecutor;

    fn setup() -> (Arc<InMemoryPrescriptionRepository>, CreatePrescriptionHandler) {
        let prescriptions = Arc::new(InMemoryPrescriptionRepository::new());
        let executor = Arc::new(DomainActionExecutor::new(
            Arc::new(InMemoryActionJournal::new()),
            prescriptions.clone(),
            Arc::new(InMemoryAppointmentRepository::new()),
        ));
        let handler = CreatePrescriptionHandler::new(
            executor,
            FlowContext {
                doctor_name: "Dra. Ana Souza".to_string(),
                doctor_crm: "CRM-SP 123456".to_string(),
            },
        );
        (prescriptions, handler)
    }

    fn command(medications: &str, issue_date: &str) -> CreatePrescriptionCommand {
        CreatePrescriptionCommand {
            client_id: "client-42".to_string(),
            medications: medications.to_string(),
            instructions: "Tomar após o almoço".to_string(),
            issue_date: issue_date.to_string(),
            doctor_name: "Dr. João Lima".to_string(),
            doctor_crm: "CRM-RJ 654321".to_string(),
        }
    }

    #[tokio::test]
    async fn creates_manual_prescription() {
        let (repo, handler) = setup();

        let prescription = handler
            .handle(command("Amoxicilina 500mg", "2024-06-01"))
            .await
            .unwrap();

        assert_eq!(prescription.source, RecordSource::Manual);
        assert_eq!(prescription.doctor_name, "Dr. João Lima");
        assert_eq!(prescription.client_id.as_str(), "client-42");
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn empty_medications_are_rejected_before_execution() {
        let (repo, handler) = setup();

        let result = handler.handle(command("", "2024-06-01")).await;

        match result {
            Err(CreatePrescriptionError::Validation(e)) => assert_eq!(e.field(), "medications"),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(repo.count().await, 0);
    }

    #[tokio::test]
    async fn empty_issue_date_is_rejected() {
        let (repo, handler) = setup();
        let result = handler.handle(command("Dipirona", "  ")).await;
        assert!(matches!(result, Err(CreatePrescriptionError::Validation(_))));
        assert_eq!(repo.count().await, 0);
    }

    #[tokio::test]
    async fn malformed_issue_date_is_rejected() {
        let (_, handler) = setup();
        let result = handler.handle(command("Dipirona", "2024-13-40")).await;
        match result {
            Err(CreatePrescriptionError::Validation(e)) => assert_eq!(e.field(), "issueDate"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn blank_doctor_fields_fall_back_to_clinic_defaults() {
        let (_, handler) = setup();
        let mut cmd = command("Dipirona", "2024-06-01");
        cmd.doctor_name = " ".to_string();
        cmd.doctor_crm = String::new();

        let prescription = handler.handle(cmd).await.unwrap();

        assert_eq!(prescription.doctor_name, "Dra. Ana Souza");
        assert_eq!(prescription.doctor_crm, "CRM-SP 123456");
    }

    #[tokio::test]
    async fn storage_failure_is_an_action_error() {
        let (repo, handler) = setup();
        repo.fail_writes(true);

        let result = handler.handle(command("Dipirona", "2024-06-01")).await;

        assert!(matches!(
            result,
            Err(CreatePrescriptionError::Action(ActionFailure::Backend(_)))
        ));
    }
}
