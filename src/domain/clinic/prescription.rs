//! Prescription record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClientId, PrescriptionId, Timestamp, ValidationError};

/// Where a clinic record was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// Collected by the chat flow.
    Chat,
    /// Submitted through the manual-entry form.
    Manual,
}

impl RecordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSource::Chat => "chat",
            RecordSource::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "chat" => Some(RecordSource::Chat),
            "manual" => Some(RecordSource::Manual),
            _ => None,
        }
    }
}

/// Data required to issue a prescription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrescription {
    pub client_id: ClientId,
    pub medications: String,
    pub instructions: String,
    pub issue_date: NaiveDate,
    pub doctor_name: String,
    pub doctor_crm: String,
    pub source: RecordSource,
}

/// A persisted prescription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: PrescriptionId,
    pub client_id: ClientId,
    pub medications: String,
    pub instructions: String,
    pub issue_date: NaiveDate,
    pub doctor_name: String,
    pub doctor_crm: String,
    pub source: RecordSource,
    pub created_at: Timestamp,
}

impl Prescription {
    /// Issues a new prescription from a draft.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyField` if no medication is listed.
    pub fn issue(draft: NewPrescription, created_at: Timestamp) -> Result<Self, ValidationError> {
        let medications = draft.medications.trim();
        if medications.is_empty() {
            return Err(ValidationError::empty_field("medications"));
        }

        Ok(Self {
            id: PrescriptionId::new(),
            client_id: draft.client_id,
            medications: medications.to_string(),
            instructions: draft.instructions.trim().to_string(),
            issue_date: draft.issue_date,
            doctor_name: draft.doctor_name.trim().to_string(),
            doctor_crm: draft.doctor_crm.trim().to_string(),
            source: draft.source,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(medications: &str) -> NewPrescription {
        NewPrescription {
            client_id: ClientId::new("+551199999999").unwrap(),
            medications: medications.to_string(),
            instructions: "  Tomar após as refeições ".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            doctor_name: "Dra. Ana Souza".to_string(),
            doctor_crm: "CRM-SP 123456".to_string(),
            source: RecordSource::Chat,
        }
    }

    #[test]
    fn issue_trims_text_fields() {
        let p = Prescription::issue(draft(" Dipirona 500mg "), Timestamp::now()).unwrap();
        assert_eq!(p.medications, "Dipirona 500mg");
        assert_eq!(p.instructions, "Tomar após as refeições");
        assert_eq!(p.source, RecordSource::Chat);
    }

    #[test]
    fn issue_rejects_blank_medications() {
        let result = Prescription::issue(draft("   "), Timestamp::now());
        assert_eq!(result, Err(ValidationError::empty_field("medications")));
    }

    #[test]
    fn prescription_serializes_camel_case() {
        let p = Prescription::issue(draft("Dipirona"), Timestamp::now()).unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["issueDate"], "2024-06-01");
        assert_eq!(json["doctorCrm"], "CRM-SP 123456");
        assert_eq!(json["clientId"], "+551199999999");
        assert_eq!(json["source"], "chat");
    }

    #[test]
    fn record_source_round_trips_through_str() {
        for source in [RecordSource::Chat, RecordSource::Manual] {
            assert_eq!(RecordSource::parse(source.as_str()), Some(source));
        }
        assert_eq!(RecordSource::parse("fax"), None);
    }
}
