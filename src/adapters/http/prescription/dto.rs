//! HTTP DTOs for the manual prescription endpoint.

use serde::{Deserialize, Serialize};

use crate::domain::clinic::Prescription;

/// Body of `POST /api/clients/:clientId/prescription`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePrescriptionRequest {
    pub medications: String,
    pub instructions: String,
    /// ISO date, `YYYY-MM-DD`.
    pub issue_date: String,
    pub doctor_name: String,
    pub doctor_crm: String,
}

/// Created prescription.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionResponse {
    pub id: String,
    pub client_id: String,
    pub medications: String,
    pub instructions: String,
    pub issue_date: String,
    pub doctor_name: String,
    pub doctor_crm: String,
    pub source: String,
    pub created_at: String,
}

impl From<Prescription> for PrescriptionResponse {
    fn from(p: Prescription) -> Self {
        Self {
            id: p.id.to_string(),
            client_id: p.client_id.to_string(),
            medications: p.medications,
            instructions: p.instructions,
            issue_date: p.issue_date.format("%Y-%m-%d").to_string(),
            doctor_name: p.doctor_name,
            doctor_crm: p.doctor_crm,
            source: p.source.as_str().to_string(),
            created_at: p.created_at.as_datetime().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePrescriptionResponse {
    pub prescription: PrescriptionResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_reads_camel_case_and_tolerates_missing_fields() {
        let req: CreatePrescriptionRequest = serde_json::from_value(json!({
            "medications": "Amoxicilina 500mg",
            "issueDate": "2024-06-01",
            "doctorCrm": "CRM-SP 1"
        }))
        .unwrap();

        assert_eq!(req.medications, "Amoxicilina 500mg");
        assert_eq!(req.issue_date, "2024-06-01");
        assert_eq!(req.doctor_crm, "CRM-SP 1");
        assert!(req.instructions.is_empty());
        assert!(req.doctor_name.is_empty());
    }
}
