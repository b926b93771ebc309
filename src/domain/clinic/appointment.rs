//! Appointment record.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AppointmentId, ClientId, Timestamp, ValidationError};

/// Data required to book an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub client_id: ClientId,
    pub patient_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: String,
}

/// A booked appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub client_id: ClientId,
    pub patient_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: String,
    pub created_at: Timestamp,
}

impl Appointment {
    /// Books an appointment from a draft.
    pub fn schedule(draft: NewAppointment, created_at: Timestamp) -> Result<Self, ValidationError> {
        let patient_name = draft.patient_name.trim();
        if patient_name.is_empty() {
            return Err(ValidationError::empty_field("patientName"));
        }

        Ok(Self {
            id: AppointmentId::new(),
            client_id: draft.client_id,
            patient_name: patient_name.to_string(),
            date: draft.date,
            time: draft.time,
            reason: draft.reason.trim().to_string(),
            created_at,
        })
    }
}
