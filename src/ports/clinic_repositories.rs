//! Repository ports for clinic records.

use async_trait::async_trait;

use crate::domain::clinic::{Appointment, Prescription};
use crate::domain::foundation::{AppointmentId, ClientId, DomainError, PrescriptionId};

/// Port for prescription persistence.
#[async_trait]
pub trait PrescriptionRepository: Send + Sync {
    async fn save(&self, prescription: &Prescription) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &PrescriptionId) -> Result<Option<Prescription>, DomainError>;

    /// Prescriptions of a client, newest first.
    async fn find_by_client(&self, client_id: &ClientId) -> Result<Vec<Prescription>, DomainError>;
}

/// Port for appointment persistence.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn save(&self, appointment: &Appointment) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &AppointmentId) -> Result<Option<Appointment>, DomainError>;

    /// Appointments of a client, soonest first.
    async fn find_by_client(&self, client_id: &ClientId) -> Result<Vec<Appointment>, DomainError>;
}
