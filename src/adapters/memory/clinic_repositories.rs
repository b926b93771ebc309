//! In-memory prescription and appointment repositories.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::clinic::{Appointment, Prescription};
use crate::domain::foundation::{
    AppointmentId, ClientId, DomainError, ErrorCode, PrescriptionId,
};
use crate::ports::{AppointmentRepository, PrescriptionRepository};

/// Prescriptions kept in process memory.
///
/// `fail_writes(true)` makes every save fail, for exercising action failures.
#[derive(Default)]
pub struct InMemoryPrescriptionRepository {
    records: RwLock<HashMap<PrescriptionId, Prescription>>,
    fail_writes: AtomicBool,
}

impl InMemoryPrescriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl PrescriptionRepository for InMemoryPrescriptionRepository {
    async fn save(&self, prescription: &Prescription) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Prescription storage unavailable",
            ));
        }
        self.records
            .write()
            .await
            .insert(prescription.id, prescription.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PrescriptionId) -> Result<Option<Prescription>, DomainError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_by_client(&self, client_id: &ClientId) -> Result<Vec<Prescription>, DomainError> {
        let mut found: Vec<Prescription> = self
            .records
            .read()
            .await
            .values()
            .filter(|p| &p.client_id == client_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

/// Appointments kept in process memory.
#[derive(Default)]
pub struct InMemoryAppointmentRepository {
    records: RwLock<HashMap<AppointmentId, Appointment>>,
    fail_writes: AtomicBool,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn save(&self, appointment: &Appointment) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Appointment storage unavailable",
            ));
        }
        self.records
            .write()
            .await
            .insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &AppointmentId) -> Result<Option<Appointment>, DomainError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn find_by_client(&self, client_id: &ClientId) -> Result<Vec<Appointment>, DomainError> {
        let mut found: Vec<Appointment> = self
            .records
            .read()
            .await
            .values()
            .filter(|a| &a.client_id == client_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| (a.date, a.time));
        Ok(found)
    }
}
