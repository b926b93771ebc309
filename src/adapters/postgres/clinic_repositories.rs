//! PostgreSQL implementations of PrescriptionRepository and AppointmentRepository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::clinic::{Appointment, Prescription, RecordSource};
use crate::domain::foundation::{
    AppointmentId, ClientId, DomainError, ErrorCode, PrescriptionId, Timestamp,
};
use crate::ports::{AppointmentRepository, PrescriptionRepository};

pub struct PostgresPrescriptionRepository {
    pool: PgPool,
}

impl PostgresPrescriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PrescriptionRow {
    id: Uuid,
    client_id: String,
    medications: String,
    instructions: String,
    issue_date: NaiveDate,
    doctor_name: String,
    doctor_crm: String,
    source: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PrescriptionRow> for Prescription {
    type Error = DomainError;

    fn try_from(row: PrescriptionRow) -> Result<Self, Self::Error> {
        let source = RecordSource::parse(&row.source).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid record source: {}", row.source),
            )
        })?;

        Ok(Prescription {
            id: PrescriptionId::from_uuid(row.id),
            client_id: ClientId::new(row.client_id)?,
            medications: row.medications,
            instructions: row.instructions,
            issue_date: row.issue_date,
            doctor_name: row.doctor_name,
            doctor_crm: row.doctor_crm,
            source,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

const PRESCRIPTION_COLUMNS: &str = "id, client_id, medications, instructions, issue_date, \
     doctor_name, doctor_crm, source, created_at";

#[async_trait]
impl PrescriptionRepository for PostgresPrescriptionRepository {
    async fn save(&self, prescription: &Prescription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO prescriptions (
                id, client_id, medications, instructions, issue_date,
                doctor_name, doctor_crm, source, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(prescription.id.as_uuid())
        .bind(prescription.client_id.as_str())
        .bind(&prescription.medications)
        .bind(&prescription.instructions)
        .bind(prescription.issue_date)
        .bind(&prescription.doctor_name)
        .bind(&prescription.doctor_crm)
        .bind(prescription.source.as_str())
        .bind(prescription.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to save prescription", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &PrescriptionId) -> Result<Option<Prescription>, DomainError> {
        let row: Option<PrescriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM prescriptions WHERE id = $1",
            PRESCRIPTION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to load prescription", e))?;

        row.map(Prescription::try_from).transpose()
    }

    async fn find_by_client(&self, client_id: &ClientId) -> Result<Vec<Prescription>, DomainError> {
        let rows: Vec<PrescriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM prescriptions WHERE client_id = $1 ORDER BY created_at ASC",
            PRESCRIPTION_COLUMNS
        ))
        .bind(client_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list prescriptions", e))?;

        rows.into_iter().map(Prescription::try_from).collect()
    }
}

pub struct PostgresAppointmentRepository {
    pool: PgPool,
}

impl PostgresAppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: Uuid,
    client_id: String,
    patient_name: String,
    date: NaiveDate,
    time: NaiveTime,
    reason: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DomainError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Appointment {
            id: AppointmentId::from_uuid(row.id),
            client_id: ClientId::new(row.client_id)?,
            patient_name: row.patient_name,
            date: row.date,
            time: row.time,
            reason: row.reason,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl AppointmentRepository for PostgresAppointmentRepository {
    async fn save(&self, appointment: &Appointment) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO appointments (id, client_id, patient_name, date, time, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(appointment.id.as_uuid())
        .bind(appointment.client_id.as_str())
        .bind(&appointment.patient_name)
        .bind(appointment.date)
        .bind(appointment.time)
        .bind(&appointment.reason)
        .bind(appointment.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to save appointment", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &AppointmentId) -> Result<Option<Appointment>, DomainError> {
        let row: Option<AppointmentRow> = sqlx::query_as(
            r#"
            SELECT id, client_id, patient_name, date, time, reason, created_at
            FROM appointments
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to load appointment", e))?;

        row.map(Appointment::try_from).transpose()
    }

    async fn find_by_client(&self, client_id: &ClientId) -> Result<Vec<Appointment>, DomainError> {
        let rows: Vec<AppointmentRow> = sqlx::query_as(
            r#"
            SELECT id, client_id, patient_name, date, time, reason, created_at
            FROM appointments
            WHERE client_id = $1
            ORDER BY date ASC, time ASC
            "#,
        )
        .bind(client_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list appointments", e))?;

        rows.into_iter().map(Appointment::try_from).collect()
    }
}
