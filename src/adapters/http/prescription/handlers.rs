//! HTTP handlers for manual prescription entry.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::handlers::prescription::{
    CreatePrescriptionCommand, CreatePrescriptionError, CreatePrescriptionHandler,
};
use crate::domain::clinic::ActionFailure;

use super::dto::{CreatePrescriptionRequest, CreatePrescriptionResponse, ErrorResponse};

#[derive(Clone)]
pub struct PrescriptionAppState {
    pub create_prescription: Arc<CreatePrescriptionHandler>,
}

impl PrescriptionAppState {
    pub fn new(create_prescription: Arc<CreatePrescriptionHandler>) -> Self {
        Self {
            create_prescription,
        }
    }
}

/// POST /api/clients/:clientId/prescription
pub async fn create_prescription(
    State(state): State<PrescriptionAppState>,
    Path(client_id): Path<String>,
    request: Result<Json<CreatePrescriptionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, PrescriptionApiError> {
    let Json(request) = request.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Undecodable prescription request");
        PrescriptionApiError::MalformedBody(rejection.body_text())
    })?;

    let cmd = CreatePrescriptionCommand {
        client_id,
        medications: request.medications,
        instructions: request.instructions,
        issue_date: request.issue_date,
        doctor_name: request.doctor_name,
        doctor_crm: request.doctor_crm,
    };

    let prescription = state.create_prescription.handle(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePrescriptionResponse {
            prescription: prescription.into(),
        }),
    ))
}

/// Maps request and handler errors onto `{error}` responses.
pub enum PrescriptionApiError {
    MalformedBody(String),
    Handler(CreatePrescriptionError),
}

impl From<CreatePrescriptionError> for PrescriptionApiError {
    fn from(err: CreatePrescriptionError) -> Self {
        Self::Handler(err)
    }
}

impl IntoResponse for PrescriptionApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            PrescriptionApiError::MalformedBody(detail) => {
                (StatusCode::BAD_REQUEST, format!("Invalid request body: {}", detail))
            }
            PrescriptionApiError::Handler(CreatePrescriptionError::Validation(e))
            | PrescriptionApiError::Handler(CreatePrescriptionError::Action(
                ActionFailure::Rejected(e),
            )) => (StatusCode::BAD_REQUEST, e.to_string()),
            PrescriptionApiError::Handler(CreatePrescriptionError::Action(
                ActionFailure::Backend(detail),
            )) => {
                tracing::error!(error = %detail, "Prescription creation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create prescription".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
