//! HTTP adapter for manual prescription entry.
//!
//! - `POST /api/clients/:clientId/prescription` - Create a prescription

pub mod dto;
mod handlers;
mod routes;

pub use dto::{CreatePrescriptionRequest, CreatePrescriptionResponse, ErrorResponse, PrescriptionResponse};
pub use handlers::{create_prescription, PrescriptionAppState, PrescriptionApiError};
pub use routes::prescription_router;
