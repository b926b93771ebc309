//! Route configuration for manual prescription entry.

use axum::routing::post;
use axum::Router;

use super::handlers::{create_prescription, PrescriptionAppState};

/// Routes:
/// - `POST /api/clients/:clientId/prescription` - Create a prescription from the clinic form
pub fn prescription_router() -> Router<PrescriptionAppState> {
    Router::new().route("/api/clients/:client_id/prescription", post(create_prescription))
}
