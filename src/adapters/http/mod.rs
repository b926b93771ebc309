//! HTTP adapters - REST API implementations.
//!
//! Each entry point has its own module with state, handlers and routes.
//! [`api_router`] merges them with the health probe and the shared
//! tracing and CORS layers.

pub mod prescription;
pub mod whatsapp;

pub use prescription::{prescription_router, PrescriptionAppState};
pub use whatsapp::{whatsapp_router, WhatsappAppState};

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

/// Full application router.
///
/// Routes:
/// - `GET /health` - Liveness probe
/// - `POST /api/webhooks/whatsapp` - Inbound chat messages
/// - `POST /api/clients/:clientId/prescription` - Manual prescription entry
pub fn api_router(
    whatsapp: WhatsappAppState,
    prescription: PrescriptionAppState,
    cors_origins: &[String],
    request_timeout: Duration,
) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(whatsapp_router().with_state(whatsapp))
        .merge(prescription_router().with_state(prescription))
        .layer(cors_layer(cors_origins))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}
