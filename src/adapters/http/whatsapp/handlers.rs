//! HTTP handler for the WhatsApp webhook.
//!
//! The provider only distinguishes success from failure: `200 OK` once the
//! reply went out, `500` with an error body otherwise.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::adapters::twilio::TwilioInboundForm;
use crate::application::handlers::conversation::{
    HandleInboundMessageHandler, InboundMessageError, InboundOutcome,
};

#[derive(Clone)]
pub struct WhatsappAppState {
    pub inbound: Arc<HandleInboundMessageHandler>,
}

impl WhatsappAppState {
    pub fn new(inbound: Arc<HandleInboundMessageHandler>) -> Self {
        Self { inbound }
    }
}

#[derive(Debug, Serialize)]
struct WebhookErrorBody {
    error: String,
}

fn failure(message: impl Into<String>) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(WebhookErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// POST /api/webhooks/whatsapp
pub async fn receive_message(
    State(state): State<WhatsappAppState>,
    form: Result<Form<TwilioInboundForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Undecodable webhook payload");
            return failure("Invalid webhook payload");
        }
    };

    let inbound = match form.into_inbound() {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected webhook message");
            return failure(e.to_string());
        }
    };

    let identity = inbound.identity.clone();
    let message_id = inbound.message_id.clone();

    match state.inbound.handle(inbound).await {
        Ok(InboundOutcome::Processed { kind, .. }) => {
            tracing::debug!(identity = %identity, message_id = %message_id, kind = kind.as_str(), "Webhook processed");
            (StatusCode::OK, "OK").into_response()
        }
        Ok(InboundOutcome::Duplicate { .. }) | Ok(InboundOutcome::InFlight) => {
            (StatusCode::OK, "OK").into_response()
        }
        Err(InboundMessageError::Delivery(e)) => {
            tracing::error!(identity = %identity, message_id = %message_id, error = %e, transient = e.is_transient(), "Reply could not be delivered");
            failure("Failed to deliver reply")
        }
        Err(e) => {
            tracing::error!(identity = %identity, message_id = %message_id, error = %e, "Failed to process message");
            failure("Failed to process message")
        }
    }
}
