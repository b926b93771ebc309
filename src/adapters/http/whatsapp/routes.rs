//! Route configuration for the WhatsApp webhook.

use axum::routing::post;
use axum::Router;

use super::handlers::{receive_message, WhatsappAppState};

/// Routes:
/// - `POST /api/webhooks/whatsapp` - Inbound chat messages (form-encoded)
pub fn whatsapp_router() -> Router<WhatsappAppState> {
    Router::new().route("/api/webhooks/whatsapp", post(receive_message))
}
