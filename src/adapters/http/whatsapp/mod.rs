//! HTTP adapter for the WhatsApp webhook.
//!
//! - `POST /api/webhooks/whatsapp` - Inbound chat messages

mod handlers;
mod routes;

pub use handlers::{receive_message, WhatsappAppState};
pub use routes::whatsapp_router;
