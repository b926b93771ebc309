//! Twilio adapter - WhatsApp transport.
//!
//! - `TwilioInboundForm` decodes webhook posts into `InboundMessage`
//! - `TwilioGateway` implements `MessagingGateway` over the REST API

mod twilio_gateway;
mod webhook_types;

pub use twilio_gateway::{TwilioConfig, TwilioGateway};
pub use webhook_types::{TwilioApiError, TwilioInboundForm, WebhookDecodeError};
