//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `memory` - In-process storage and recording gateway
//! - `postgres` - PostgreSQL storage
//! - `twilio` - WhatsApp transport (webhook decoding and outbound sends)
//! - `http` - axum routers

pub mod http;
pub mod memory;
pub mod postgres;
pub mod twilio;
