//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (ids, timestamps, errors)
//! - `conversation` - Per-identity conversation state and the pure flow engine
//! - `clinic` - Clinic records (prescriptions, appointments) and the typed
//!   action commands the flow engine asks to have executed

pub mod clinic;
pub mod conversation;
pub mod foundation;
