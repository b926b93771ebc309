//! Application handlers.
//!
//! Command handlers that orchestrate domain operations.

pub mod action;
pub mod conversation;
pub mod prescription;

pub use action::{DomainActionExecutor, ReconcileConfig, ReconcilePendingActions, ReconcileReport};
pub use conversation::{
    DuplicatePolicy, HandleInboundMessageHandler, InboundMessageError, InboundOutcome,
};
pub use prescription::{CreatePrescriptionCommand, CreatePrescriptionError, CreatePrescriptionHandler};
