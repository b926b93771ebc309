//! Application layer - Command handlers and background workers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::{
    // Conversation handlers
    DuplicatePolicy, HandleInboundMessageHandler, InboundMessageError, InboundOutcome,
    // Action handlers
    DomainActionExecutor, ReconcileConfig, ReconcilePendingActions, ReconcileReport,
    // Prescription handlers
    CreatePrescriptionCommand, CreatePrescriptionError, CreatePrescriptionHandler,
};
