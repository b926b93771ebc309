//! Prescription command handlers.

mod create_prescription;

pub use create_prescription::{
    CreatePrescriptionCommand, CreatePrescriptionError, CreatePrescriptionHandler,
};
