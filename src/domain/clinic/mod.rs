//! Clinic domain module.
//!
//! Records the assistant creates (prescriptions, appointments) and the
//! typed commands that request their creation.

mod appointment;
mod command;
mod prescription;

pub use appointment::{Appointment, NewAppointment};
pub use command::{ActionCommand, ActionFailure, ActionKey, ActionOutcome};
pub use prescription::{NewPrescription, Prescription, RecordSource};
