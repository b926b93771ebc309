//! In-memory adapters.
//!
//! Implement every storage port without external services. Used when
//! `database.backend = "memory"` and throughout the test suite.

mod action_journal;
mod clinic_repositories;
mod conversation_store;
mod recording_gateway;

pub use action_journal::InMemoryActionJournal;
pub use clinic_repositories::{InMemoryAppointmentRepository, InMemoryPrescriptionRepository};
pub use conversation_store::InMemoryConversationStore;
pub use recording_gateway::{LoggingGateway, RecordingGateway, SentMessage};
