//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Conversation Ports
//!
//! - `ConversationStore` - Versioned state, message dedup and stored replies
//! - `MessagingGateway` - Outbound chat replies
//!
//! ## Action Ports
//!
//! - `ActionExecutor` - Applies action commands idempotently
//! - `ActionJournal` - Completion record per action key
//! - `PrescriptionRepository` / `AppointmentRepository` - Clinic records

mod action_executor;
mod action_journal;
mod clinic_repositories;
mod conversation_store;
mod messaging_gateway;

pub use action_executor::ActionExecutor;
pub use action_journal::{ActionJournal, JournalEntry, JournalStatus};
pub use clinic_repositories::{AppointmentRepository, PrescriptionRepository};
pub use conversation_store::{ConversationStore, MessageClaim, SwapResult};
pub use messaging_gateway::{DeliveryError, MessagingGateway};
