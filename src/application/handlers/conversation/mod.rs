//! Conversation command handlers.
//!
//! Runs inbound chat messages through the flow engine.

mod handle_inbound_message;

pub use handle_inbound_message::{
    DuplicatePolicy, HandleInboundMessageHandler, InboundMessageError, InboundOutcome,
};
