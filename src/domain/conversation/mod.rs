//! Conversation domain module.
//!
//! Per-identity conversation state and the pure flow engine that moves it
//! forward one inbound message at a time.

mod engine;
mod identity;
mod intent;
mod keywords;
mod message;
mod prompts;
mod state;
mod validators;

#[cfg(test)]
mod proptests;

pub use engine::{commands_for, prompt_for, transition, FlowContext, Transition, TransitionKind};
pub use identity::Identity;
pub use intent::{Intent, Slot};
pub use keywords::{fold, match_intent};
pub use message::{InboundMessage, OutboundReply};
pub use prompts::action_failed as action_failed_reply;
pub use state::{ConversationState, FlowStep, StepKind};
pub use validators::{parse_date, parse_time};
