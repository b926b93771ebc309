//! Action execution and reconciliation.

mod execute_action;
mod reconcile_pending_actions;

pub use execute_action::DomainActionExecutor;
pub use reconcile_pending_actions::{ReconcileConfig, ReconcilePendingActions, ReconcileReport};
