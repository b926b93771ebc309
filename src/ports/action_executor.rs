//! ActionExecutor port - Applies action commands against domain services.

use async_trait::async_trait;

use crate::domain::clinic::{ActionCommand, ActionFailure, ActionKey, ActionOutcome};

/// Executes side effects requested by the flow engine or the manual-entry form.
///
/// Implementations must be idempotent per `key`: executing a key that already
/// completed returns the recorded outcome without repeating the side effect.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(
        &self,
        key: &ActionKey,
        command: &ActionCommand,
    ) -> Result<ActionOutcome, ActionFailure>;
}
