//! ReconcilePendingActions - Background sweep for committed but unexecuted actions.
//!
//! A conversation that reached `TERMINAL_SUCCESS` has committed to its
//! commands, but the process may have crashed before executing them. The
//! sweep finds such states, rebuilds their commands from the stored slots
//! and executes whatever the journal does not mark as completed.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 60s | Time between sweeps |
//! | `grace` | 30s | Minimum state age, leaves room for the inline executor |
//! | `batch_size` | 50 | Max states examined per sweep |
//!
//! ## Graceful Shutdown
//!
//! The sweep listens on a `watch` channel and runs one final pass before stopping.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::domain::clinic::ActionKey;
use crate::domain::conversation::{commands_for, ConversationState, FlowContext};
use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{ActionExecutor, ActionJournal, ConversationStore, SwapResult};

/// Reconciliation sweep settings.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    pub interval: Duration,
    pub grace: Duration,
    pub batch_size: u32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            grace: Duration::from_secs(30),
            batch_size: 50,
        }
    }
}

/// Counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub examined: usize,
    pub already_completed: usize,
    pub executed: usize,
    pub failed: usize,
}

pub struct ReconcilePendingActions {
    store: Arc<dyn ConversationStore>,
    journal: Arc<dyn ActionJournal>,
    executor: Arc<dyn ActionExecutor>,
    flow: FlowContext,
    config: ReconcileConfig,
}

impl ReconcilePendingActions {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        journal: Arc<dyn ActionJournal>,
        executor: Arc<dyn ActionExecutor>,
        flow: FlowContext,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            store,
            journal,
            executor,
            flow,
            config,
        }
    }

    /// Runs sweeps until `shutdown` turns true, then runs one last pass.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.interval);
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            batch_size = self.config.batch_size,
            "Reconciliation sweep started"
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        self.sweep_logged().await;
                        tracing::info!("Reconciliation sweep stopped");
                        return;
                    }
                }
                _ = interval.tick() => {
                    self.sweep_logged().await;
                }
            }
        }
    }

    async fn sweep_logged(&self) {
        match self.run_once().await {
            Ok(report) if report.executed > 0 || report.failed > 0 => {
                tracing::info!(
                    examined = report.examined,
                    executed = report.executed,
                    failed = report.failed,
                    "Reconciled pending actions"
                );
            }
            Ok(_) => {}
            // Transient store errors must not stop the worker.
            Err(e) => tracing::error!(error = %e, "Reconciliation sweep failed"),
        }
    }

    /// Runs a single sweep.
    pub async fn run_once(&self) -> Result<ReconcileReport, DomainError> {
        let grace_secs = self.config.grace.as_secs();
        let cutoff = Timestamp::now().minus_secs(grace_secs);
        let pending = self
            .store
            .find_awaiting_action(cutoff, self.config.batch_size)
            .await?;

        let mut report = ReconcileReport::default();
        for state in pending {
            report.examined += 1;
            self.reconcile(&state, &mut report).await?;
        }
        Ok(report)
    }

    async fn reconcile(
        &self,
        state: &ConversationState,
        report: &mut ReconcileReport,
    ) -> Result<(), DomainError> {
        let commands = match commands_for(state, &self.flow) {
            Ok(commands) => commands,
            Err(e) => {
                tracing::error!(identity = %state.identity, version = state.version, error = %e, "Cannot rebuild commands from stored slots");
                report.failed += 1;
                return self.mark_failed(state).await;
            }
        };

        let mut executed_any = false;
        for (index, command) in commands.iter().enumerate() {
            let key = ActionKey::for_transition(&state.identity, state.version, index);
            if self.journal.is_completed(&key).await? {
                continue;
            }

            match self.executor.execute(&key, command).await {
                Ok(_) => executed_any = true,
                Err(failure) => {
                    tracing::error!(action_key = %key, error = %failure, "Reconciled action failed");
                    report.failed += 1;
                    return self.mark_failed(state).await;
                }
            }
        }

        if executed_any {
            report.executed += 1;
        } else {
            report.already_completed += 1;
        }
        Ok(())
    }

    async fn mark_failed(&self, state: &ConversationState) -> Result<(), DomainError> {
        let failed = state.fail(Timestamp::now())?;
        match self
            .store
            .compare_and_swap(&state.identity, state.version, &failed)
            .await?
        {
            SwapResult::Swapped => {}
            SwapResult::Conflict { current_version } => {
                tracing::debug!(identity = %state.identity, current_version, "Conversation moved on before failure was recorded");
            }
        }
        Ok(())
    }
}
