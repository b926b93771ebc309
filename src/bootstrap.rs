//! Wiring - builds adapters and handlers from configuration.
//!
//! `database.backend` picks the storage adapters, `messaging.enabled` picks
//! between the provider gateway and the logging gateway.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::adapters::http::{api_router, PrescriptionAppState, WhatsappAppState};
use crate::adapters::memory::{
    InMemoryActionJournal, InMemoryAppointmentRepository, InMemoryConversationStore,
    InMemoryPrescriptionRepository, LoggingGateway,
};
use crate::adapters::postgres::{
    Database, PostgresActionJournal, PostgresAppointmentRepository, PostgresConversationStore,
    PostgresPrescriptionRepository,
};
use crate::adapters::twilio::{TwilioConfig, TwilioGateway};
use crate::application::handlers::action::{
    DomainActionExecutor, ReconcileConfig, ReconcilePendingActions,
};
use crate::application::handlers::conversation::{DuplicatePolicy, HandleInboundMessageHandler};
use crate::application::handlers::prescription::CreatePrescriptionHandler;
use crate::config::{AppConfig, ClinicConfig, DatabaseBackend};
use crate::domain::conversation::FlowContext;
use crate::domain::foundation::DomainError;
use crate::ports::{
    ActionJournal, AppointmentRepository, ConversationStore, DeliveryError, MessagingGateway,
    PrescriptionRepository,
};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Storage setup failed: {0}")]
    Storage(#[from] DomainError),

    #[error("Messaging setup failed: {0}")]
    Messaging(#[from] DeliveryError),
}

/// Storage ports for one backend.
struct Storage {
    store: Arc<dyn ConversationStore>,
    journal: Arc<dyn ActionJournal>,
    prescriptions: Arc<dyn PrescriptionRepository>,
    appointments: Arc<dyn AppointmentRepository>,
    database: Option<Database>,
}

impl Storage {
    fn memory() -> Self {
        let journal: Arc<dyn ActionJournal> = Arc::new(InMemoryActionJournal::new());
        Self {
            store: Arc::new(InMemoryConversationStore::with_journal(journal.clone())),
            journal,
            prescriptions: Arc::new(InMemoryPrescriptionRepository::new()),
            appointments: Arc::new(InMemoryAppointmentRepository::new()),
            database: None,
        }
    }

    fn postgres(database: Database) -> Self {
        let pool = database.pool();
        Self {
            store: Arc::new(PostgresConversationStore::new(pool.clone())),
            journal: Arc::new(PostgresActionJournal::new(pool.clone())),
            prescriptions: Arc::new(PostgresPrescriptionRepository::new(pool.clone())),
            appointments: Arc::new(PostgresAppointmentRepository::new(pool)),
            database: Some(database),
        }
    }
}

pub fn flow_context(clinic: &ClinicConfig) -> FlowContext {
    FlowContext {
        doctor_name: clinic.doctor_name.trim().to_string(),
        doctor_crm: clinic.doctor_crm.trim().to_string(),
    }
}

pub fn reconcile_config(clinic: &ClinicConfig) -> ReconcileConfig {
    ReconcileConfig {
        interval: clinic.reconcile_interval(),
        grace: clinic.reconcile_grace(),
        batch_size: clinic.reconcile_batch_size,
    }
}

pub fn duplicate_policy(clinic: &ClinicConfig) -> DuplicatePolicy {
    DuplicatePolicy {
        wait: clinic.duplicate_wait(),
        stale_after: clinic.stale_claim(),
        ..DuplicatePolicy::default()
    }
}

/// Everything the binary runs.
pub struct AppContext {
    pub inbound: Arc<HandleInboundMessageHandler>,
    pub create_prescription: Arc<CreatePrescriptionHandler>,
    pub reconciler: Arc<ReconcilePendingActions>,
    cors_origins: Vec<String>,
    request_timeout: Duration,
    database: Option<Database>,
}

impl AppContext {
    pub async fn init(config: &AppConfig) -> Result<Self, BootstrapError> {
        let storage = match config.database.backend {
            DatabaseBackend::Memory => {
                tracing::warn!("Using in-memory storage, state is lost on restart");
                Storage::memory()
            }
            DatabaseBackend::Postgres => {
                let database = Database::connect(&config.database).await?;
                tracing::info!(
                    max_connections = config.database.max_connections,
                    "Connected to PostgreSQL"
                );
                Storage::postgres(database)
            }
        };

        let gateway: Arc<dyn MessagingGateway> = if config.messaging.enabled {
            Arc::new(TwilioGateway::new(TwilioConfig::from_messaging(
                &config.messaging,
            ))?)
        } else {
            tracing::warn!("Outbound messaging disabled, replies are only logged");
            Arc::new(LoggingGateway)
        };

        let flow = flow_context(&config.clinic);
        let executor = Arc::new(DomainActionExecutor::new(
            storage.journal.clone(),
            storage.prescriptions.clone(),
            storage.appointments.clone(),
        ));

        let inbound = Arc::new(HandleInboundMessageHandler::new(
            storage.store.clone(),
            executor.clone(),
            gateway,
            flow.clone(),
            config.clinic.max_conflict_retries,
        )
        .with_duplicate_policy(duplicate_policy(&config.clinic)));
        let create_prescription = Arc::new(CreatePrescriptionHandler::new(
            executor.clone(),
            flow.clone(),
        ));
        let reconciler = Arc::new(ReconcilePendingActions::new(
            storage.store,
            storage.journal,
            executor,
            flow,
            reconcile_config(&config.clinic),
        ));

        Ok(Self {
            inbound,
            create_prescription,
            reconciler,
            cors_origins: config.server.allowed_origins(),
            request_timeout: config.server.request_timeout(),
            database: storage.database,
        })
    }

    pub fn router(&self) -> axum::Router {
        api_router(
            WhatsappAppState::new(self.inbound.clone()),
            PrescriptionAppState::new(self.create_prescription.clone()),
            &self.cors_origins,
            self.request_timeout,
        )
    }

    /// Starts the reconciliation sweep; it stops once `shutdown` turns true.
    pub fn spawn_reconciler(&self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let reconciler = self.reconciler.clone();
        tokio::spawn(async move { reconciler.run(shutdown).await })
    }

    pub async fn shutdown(&self) {
        if let Some(database) = &self.database {
            database.close().await;
            tracing::info!("Database pool closed");
        }
    }
}
