//! PostgreSQL adapters - Database implementations for storage ports.
//!
//! - `PostgresConversationStore` - conversation state, dedup claims, replies
//! - `PostgresActionJournal` - idempotency journal for action commands
//! - `PostgresPrescriptionRepository` / `PostgresAppointmentRepository` - clinic records

mod action_journal;
mod clinic_repositories;
mod conversation_store;

pub use action_journal::PostgresActionJournal;
pub use clinic_repositories::{PostgresAppointmentRepository, PostgresPrescriptionRepository};
pub use conversation_store::PostgresConversationStore;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::domain::foundation::DomainError;

/// Connection pool handle shared by the postgres adapters.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Opens the pool and applies pending migrations when configured to.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .max_lifetime(config.max_lifetime())
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::database("Failed to connect to PostgreSQL", e))?;

        if config.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| DomainError::database("Failed to run migrations", e))?;
            tracing::info!("Database migrations applied");
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
