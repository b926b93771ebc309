//! PostgreSQL implementation of ActionJournal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::clinic::{ActionCommand, ActionKey, ActionOutcome};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::{ActionJournal, JournalEntry, JournalStatus};

pub struct PostgresActionJournal {
    pool: PgPool,
}

impl PostgresActionJournal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct JournalRow {
    action_key: String,
    command: String,
    status: String,
    outcome: Option<Json<ActionOutcome>>,
    failure: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<JournalRow> for JournalEntry {
    type Error = DomainError;

    fn try_from(row: JournalRow) -> Result<Self, Self::Error> {
        let status = JournalStatus::parse(&row.status).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid journal status: {}", row.status),
            )
        })?;

        Ok(JournalEntry {
            key: ActionKey::from_string(row.action_key),
            command: row.command,
            status,
            outcome: row.outcome.map(|json| json.0),
            failure: row.failure,
            recorded_at: Timestamp::from_datetime(row.recorded_at),
        })
    }
}

#[async_trait]
impl ActionJournal for PostgresActionJournal {
    async fn find(&self, key: &ActionKey) -> Result<Option<JournalEntry>, DomainError> {
        let row: Option<JournalRow> = sqlx::query_as(
            r#"
            SELECT action_key, command, status, outcome, failure, recorded_at
            FROM action_journal
            WHERE action_key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to read action journal", e))?;

        row.map(JournalEntry::try_from).transpose()
    }

    async fn record_completed(
        &self,
        key: &ActionKey,
        command: &ActionCommand,
        outcome: &ActionOutcome,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO action_journal (action_key, command, status, outcome, failure, recorded_at)
            VALUES ($1, $2, 'completed', $3, NULL, $4)
            ON CONFLICT (action_key) DO UPDATE SET
                status = 'completed',
                outcome = EXCLUDED.outcome,
                failure = NULL,
                recorded_at = EXCLUDED.recorded_at
            WHERE action_journal.status <> 'completed'
            "#,
        )
        .bind(key.as_str())
        .bind(command.name())
        .bind(Json(outcome))
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to journal completed action", e))?;
        Ok(())
    }

    async fn record_failed(
        &self,
        key: &ActionKey,
        command: &ActionCommand,
        reason: &str,
    ) -> Result<(), DomainError> {
        // A completed entry is never downgraded.
        sqlx::query(
            r#"
            INSERT INTO action_journal (action_key, command, status, outcome, failure, recorded_at)
            VALUES ($1, $2, 'failed', NULL, $3, $4)
            ON CONFLICT (action_key) DO UPDATE SET
                failure = EXCLUDED.failure,
                recorded_at = EXCLUDED.recorded_at
            WHERE action_journal.status = 'failed'
            "#,
        )
        .bind(key.as_str())
        .bind(command.name())
        .bind(reason)
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to journal action failure", e))?;
        Ok(())
    }
}
