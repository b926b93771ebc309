//! PostgreSQL implementation of ConversationStore.
//!
//! Conversation state lives in `conversation_states`, one row per identity.
//! Writes are guarded by the `version` column: an update only applies when
//! the stored version still matches the one the caller read.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::conversation::{ConversationState, FlowStep, Identity, Intent};
use crate::domain::foundation::{DomainError, ErrorCode, ProviderMessageId, Timestamp};
use crate::ports::{ConversationStore, MessageClaim, SwapResult};

/// PostgreSQL-backed conversation store.
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_version(&self, identity: &Identity) -> Result<u64, DomainError> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM conversation_states WHERE identity = $1")
                .bind(identity.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database("Failed to read conversation version", e))?;
        Ok(version.map(to_version).unwrap_or(0))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ConversationRow {
    identity: String,
    step: String,
    intent: Option<String>,
    slots: Json<BTreeMap<String, String>>,
    version: i64,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ClaimRow {
    reply: Option<String>,
    claimed_at: DateTime<Utc>,
}

impl TryFrom<ConversationRow> for ConversationState {
    type Error = DomainError;

    fn try_from(row: ConversationRow) -> Result<Self, Self::Error> {
        let identity = Identity::parse(&row.identity)?;
        let intent = match row.intent.as_deref() {
            Some(raw) => Some(Intent::parse(raw).ok_or_else(|| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid intent value: {}", raw),
                )
            })?),
            None => None,
        };
        let step = FlowStep::from_parts(&row.step, intent)?;

        Ok(ConversationState {
            identity,
            step,
            slots: row.slots.0,
            updated_at: Timestamp::from_datetime(row.updated_at),
            version: to_version(row.version),
        })
    }
}

fn to_version(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or(0)
}

fn to_db_version(version: u64) -> Result<i64, DomainError> {
    i64::try_from(version).map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Version {} exceeds storage range", version),
        )
    })
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn load(&self, identity: &Identity) -> Result<ConversationState, DomainError> {
        let row: Option<ConversationRow> = sqlx::query_as(
            r#"
            SELECT identity, step, intent, slots, version, updated_at
            FROM conversation_states
            WHERE identity = $1
            "#,
        )
        .bind(identity.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to load conversation", e))?;

        match row {
            Some(row) => row.try_into(),
            None => Ok(ConversationState::initial(identity.clone(), Timestamp::now())),
        }
    }

    async fn compare_and_swap(
        &self,
        identity: &Identity,
        expected_version: u64,
        new_state: &ConversationState,
    ) -> Result<SwapResult, DomainError> {
        if &new_state.identity != identity {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "State identity does not match the target identity",
            ));
        }

        let step = new_state.step.tag();
        let intent = new_state.step.intent().map(|i| i.as_str());
        let slots = Json(&new_state.slots);
        let version = to_db_version(new_state.version)?;

        let result = if expected_version == 0 {
            sqlx::query(
                r#"
                INSERT INTO conversation_states (identity, step, intent, slots, version, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (identity) DO NOTHING
                "#,
            )
            .bind(identity.as_str())
            .bind(&step)
            .bind(intent)
            .bind(slots)
            .bind(version)
            .bind(new_state.updated_at.as_datetime())
            .execute(&self.pool)
            .await
        } else {
            sqlx::query(
                r#"
                UPDATE conversation_states SET
                    step = $3,
                    intent = $4,
                    slots = $5,
                    version = $6,
                    updated_at = $7
                WHERE identity = $1 AND version = $2
                "#,
            )
            .bind(identity.as_str())
            .bind(to_db_version(expected_version)?)
            .bind(&step)
            .bind(intent)
            .bind(slots)
            .bind(version)
            .bind(new_state.updated_at.as_datetime())
            .execute(&self.pool)
            .await
        }
        .map_err(|e| DomainError::database("Failed to write conversation", e))?;

        if result.rows_affected() == 1 {
            return Ok(SwapResult::Swapped);
        }

        let current_version = self.current_version(identity).await?;
        Ok(SwapResult::Conflict { current_version })
    }

    async fn record_processed_message(
        &self,
        identity: &Identity,
        message_id: &ProviderMessageId,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO processed_messages (identity, message_id)
            VALUES ($1, $2)
            ON CONFLICT (identity, message_id) DO NOTHING
            "#,
        )
        .bind(identity.as_str())
        .bind(message_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to claim message", e))?;

        Ok(result.rows_affected() == 0)
    }

    async fn release_processed_message(
        &self,
        identity: &Identity,
        message_id: &ProviderMessageId,
    ) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM processed_messages WHERE identity = $1 AND message_id = $2")
            .bind(identity.as_str())
            .bind(message_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to release message", e))?;
        Ok(())
    }

    async fn save_reply(
        &self,
        identity: &Identity,
        message_id: &ProviderMessageId,
        reply: &str,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO processed_messages (identity, message_id, reply)
            VALUES ($1, $2, $3)
            ON CONFLICT (identity, message_id) DO UPDATE SET reply = EXCLUDED.reply
            "#,
        )
        .bind(identity.as_str())
        .bind(message_id.as_str())
        .bind(reply)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to save reply", e))?;
        Ok(())
    }

    async fn find_claim(
        &self,
        identity: &Identity,
        message_id: &ProviderMessageId,
    ) -> Result<Option<MessageClaim>, DomainError> {
        let row: Option<ClaimRow> = sqlx::query_as(
            "SELECT reply, claimed_at FROM processed_messages WHERE identity = $1 AND message_id = $2",
        )
        .bind(identity.as_str())
        .bind(message_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to read message claim", e))?;

        Ok(row.map(|row| MessageClaim {
            claimed_at: Timestamp::from_datetime(row.claimed_at),
            reply: row.reply,
        }))
    }

    async fn find_awaiting_action(
        &self,
        older_than: Timestamp,
        limit: u32,
    ) -> Result<Vec<ConversationState>, DomainError> {
        // States whose first action is journaled as completed are skipped so
        // they do not crowd out unexecuted ones.
        let rows: Vec<ConversationRow> = sqlx::query_as(
            r#"
            SELECT s.identity, s.step, s.intent, s.slots, s.version, s.updated_at
            FROM conversation_states s
            WHERE s.step = 'TERMINAL_SUCCESS'
              AND s.updated_at < $1
              AND NOT EXISTS (
                  SELECT 1 FROM action_journal j
                  WHERE j.action_key = 'conv:' || s.identity || ':' || s.version || ':0'
                    AND j.status = 'completed'
              )
            ORDER BY s.updated_at ASC
            LIMIT $2
            "#,
        )
        .bind(older_than.as_datetime())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to query pending conversations", e))?;

        rows.into_iter().map(ConversationState::try_from).collect()
    }
}
