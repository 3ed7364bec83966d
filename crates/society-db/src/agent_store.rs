//! Agent and conversation-turn persistence.
//!
//! [`AgentStore`] holds the SQL; [`PgRepository`] adapts it to the
//! scheduler's [`Repository`] trait.
//!
//! Personality, mood, and goals are stored as `JSONB` documents in the
//! versioned envelope produced by [`society_types::encode_document`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use society_core::{AgentFilter, AgentPage, Repository, RepositoryError};
use society_types::{AgentId, AgentRecord, ConversationTurn, MoodSnapshot, encode_document};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbError;
use crate::postgres::PostgresPool;

const AGENT_COLUMNS: &str =
    "id, name, personality, mood_state, goals, is_active, created_at";

/// A row from the `agents` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AgentRow {
    /// Agent id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Versioned personality document.
    pub personality: serde_json::Value,
    /// Versioned mood document.
    pub mood_state: Option<serde_json::Value>,
    /// Versioned goals document.
    pub goals: Option<serde_json::Value>,
    /// Whether the agent takes part in conversations.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<AgentRow> for AgentRecord {
    fn from(row: AgentRow) -> Self {
        Self {
            id: AgentId::from(row.id),
            name: row.name,
            personality: row.personality,
            mood: row.mood_state,
            goals: row.goals,
            active: row.is_active,
            created_at: row.created_at,
        }
    }
}

/// Operations on the `agents` and `conversation_turns` tables.
pub struct AgentStore<'a> {
    pool: &'a PgPool,
}

impl<'a> AgentStore<'a> {
    /// Bind a store to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Up to `limit` active agents in random order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn random_active(&self, limit: usize) -> Result<Vec<AgentRow>, DbError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, AgentRow>(&format!(
            "SELECT {AGENT_COLUMNS} FROM agents WHERE is_active ORDER BY random() LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Look up one agent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get(&self, id: AgentId) -> Result<Option<AgentRow>, DbError> {
        let row = sqlx::query_as::<_, AgentRow>(&format!(
            "SELECT {AGENT_COLUMNS} FROM agents WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Every agent, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list(&self) -> Result<Vec<AgentRow>, DbError> {
        let rows = sqlx::query_as::<_, AgentRow>(&format!(
            "SELECT {AGENT_COLUMNS} FROM agents ORDER BY created_at, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// One page of agents matching `filter`, oldest first, plus the
    /// number of matching rows.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if either query fails.
    pub async fn page(&self, filter: &AgentFilter) -> Result<(Vec<AgentRow>, u64), DbError> {
        let filter = filter.normalized();
        let rows = sqlx::query_as::<_, AgentRow>(&format!(
            r"SELECT {AGENT_COLUMNS} FROM agents
              WHERE ($1::BOOLEAN IS NULL OR is_active = $1)
              ORDER BY created_at, id
              LIMIT $2 OFFSET $3"
        ))
        .bind(filter.active)
        .bind(i64::from(filter.limit))
        .bind(i64::try_from(filter.offset()).unwrap_or(i64::MAX))
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM agents WHERE ($1::BOOLEAN IS NULL OR is_active = $1)",
        )
        .bind(filter.active)
        .fetch_one(self.pool)
        .await?;
        Ok((rows, u64::try_from(total).unwrap_or(0)))
    }

    /// Number of active agents.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn count_active(&self) -> Result<u64, DbError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agents WHERE is_active")
            .fetch_one(self.pool)
            .await?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    /// Insert a new agent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails (including a
    /// duplicate id).
    pub async fn insert(&self, record: &AgentRecord) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO agents (id, name, personality, mood_state, goals, is_active, created_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(record.id.into_inner())
        .bind(&record.name)
        .bind(&record.personality)
        .bind(record.mood.as_ref())
        .bind(record.goals.as_ref())
        .bind(record.active)
        .bind(record.created_at)
        .execute(self.pool)
        .await?;

        tracing::debug!(agent_id = %record.id, name = %record.name, "Inserted agent");
        Ok(())
    }

    /// Mark an agent inactive. Returns `false` if no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn deactivate(&self, id: AgentId) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE agents SET is_active = FALSE WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace an agent's mood document. Returns `false` if no row matched.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Record`] if the snapshot cannot be encoded, or
    /// [`DbError::Postgres`] if the update fails.
    pub async fn update_mood(&self, id: AgentId, mood: &MoodSnapshot) -> Result<bool, DbError> {
        let document = encode_document("mood", mood)?;
        let result = sqlx::query("UPDATE agents SET mood_state = $2 WHERE id = $1")
            .bind(id.into_inner())
            .bind(document)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Append a conversation turn and touch the speaker's `last_active`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if either statement fails; neither is
    /// applied in that case.
    pub async fn insert_turn(&self, turn: &ConversationTurn) -> Result<(), DbError> {
        let tick = i64::try_from(turn.tick).unwrap_or(i64::MAX);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"INSERT INTO conversation_turns (id, speaker_id, target_id, content, tick, created_at)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(turn.id.into_inner())
        .bind(turn.speaker_id.into_inner())
        .bind(turn.target_id.into_inner())
        .bind(&turn.content)
        .bind(tick)
        .bind(turn.timestamp)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE agents SET last_active = $2 WHERE id = $1")
            .bind(turn.speaker_id.into_inner())
            .bind(turn.timestamp)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(tick = turn.tick, speaker = %turn.speaker_id, "Inserted conversation turn");
        Ok(())
    }

    /// Turns an agent spoke or was addressed in.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn count_turns_for(&self, id: AgentId) -> Result<u64, DbError> {
        let n: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM conversation_turns WHERE speaker_id = $1 OR target_id = $1",
        )
        .bind(id.into_inner())
        .fetch_one(self.pool)
        .await?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    /// Every persisted turn.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn count_turns(&self) -> Result<u64, DbError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversation_turns")
            .fetch_one(self.pool)
            .await?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    /// Turns of one tick in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn turns_for_tick(&self, tick: u64) -> Result<Vec<TurnRow>, DbError> {
        let tick = i64::try_from(tick).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, TurnRow>(
            r"SELECT id, speaker_id, target_id, content, tick, created_at
              FROM conversation_turns
              WHERE tick = $1
              ORDER BY created_at, id",
        )
        .bind(tick)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

/// A row from the `conversation_turns` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TurnRow {
    /// Turn id.
    pub id: Uuid,
    /// Speaking agent.
    pub speaker_id: Uuid,
    /// Addressed agent.
    pub target_id: Uuid,
    /// What was said.
    pub content: String,
    /// Tick of the conversation.
    pub tick: i64,
    /// When the turn was produced.
    pub created_at: DateTime<Utc>,
}

/// [`Repository`] backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgRepository {
    pool: PostgresPool,
}

impl PgRepository {
    /// Wrap a connected pool.
    pub const fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    fn store(&self) -> AgentStore<'_> {
        AgentStore::new(self.pool.pool())
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn random_active_agents(&self, n: usize) -> Result<Vec<AgentRecord>, RepositoryError> {
        let rows = self.store().random_active(n).await?;
        Ok(rows.into_iter().map(AgentRecord::from).collect())
    }

    async fn save_conversation_turn(&self, turn: &ConversationTurn) -> Result<(), RepositoryError> {
        Ok(self.store().insert_turn(turn).await?)
    }

    async fn get_agent(&self, id: AgentId) -> Result<Option<AgentRecord>, RepositoryError> {
        Ok(self.store().get(id).await?.map(AgentRecord::from))
    }

    async fn list_agents(&self) -> Result<Vec<AgentRecord>, RepositoryError> {
        let rows = self.store().list().await?;
        Ok(rows.into_iter().map(AgentRecord::from).collect())
    }

    async fn list_agents_page(&self, filter: &AgentFilter) -> Result<AgentPage, RepositoryError> {
        let (rows, total) = self.store().page(filter).await?;
        Ok(AgentPage {
            agents: rows.into_iter().map(AgentRecord::from).collect(),
            total,
        })
    }

    async fn count_active_agents(&self) -> Result<u64, RepositoryError> {
        Ok(self.store().count_active().await?)
    }

    async fn count_turns_for_agent(&self, id: AgentId) -> Result<u64, RepositoryError> {
        Ok(self.store().count_turns_for(id).await?)
    }

    async fn count_turns(&self) -> Result<u64, RepositoryError> {
        Ok(self.store().count_turns().await?)
    }

    async fn create_agent(&self, record: &AgentRecord) -> Result<(), RepositoryError> {
        Ok(self.store().insert(record).await?)
    }

    async fn deactivate_agent(&self, id: AgentId) -> Result<bool, RepositoryError> {
        Ok(self.store().deactivate(id).await?)
    }

    async fn save_mood(&self, id: AgentId, mood: &MoodSnapshot) -> Result<(), RepositoryError> {
        if self.store().update_mood(id, mood).await? {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}
