//! `PostgreSQL` implementation of the `GameStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use netgrid_core::error::DomainError;
use netgrid_core::store::{CooldownRecord, GameStore, PlayerRecord, TraceRecord};

/// Embedded migration set, applied at startup.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// PostgreSQL-backed game store.
#[derive(Debug, Clone)]
pub struct PgGameStore {
    pool: PgPool,
}

impl PgGameStore {
    /// Creates a new `PgGameStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` when a migration fails.
    pub async fn run_migrations(&self) -> Result<(), DomainError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::Infrastructure(format!("migration failed: {e}")))
    }
}

fn infra(error: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(error.to_string())
}

fn map_player(row: &PgRow) -> Result<PlayerRecord, DomainError> {
    Ok(PlayerRecord {
        player_id: row.try_get("player_id").map_err(infra)?,
        handle: row.try_get("handle").map_err(infra)?,
        level: row.try_get("level").map_err(infra)?,
        xp: row.try_get("xp").map_err(infra)?,
        balance: row.try_get("balance").map_err(infra)?,
        unlocked_commands: row.try_get("unlocked_commands").map_err(infra)?,
        banned: row.try_get("banned").map_err(infra)?,
        ban_reason: row.try_get("ban_reason").map_err(infra)?,
        created_at: row.try_get("created_at").map_err(infra)?,
        updated_at: row.try_get("updated_at").map_err(infra)?,
        version: row.try_get("version").map_err(infra)?,
    })
}

const SELECT_PLAYER: &str = "
SELECT player_id, handle, level, xp, balance, unlocked_commands,
       banned, ban_reason, created_at, updated_at, version
FROM players WHERE player_id = $1
";

const UPDATE_PLAYER: &str = "
UPDATE players
SET handle = $2, level = $3, xp = $4, balance = $5, unlocked_commands = $6,
    banned = $7, ban_reason = $8, updated_at = $9, version = $10
WHERE player_id = $1 AND version = $11
";

const UPSERT_COOLDOWN: &str = "
INSERT INTO cooldowns (player_id, command_id, next_eligible_at, updated_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (player_id, command_id)
DO UPDATE SET next_eligible_at = EXCLUDED.next_eligible_at,
              updated_at = EXCLUDED.updated_at
";

const INSERT_TRACE: &str = "
INSERT INTO invocation_traces (player_id, trace_id, command_id, payload, recorded_at)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (player_id, trace_id) DO NOTHING
";

#[async_trait]
impl GameStore for PgGameStore {
    async fn load_player(&self, player_id: Uuid) -> Result<Option<PlayerRecord>, DomainError> {
        let row = sqlx::query(SELECT_PLAYER)
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(infra)?;
        row.as_ref().map(map_player).transpose()
    }

    async fn insert_player(&self, record: &PlayerRecord) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "
INSERT INTO players (player_id, handle, level, xp, balance, unlocked_commands,
                     banned, ban_reason, created_at, updated_at, version)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
ON CONFLICT (player_id) DO NOTHING
",
        )
        .bind(record.player_id)
        .bind(&record.handle)
        .bind(record.level)
        .bind(record.xp)
        .bind(record.balance)
        .bind(&record.unlocked_commands)
        .bind(record.banned)
        .bind(&record.ban_reason)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.version)
        .execute(&self.pool)
        .await
        .map_err(infra)?;

        Ok(result.rows_affected() == 1)
    }

    async fn load_cooldown(
        &self,
        player_id: Uuid,
        command_id: &str,
    ) -> Result<Option<CooldownRecord>, DomainError> {
        let row = sqlx::query(
            "
SELECT player_id, command_id, next_eligible_at, updated_at
FROM cooldowns WHERE player_id = $1 AND command_id = $2
",
        )
        .bind(player_id)
        .bind(command_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?;

        row.map(|row| {
            Ok(CooldownRecord {
                player_id: row.try_get("player_id").map_err(infra)?,
                command_id: row.try_get("command_id").map_err(infra)?,
                next_eligible_at: row.try_get("next_eligible_at").map_err(infra)?,
                updated_at: row.try_get("updated_at").map_err(infra)?,
            })
        })
        .transpose()
    }

    async fn find_trace(
        &self,
        player_id: Uuid,
        trace_id: &str,
    ) -> Result<Option<TraceRecord>, DomainError> {
        let row = sqlx::query(
            "
SELECT player_id, trace_id, command_id, payload, recorded_at
FROM invocation_traces WHERE player_id = $1 AND trace_id = $2
",
        )
        .bind(player_id)
        .bind(trace_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infra)?;

        row.map(|row| {
            Ok(TraceRecord {
                player_id: row.try_get("player_id").map_err(infra)?,
                trace_id: row.try_get("trace_id").map_err(infra)?,
                command_id: row.try_get("command_id").map_err(infra)?,
                payload: row.try_get("payload").map_err(infra)?,
                recorded_at: row.try_get("recorded_at").map_err(infra)?,
            })
        })
        .transpose()
    }

    async fn commit_invocation(
        &self,
        expected_version: i64,
        player: &PlayerRecord,
        cooldown: &CooldownRecord,
        trace: &TraceRecord,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(infra)?;

        let updated = sqlx::query(UPDATE_PLAYER)
            .bind(player.player_id)
            .bind(&player.handle)
            .bind(player.level)
            .bind(player.xp)
            .bind(player.balance)
            .bind(&player.unlocked_commands)
            .bind(player.banned)
            .bind(&player.ban_reason)
            .bind(player.updated_at)
            .bind(expected_version + 1)
            .bind(expected_version)
            .execute(&mut *tx)
            .await
            .map_err(infra)?;
        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(infra)?;
            return Err(self.version_conflict(player.player_id, expected_version).await);
        }

        sqlx::query(UPSERT_COOLDOWN)
            .bind(cooldown.player_id)
            .bind(&cooldown.command_id)
            .bind(cooldown.next_eligible_at)
            .bind(cooldown.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(infra)?;

        let inserted = sqlx::query(INSERT_TRACE)
            .bind(trace.player_id)
            .bind(&trace.trace_id)
            .bind(&trace.command_id)
            .bind(&trace.payload)
            .bind(trace.recorded_at)
            .execute(&mut *tx)
            .await
            .map_err(infra)?;
        if inserted.rows_affected() == 0 {
            // A racing request with the same idempotency token committed
            // first; abort so the caller replays the stored outcome.
            tx.rollback().await.map_err(infra)?;
            return Err(DomainError::Conflict {
                player_id: player.player_id,
                expected: expected_version,
                actual: expected_version,
            });
        }

        tx.commit().await.map_err(infra)
    }

    async fn append_trace(&self, trace: &TraceRecord) -> Result<(), DomainError> {
        let inserted = sqlx::query(INSERT_TRACE)
            .bind(trace.player_id)
            .bind(&trace.trace_id)
            .bind(&trace.command_id)
            .bind(&trace.payload)
            .bind(trace.recorded_at)
            .execute(&self.pool)
            .await
            .map_err(infra)?;

        if inserted.rows_affected() == 0 {
            return Err(DomainError::Conflict {
                player_id: trace.player_id,
                expected: 0,
                actual: 0,
            });
        }
        Ok(())
    }

    async fn commit_player(
        &self,
        expected_version: i64,
        player: &PlayerRecord,
    ) -> Result<(), DomainError> {
        let updated = sqlx::query(UPDATE_PLAYER)
            .bind(player.player_id)
            .bind(&player.handle)
            .bind(player.level)
            .bind(player.xp)
            .bind(player.balance)
            .bind(&player.unlocked_commands)
            .bind(player.banned)
            .bind(&player.ban_reason)
            .bind(player.updated_at)
            .bind(expected_version + 1)
            .bind(expected_version)
            .execute(&self.pool)
            .await
            .map_err(infra)?;

        if updated.rows_affected() == 0 {
            return Err(self.version_conflict(player.player_id, expected_version).await);
        }
        Ok(())
    }

    async fn prune_traces(&self, older_than: DateTime<Utc>) -> Result<u64, DomainError> {
        let deleted = sqlx::query("DELETE FROM invocation_traces WHERE recorded_at < $1")
            .bind(older_than)
            .execute(&self.pool)
            .await
            .map_err(infra)?;
        Ok(deleted.rows_affected())
    }
}

impl PgGameStore {
    /// Builds the conflict (or not-found) error after a guarded update
    /// matched zero rows.
    async fn version_conflict(&self, player_id: Uuid, expected: i64) -> DomainError {
        match sqlx::query_scalar::<_, i64>("SELECT version FROM players WHERE player_id = $1")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(Some(actual)) => DomainError::Conflict {
                player_id,
                expected,
                actual,
            },
            Ok(None) => DomainError::PlayerNotFound(player_id),
            Err(error) => infra(error),
        }
    }
}
