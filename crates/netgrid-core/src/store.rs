//! Persistent game store abstraction.
//!
//! The store owns the only mutable shared state in the system: player
//! accounts, cooldown records, and invocation traces. All mutations of one
//! player are serialized through the record's `version` counter — a commit
//! conditioned on a stale version fails with [`DomainError::Conflict`] and
//! the caller re-reads and re-decides.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;

/// Stored representation of a player account.
#[derive(Debug, Clone)]
pub struct PlayerRecord {
    /// Player identifier (issued by the authentication gateway).
    pub player_id: Uuid,
    /// Display handle.
    pub handle: String,
    /// Current level, denormalized from `xp`.
    pub level: i64,
    /// Lifetime experience points.
    pub xp: i64,
    /// Virtual-currency balance in nops. Never negative.
    pub balance: i64,
    /// Command ids unlocked through the lesson shop.
    pub unlocked_commands: Vec<String>,
    /// Soft-ban flag; banned accounts are kept, never deleted.
    pub banned: bool,
    /// Operator-supplied ban reason, if any.
    pub ban_reason: Option<String>,
    /// Account creation instant.
    pub created_at: DateTime<Utc>,
    /// Last committed mutation instant.
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency counter; bumped by every commit.
    pub version: i64,
}

/// Stored cooldown gate for one player × command pair.
#[derive(Debug, Clone)]
pub struct CooldownRecord {
    /// The gated player.
    pub player_id: Uuid,
    /// The gated command.
    pub command_id: String,
    /// Invocations before this instant are rejected; equality is eligible.
    pub next_eligible_at: DateTime<Utc>,
    /// Last write instant.
    pub updated_at: DateTime<Utc>,
}

/// Stored invocation trace, keyed by `(player_id, trace_id)`.
///
/// The trace makes retried requests idempotent: a replayed trace id returns
/// the stored payload instead of re-rolling or re-paying.
#[derive(Debug, Clone)]
pub struct TraceRecord {
    /// The invoking player.
    pub player_id: Uuid,
    /// Caller-supplied idempotency token, unique per logical attempt.
    pub trace_id: String,
    /// The invoked command.
    pub command_id: String,
    /// Serialized outcome payload, returned verbatim on replay.
    pub payload: serde_json::Value,
    /// Commit instant, used for retention pruning.
    pub recorded_at: DateTime<Utc>,
}

/// Contract for the persistent game store.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Loads a player account, or `None` if no account exists.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is unreachable.
    async fn load_player(&self, player_id: Uuid) -> Result<Option<PlayerRecord>, DomainError>;

    /// Inserts a fresh player account. Returns `false` without touching the
    /// store when an account already exists (idempotent enrollment).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is unreachable.
    async fn insert_player(&self, record: &PlayerRecord) -> Result<bool, DomainError>;

    /// Loads the cooldown record for one player × command pair, if any.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is unreachable.
    async fn load_cooldown(
        &self,
        player_id: Uuid,
        command_id: &str,
    ) -> Result<Option<CooldownRecord>, DomainError>;

    /// Looks up a previously committed trace by idempotency key.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is unreachable.
    async fn find_trace(
        &self,
        player_id: Uuid,
        trace_id: &str,
    ) -> Result<Option<TraceRecord>, DomainError>;

    /// Atomically applies one rolled invocation: the player write
    /// (conditioned on `expected_version`), the cooldown overwrite, and the
    /// trace append commit or abort together.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` when the version guard fails or the
    /// trace key is already taken, `DomainError::Infrastructure` on store
    /// trouble. On conflict nothing is persisted.
    async fn commit_invocation(
        &self,
        expected_version: i64,
        player: &PlayerRecord,
        cooldown: &CooldownRecord,
        trace: &TraceRecord,
    ) -> Result<(), DomainError>;

    /// Appends a policy-rejection trace. Rejections mutate no player state,
    /// so this write is guarded only by the trace key — concurrent
    /// rejections for one player do not contend with each other.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` when the trace key is already taken
    /// (a racing request with the same token won), `DomainError::Infrastructure`
    /// on store trouble.
    async fn append_trace(&self, trace: &TraceRecord) -> Result<(), DomainError>;

    /// Atomically rewrites a player record (lesson purchases, profile
    /// mutations), conditioned on `expected_version`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` when the version guard fails,
    /// `DomainError::Infrastructure` on store trouble.
    async fn commit_player(
        &self,
        expected_version: i64,
        player: &PlayerRecord,
    ) -> Result<(), DomainError>;

    /// Deletes traces recorded before `older_than`. Returns the number of
    /// traces removed. Retention only needs to cover realistic retry
    /// windows, so the server prunes periodically.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store is unreachable.
    async fn prune_traces(&self, older_than: DateTime<Utc>) -> Result<u64, DomainError>;
}
