//! Test stores — in-memory and failure-injecting `GameStore` implementations.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use netgrid_core::error::DomainError;
use netgrid_core::store::{CooldownRecord, GameStore, PlayerRecord, TraceRecord};
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    players: HashMap<Uuid, PlayerRecord>,
    cooldowns: HashMap<(Uuid, String), CooldownRecord>,
    traces: HashMap<(Uuid, String), TraceRecord>,
}

/// A `GameStore` with full semantics held in memory: version-guarded
/// commits, trace-key deduplication, and atomic multi-record writes. The
/// single mutex serializes commits the way the database transaction does.
#[derive(Debug, Default)]
pub struct MemoryGameStore {
    state: Mutex<MemoryState>,
}

impl MemoryGameStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a player record, for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn player_snapshot(&self, player_id: Uuid) -> Option<PlayerRecord> {
        self.state.lock().unwrap().players.get(&player_id).cloned()
    }

    /// Snapshot of a cooldown record, for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn cooldown_snapshot(&self, player_id: Uuid, command_id: &str) -> Option<CooldownRecord> {
        self.state
            .lock()
            .unwrap()
            .cooldowns
            .get(&(player_id, command_id.to_owned()))
            .cloned()
    }

    /// Number of traces currently stored, for "nothing persisted" checks.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn trace_count(&self) -> usize {
        self.state.lock().unwrap().traces.len()
    }
}

#[async_trait]
impl GameStore for MemoryGameStore {
    async fn load_player(&self, player_id: Uuid) -> Result<Option<PlayerRecord>, DomainError> {
        Ok(self.state.lock().unwrap().players.get(&player_id).cloned())
    }

    async fn insert_player(&self, record: &PlayerRecord) -> Result<bool, DomainError> {
        let mut state = self.state.lock().unwrap();
        if state.players.contains_key(&record.player_id) {
            return Ok(false);
        }
        state.players.insert(record.player_id, record.clone());
        Ok(true)
    }

    async fn load_cooldown(
        &self,
        player_id: Uuid,
        command_id: &str,
    ) -> Result<Option<CooldownRecord>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .cooldowns
            .get(&(player_id, command_id.to_owned()))
            .cloned())
    }

    async fn find_trace(
        &self,
        player_id: Uuid,
        trace_id: &str,
    ) -> Result<Option<TraceRecord>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .traces
            .get(&(player_id, trace_id.to_owned()))
            .cloned())
    }

    async fn commit_invocation(
        &self,
        expected_version: i64,
        player: &PlayerRecord,
        cooldown: &CooldownRecord,
        trace: &TraceRecord,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();

        let current = state
            .players
            .get(&player.player_id)
            .ok_or(DomainError::PlayerNotFound(player.player_id))?;
        if current.version != expected_version {
            return Err(DomainError::Conflict {
                player_id: player.player_id,
                expected: expected_version,
                actual: current.version,
            });
        }

        let trace_key = (trace.player_id, trace.trace_id.clone());
        if state.traces.contains_key(&trace_key) {
            // A racing request with the same idempotency token won the
            // commit; the retry loop will return its stored outcome.
            return Err(DomainError::Conflict {
                player_id: player.player_id,
                expected: expected_version,
                actual: expected_version,
            });
        }

        let mut committed = player.clone();
        committed.version = expected_version + 1;
        state.players.insert(committed.player_id, committed);
        state.cooldowns.insert(
            (cooldown.player_id, cooldown.command_id.clone()),
            cooldown.clone(),
        );
        state.traces.insert(trace_key, trace.clone());

        Ok(())
    }

    async fn append_trace(&self, trace: &TraceRecord) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        let trace_key = (trace.player_id, trace.trace_id.clone());
        if state.traces.contains_key(&trace_key) {
            return Err(DomainError::Conflict {
                player_id: trace.player_id,
                expected: 0,
                actual: 0,
            });
        }
        state.traces.insert(trace_key, trace.clone());
        Ok(())
    }

    async fn commit_player(
        &self,
        expected_version: i64,
        player: &PlayerRecord,
    ) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();

        let current = state
            .players
            .get(&player.player_id)
            .ok_or(DomainError::PlayerNotFound(player.player_id))?;
        if current.version != expected_version {
            return Err(DomainError::Conflict {
                player_id: player.player_id,
                expected: expected_version,
                actual: current.version,
            });
        }

        let mut committed = player.clone();
        committed.version = expected_version + 1;
        state.players.insert(committed.player_id, committed);

        Ok(())
    }

    async fn prune_traces(&self, older_than: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut state = self.state.lock().unwrap();
        let before = state.traces.len();
        state.traces.retain(|_, trace| trace.recorded_at >= older_than);
        Ok((before - state.traces.len()) as u64)
    }
}

/// A `GameStore` that always fails with an infrastructure error. Used for
/// testing error-handling paths.
#[derive(Debug, Default)]
pub struct FailingGameStore;

fn connection_refused() -> DomainError {
    DomainError::Infrastructure("connection refused".into())
}

#[async_trait]
impl GameStore for FailingGameStore {
    async fn load_player(&self, _player_id: Uuid) -> Result<Option<PlayerRecord>, DomainError> {
        Err(connection_refused())
    }

    async fn insert_player(&self, _record: &PlayerRecord) -> Result<bool, DomainError> {
        Err(connection_refused())
    }

    async fn load_cooldown(
        &self,
        _player_id: Uuid,
        _command_id: &str,
    ) -> Result<Option<CooldownRecord>, DomainError> {
        Err(connection_refused())
    }

    async fn find_trace(
        &self,
        _player_id: Uuid,
        _trace_id: &str,
    ) -> Result<Option<TraceRecord>, DomainError> {
        Err(connection_refused())
    }

    async fn commit_invocation(
        &self,
        _expected_version: i64,
        _player: &PlayerRecord,
        _cooldown: &CooldownRecord,
        _trace: &TraceRecord,
    ) -> Result<(), DomainError> {
        Err(connection_refused())
    }

    async fn append_trace(&self, _trace: &TraceRecord) -> Result<(), DomainError> {
        Err(connection_refused())
    }

    async fn commit_player(
        &self,
        _expected_version: i64,
        _player: &PlayerRecord,
    ) -> Result<(), DomainError> {
        Err(connection_refused())
    }

    async fn prune_traces(&self, _older_than: DateTime<Utc>) -> Result<u64, DomainError> {
        Err(connection_refused())
    }
}

/// A `GameStore` that rejects the first `conflicts` commits with a version
/// conflict, then behaves like the wrapped [`MemoryGameStore`]. Used to
/// exercise the bounded contention-retry loop.
#[derive(Debug)]
pub struct ContendedGameStore {
    inner: MemoryGameStore,
    remaining_conflicts: AtomicU32,
}

impl ContendedGameStore {
    /// Wraps `inner`, injecting `conflicts` commit failures before letting
    /// commits through.
    #[must_use]
    pub fn new(inner: MemoryGameStore, conflicts: u32) -> Self {
        Self {
            inner,
            remaining_conflicts: AtomicU32::new(conflicts),
        }
    }

    /// The wrapped store, for assertions.
    #[must_use]
    pub fn inner(&self) -> &MemoryGameStore {
        &self.inner
    }

    fn injected_conflict(&self, player_id: Uuid, expected: i64) -> Option<DomainError> {
        let remaining = self.remaining_conflicts.load(Ordering::SeqCst);
        if remaining == 0 {
            return None;
        }
        self.remaining_conflicts.store(remaining - 1, Ordering::SeqCst);
        Some(DomainError::Conflict {
            player_id,
            expected,
            actual: expected + 1,
        })
    }
}

#[async_trait]
impl GameStore for ContendedGameStore {
    async fn load_player(&self, player_id: Uuid) -> Result<Option<PlayerRecord>, DomainError> {
        self.inner.load_player(player_id).await
    }

    async fn insert_player(&self, record: &PlayerRecord) -> Result<bool, DomainError> {
        self.inner.insert_player(record).await
    }

    async fn load_cooldown(
        &self,
        player_id: Uuid,
        command_id: &str,
    ) -> Result<Option<CooldownRecord>, DomainError> {
        self.inner.load_cooldown(player_id, command_id).await
    }

    async fn find_trace(
        &self,
        player_id: Uuid,
        trace_id: &str,
    ) -> Result<Option<TraceRecord>, DomainError> {
        self.inner.find_trace(player_id, trace_id).await
    }

    async fn commit_invocation(
        &self,
        expected_version: i64,
        player: &PlayerRecord,
        cooldown: &CooldownRecord,
        trace: &TraceRecord,
    ) -> Result<(), DomainError> {
        if let Some(conflict) = self.injected_conflict(player.player_id, expected_version) {
            return Err(conflict);
        }
        self.inner
            .commit_invocation(expected_version, player, cooldown, trace)
            .await
    }

    async fn append_trace(&self, trace: &TraceRecord) -> Result<(), DomainError> {
        self.inner.append_trace(trace).await
    }

    async fn commit_player(
        &self,
        expected_version: i64,
        player: &PlayerRecord,
    ) -> Result<(), DomainError> {
        if let Some(conflict) = self.injected_conflict(player.player_id, expected_version) {
            return Err(conflict);
        }
        self.inner.commit_player(expected_version, player).await
    }

    async fn prune_traces(&self, older_than: DateTime<Utc>) -> Result<u64, DomainError> {
        self.inner.prune_traces(older_than).await
    }
}
