//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// Policy rejections (locked command, active cooldown) are *not* errors —
/// they are legitimate outcomes carried in the invocation result. Only
/// caller mistakes, store conflicts, and infrastructure trouble live here.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No player account exists for the given id.
    #[error("player not found: {0}")]
    PlayerNotFound(Uuid),

    /// The command id does not resolve against the catalog.
    #[error("unknown command: {0}")]
    CommandNotFound(String),

    /// The player account carries the soft-ban flag.
    #[error("player {player_id} is banned")]
    PlayerBanned {
        /// The banned player.
        player_id: Uuid,
        /// Operator-supplied ban reason, if any.
        reason: Option<String>,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// A single commit lost the optimistic-concurrency race. Internal to
    /// the bounded retry loop; callers see [`DomainError::Contention`]
    /// once the retry budget is exhausted.
    #[error("version conflict on player {player_id}: expected {expected}, found {actual}")]
    Conflict {
        /// The player whose record was concurrently updated.
        player_id: Uuid,
        /// The version the commit was conditioned on.
        expected: i64,
        /// The version actually found.
        actual: i64,
    },

    /// The commit could not be applied within the retry budget. Transient;
    /// safe to retry with the same trace id.
    #[error("could not commit for player {player_id} after {attempts} attempts")]
    Contention {
        /// The contended player.
        player_id: Uuid,
        /// How many attempts were made before giving up.
        attempts: u32,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
