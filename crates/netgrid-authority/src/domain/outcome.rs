//! Invocation and lesson outcomes.
//!
//! Outcomes are the values the Authority returns *and* the payloads it
//! persists in the invocation trace. Replaying a trace id deserializes the
//! stored payload and returns it verbatim, so these types round-trip
//! through JSON without loss.

use chrono::{DateTime, Utc};
use netgrid_core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Why an invocation ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeReason {
    /// The roll succeeded and the payout was applied.
    Success,
    /// The roll failed and the penalty was applied.
    Failed,
    /// The command is still cooling down; nothing was applied.
    Cooldown,
    /// The player has not unlocked the command; nothing was applied.
    Locked,
}

/// The result of one invocation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationOutcome {
    /// The invoked command.
    pub command_id: String,
    /// The caller's idempotency token.
    pub trace_id: String,
    /// True only for a successful roll.
    pub ok: bool,
    /// Outcome classification.
    pub reason: OutcomeReason,
    /// Balance delta as drawn (rejections carry 0; the applied delta may
    /// be smaller in magnitude when the zero clamp bites).
    pub delta: i64,
    /// Experience granted by this attempt.
    pub xp_gained: i64,
    /// Balance after the commit, for client display.
    pub balance: i64,
    /// When the command becomes invokable again. Absent for `Locked`.
    pub next_eligible_at: Option<DateTime<Utc>>,
}

impl InvocationOutcome {
    /// Builds a policy-rejection outcome (no state applied beyond the trace).
    #[must_use]
    pub fn rejected(
        command_id: &str,
        trace_id: &str,
        reason: OutcomeReason,
        balance: i64,
        next_eligible_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            command_id: command_id.to_owned(),
            trace_id: trace_id.to_owned(),
            ok: false,
            reason,
            delta: 0,
            xp_gained: 0,
            balance,
            next_eligible_at,
        }
    }

    /// Serializes the outcome for trace storage.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("InvocationOutcome serialization is infallible")
    }

    /// Deserializes a stored trace payload.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload does not decode,
    /// which indicates trace corruption.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, DomainError> {
        serde_json::from_value(payload.clone())
            .map_err(|e| DomainError::Infrastructure(format!("trace deserialization failed: {e}")))
    }
}

/// Why a lesson purchase ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LessonReason {
    /// The lesson was bought and the command unlocked.
    Purchased,
    /// The player already has the command (or it is a free starter).
    AlreadyUnlocked,
    /// The unlock cost exceeds the balance; nothing was charged.
    InsufficientFunds,
    /// The player's level is below the command's requirement.
    LevelTooLow,
}

/// The result of one lesson-purchase attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonOutcome {
    /// The command the lesson teaches.
    pub command_id: String,
    /// True only for `Purchased`.
    pub ok: bool,
    /// Outcome classification.
    pub reason: LessonReason,
    /// Balance after the attempt.
    pub balance: i64,
}
