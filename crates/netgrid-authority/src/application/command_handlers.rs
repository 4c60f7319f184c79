//! Command handlers for the Command Execution Authority.
//!
//! Each handler runs a read-decide-commit cycle against the store. A commit
//! that loses the optimistic-concurrency race aborts cleanly and the cycle
//! re-reads and re-decides from scratch — the loser of a cooldown race
//! simply observes the cooldown the winner wrote. The cycle repeats at most
//! [`MAX_COMMIT_ATTEMPTS`] times before surfacing a transient
//! `DomainError::Contention`.

use std::sync::Mutex;

use netgrid_catalog::{Catalog, CommandDefinition};
use netgrid_core::clock::Clock;
use netgrid_core::error::DomainError;
use netgrid_core::rng::DeterministicRng;
use netgrid_core::store::{CooldownRecord, GameStore, PlayerRecord, TraceRecord};
use tracing::debug;

use crate::domain::account::PlayerAccount;
use crate::domain::commands::{EnrollPlayer, ExecuteCommand, PurchaseLesson};
use crate::domain::outcome::{InvocationOutcome, LessonOutcome, LessonReason, OutcomeReason};

/// Bounded retry budget for contended commits.
pub const MAX_COMMIT_ATTEMPTS: u32 = 3;

fn trace_for(outcome: &InvocationOutcome, player: &PlayerRecord, now: chrono::DateTime<chrono::Utc>) -> TraceRecord {
    TraceRecord {
        player_id: player.player_id,
        trace_id: outcome.trace_id.clone(),
        command_id: outcome.command_id.clone(),
        payload: outcome.to_payload(),
        recorded_at: now,
    }
}

fn draw_delta(
    rng: &mut dyn DeterministicRng,
    definition: &CommandDefinition,
) -> (bool, i64) {
    let success = rng.next_f64() < definition.success_probability;
    if !success {
        return (false, definition.fail_penalty);
    }
    if definition.reward_min == definition.reward_max {
        return (true, definition.reward_min);
    }
    // Span fits u32 (validated at catalog load).
    let span = u32::try_from(definition.reward_max - definition.reward_min).unwrap_or(u32::MAX);
    (true, definition.reward_min + i64::from(rng.next_u32_range(0, span)))
}

/// Handles `ExecuteCommand`: the authoritative, exactly-once invocation
/// transaction. Unknown commands and unknown/banned players are rejected
/// before anything is persisted; locked and cooling-down invocations commit
/// a trace (so replays answer deterministically) but mutate nothing else;
/// a rolled invocation commits the balance/experience update, the cooldown
/// overwrite, and the trace as one atomic unit.
///
/// # Errors
///
/// Returns `CommandNotFound`, `PlayerNotFound`, or `PlayerBanned` for
/// caller errors, `Contention` when the retry budget is exhausted, and
/// `Infrastructure` when the store misbehaves.
pub async fn handle_execute_command(
    command: &ExecuteCommand,
    catalog: &Catalog,
    clock: &dyn Clock,
    rng: &Mutex<dyn DeterministicRng + Send>,
    store: &dyn GameStore,
) -> Result<InvocationOutcome, DomainError> {
    let definition = catalog
        .get(&command.command_id)
        .ok_or_else(|| DomainError::CommandNotFound(command.command_id.clone()))?;

    for attempt in 0..MAX_COMMIT_ATTEMPTS {
        let record = store
            .load_player(command.player_id)
            .await?
            .ok_or(DomainError::PlayerNotFound(command.player_id))?;
        if record.banned {
            return Err(DomainError::PlayerBanned {
                player_id: record.player_id,
                reason: record.ban_reason,
            });
        }

        // Idempotent replay: a known trace id returns the stored outcome
        // without re-rolling or re-paying.
        if let Some(trace) = store.find_trace(command.player_id, &command.trace_id).await? {
            return InvocationOutcome::from_payload(&trace.payload);
        }

        let now = clock.now();
        let expected_version = record.version;

        // Rejection traces mutate no player state, so they append guarded
        // only by the trace key; a duplicate means a racing request with
        // the same token won, and the next pass replays its outcome.
        if !catalog.is_unlocked_for(&record, &command.command_id) {
            let outcome = InvocationOutcome::rejected(
                &command.command_id,
                &command.trace_id,
                OutcomeReason::Locked,
                record.balance,
                None,
            );
            match store.append_trace(&trace_for(&outcome, &record, now)).await {
                Ok(()) => return Ok(outcome),
                Err(DomainError::Conflict { .. }) => {
                    debug!(attempt, player_id = %command.player_id, "locked-trace append lost the race");
                    continue;
                }
                Err(other) => return Err(other),
            }
        }

        let gate = store.load_cooldown(command.player_id, &command.command_id).await?;
        if let Some(gate) = gate {
            // Equality is eligible: rejected only strictly before the gate.
            if now < gate.next_eligible_at {
                let outcome = InvocationOutcome::rejected(
                    &command.command_id,
                    &command.trace_id,
                    OutcomeReason::Cooldown,
                    record.balance,
                    Some(gate.next_eligible_at),
                );
                match store.append_trace(&trace_for(&outcome, &record, now)).await {
                    Ok(()) => return Ok(outcome),
                    Err(DomainError::Conflict { .. }) => {
                        debug!(attempt, player_id = %command.player_id, "cooldown-trace append lost the race");
                        continue;
                    }
                    Err(other) => return Err(other),
                }
            }
        }

        // The draw is server-side; the lock covers only the synchronous
        // calls, never an await point.
        let (success, delta) = {
            let mut guard = rng
                .lock()
                .map_err(|e| DomainError::Infrastructure(format!("RNG mutex poisoned: {e}")))?;
            draw_delta(&mut *guard, definition)
        };

        let xp_gained = if success {
            definition.xp_reward
        } else {
            definition.xp_on_failure()
        };

        let mut account = PlayerAccount::from_record(record);
        account.apply_balance_delta(delta);
        account.grant_xp(xp_gained);
        account.touch(now);

        let next_eligible_at = now + definition.cooldown();
        let outcome = InvocationOutcome {
            command_id: command.command_id.clone(),
            trace_id: command.trace_id.clone(),
            ok: success,
            reason: if success {
                OutcomeReason::Success
            } else {
                OutcomeReason::Failed
            },
            delta,
            xp_gained,
            balance: account.record().balance,
            next_eligible_at: Some(next_eligible_at),
        };
        let cooldown = CooldownRecord {
            player_id: command.player_id,
            command_id: command.command_id.clone(),
            next_eligible_at,
            updated_at: now,
        };

        match store
            .commit_invocation(
                expected_version,
                account.record(),
                &cooldown,
                &trace_for(&outcome, account.record(), now),
            )
            .await
        {
            Ok(()) => return Ok(outcome),
            Err(DomainError::Conflict { .. }) => {
                debug!(attempt, player_id = %command.player_id, "invocation commit lost the race");
                continue;
            }
            Err(other) => return Err(other),
        }
    }

    Err(DomainError::Contention {
        player_id: command.player_id,
        attempts: MAX_COMMIT_ATTEMPTS,
    })
}

/// Handles `PurchaseLesson`: unlocks a command for a price. Rejections
/// (already unlocked, short funds, low level) are policy outcomes, not
/// errors, and mutate nothing. Replayed purchases land on `AlreadyUnlocked`
/// and never double-charge.
///
/// # Errors
///
/// Returns `CommandNotFound`, `PlayerNotFound`, or `PlayerBanned` for
/// caller errors, `Contention` when the retry budget is exhausted, and
/// `Infrastructure` when the store misbehaves.
pub async fn handle_purchase_lesson(
    command: &PurchaseLesson,
    catalog: &Catalog,
    clock: &dyn Clock,
    store: &dyn GameStore,
) -> Result<LessonOutcome, DomainError> {
    let definition = catalog
        .get(&command.command_id)
        .ok_or_else(|| DomainError::CommandNotFound(command.command_id.clone()))?;

    for attempt in 0..MAX_COMMIT_ATTEMPTS {
        let record = store
            .load_player(command.player_id)
            .await?
            .ok_or(DomainError::PlayerNotFound(command.player_id))?;
        if record.banned {
            return Err(DomainError::PlayerBanned {
                player_id: record.player_id,
                reason: record.ban_reason,
            });
        }

        if catalog.is_unlocked_for(&record, &command.command_id) {
            return Ok(LessonOutcome {
                command_id: command.command_id.clone(),
                ok: false,
                reason: LessonReason::AlreadyUnlocked,
                balance: record.balance,
            });
        }
        if record.level < definition.required_level {
            return Ok(LessonOutcome {
                command_id: command.command_id.clone(),
                ok: false,
                reason: LessonReason::LevelTooLow,
                balance: record.balance,
            });
        }
        if record.balance < definition.unlock_cost {
            return Ok(LessonOutcome {
                command_id: command.command_id.clone(),
                ok: false,
                reason: LessonReason::InsufficientFunds,
                balance: record.balance,
            });
        }

        let expected_version = record.version;
        let mut account = PlayerAccount::from_record(record);
        account.apply_balance_delta(-definition.unlock_cost);
        account.unlock(&command.command_id);
        account.touch(clock.now());

        match store.commit_player(expected_version, account.record()).await {
            Ok(()) => {
                return Ok(LessonOutcome {
                    command_id: command.command_id.clone(),
                    ok: true,
                    reason: LessonReason::Purchased,
                    balance: account.record().balance,
                });
            }
            Err(DomainError::Conflict { .. }) => {
                debug!(attempt, player_id = %command.player_id, "lesson commit lost the race");
                continue;
            }
            Err(other) => return Err(other),
        }
    }

    Err(DomainError::Contention {
        player_id: command.player_id,
        attempts: MAX_COMMIT_ATTEMPTS,
    })
}

/// Handles `EnrollPlayer`: idempotent account creation. Returns the
/// existing record untouched when the player already enrolled (including
/// the losing side of an enrollment race).
///
/// # Errors
///
/// Returns `Validation` for a blank handle and `Infrastructure` when the
/// store misbehaves.
pub async fn handle_enroll_player(
    command: &EnrollPlayer,
    clock: &dyn Clock,
    store: &dyn GameStore,
) -> Result<PlayerRecord, DomainError> {
    let handle = command.handle.trim();
    if handle.is_empty() {
        return Err(DomainError::Validation("handle must not be blank".to_owned()));
    }

    if let Some(existing) = store.load_player(command.player_id).await? {
        return Ok(existing);
    }

    let account = PlayerAccount::enroll(command.player_id, handle.to_owned(), clock.now());
    if store.insert_player(account.record()).await? {
        return Ok(account.into_record());
    }

    // Lost an enrollment race; the winner's record is authoritative.
    store
        .load_player(command.player_id)
        .await?
        .ok_or_else(|| DomainError::Infrastructure("player vanished after enrollment race".to_owned()))
}
