//! Player account behavior: balance clamping, experience, progression.

use chrono::{DateTime, Utc};
use netgrid_core::store::PlayerRecord;
use uuid::Uuid;

/// Experience points required per level step.
const XP_PER_LEVEL: i64 = 100;

/// Level for a given lifetime experience total. Everyone starts at 1.
#[must_use]
pub fn level_for_xp(xp: i64) -> i64 {
    1 + xp.max(0) / XP_PER_LEVEL
}

/// A player account loaded for mutation. Wraps the stored record and keeps
/// its invariants: the balance never drops below zero and the level always
/// tracks the experience total.
#[derive(Debug)]
pub struct PlayerAccount {
    record: PlayerRecord,
}

impl PlayerAccount {
    /// Builds the starter account created on first enrollment.
    #[must_use]
    pub fn enroll(player_id: Uuid, handle: String, now: DateTime<Utc>) -> Self {
        Self {
            record: PlayerRecord {
                player_id,
                handle,
                level: 1,
                xp: 0,
                balance: 0,
                unlocked_commands: Vec::new(),
                banned: false,
                ban_reason: None,
                created_at: now,
                updated_at: now,
                version: 0,
            },
        }
    }

    /// Wraps a loaded record.
    #[must_use]
    pub fn from_record(record: PlayerRecord) -> Self {
        Self { record }
    }

    /// The current record state.
    #[must_use]
    pub fn record(&self) -> &PlayerRecord {
        &self.record
    }

    /// Consumes the account, yielding the record.
    #[must_use]
    pub fn into_record(self) -> PlayerRecord {
        self.record
    }

    /// Applies a balance delta, clamping at zero. A penalty larger than the
    /// balance empties the account but never overdraws it.
    pub fn apply_balance_delta(&mut self, delta: i64) {
        self.record.balance = (self.record.balance + delta).max(0);
    }

    /// Grants experience and recomputes the level.
    pub fn grant_xp(&mut self, amount: i64) {
        self.record.xp += amount.max(0);
        self.record.level = level_for_xp(self.record.xp);
    }

    /// Adds a command to the unlocked set (idempotent).
    pub fn unlock(&mut self, command_id: &str) {
        if !self.record.unlocked_commands.iter().any(|id| id == command_id) {
            self.record.unlocked_commands.push(command_id.to_owned());
        }
    }

    /// Stamps the last-mutation instant.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.record.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn account() -> PlayerAccount {
        PlayerAccount::enroll(
            Uuid::new_v4(),
            "operator".to_owned(),
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_enroll_produces_starter_record() {
        let account = account();
        let record = account.record();
        assert_eq!(record.level, 1);
        assert_eq!(record.xp, 0);
        assert_eq!(record.balance, 0);
        assert!(record.unlocked_commands.is_empty());
        assert!(!record.banned);
        assert_eq!(record.version, 0);
    }

    #[test]
    fn test_balance_delta_accumulates() {
        let mut account = account();
        account.apply_balance_delta(5);
        account.apply_balance_delta(3);
        assert_eq!(account.record().balance, 8);
    }

    #[test]
    fn test_balance_clamps_at_zero() {
        let mut account = account();
        account.apply_balance_delta(1);
        account.apply_balance_delta(-10);
        assert_eq!(account.record().balance, 0);
    }

    #[test]
    fn test_grant_xp_recomputes_level() {
        let mut account = account();
        account.grant_xp(99);
        assert_eq!(account.record().level, 1);
        account.grant_xp(1);
        assert_eq!(account.record().level, 2);
        account.grant_xp(250);
        assert_eq!(account.record().level, 4);
    }

    #[test]
    fn test_negative_xp_grant_is_ignored() {
        let mut account = account();
        account.grant_xp(50);
        account.grant_xp(-20);
        assert_eq!(account.record().xp, 50);
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let mut account = account();
        account.unlock("portscan");
        account.unlock("portscan");
        assert_eq!(account.record().unlocked_commands, vec!["portscan"]);
    }

    #[test]
    fn test_level_for_xp_floors() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(600), 7);
        assert_eq!(level_for_xp(-5), 1);
    }
}
