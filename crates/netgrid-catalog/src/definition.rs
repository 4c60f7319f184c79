//! Command definitions.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// One executable command as configured in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDefinition {
    /// Unique string key.
    pub id: String,
    /// Display title shown in the client shop.
    pub title: String,
    /// The shell line the client terminal prints when running it.
    pub script: String,
    /// Minimum payout in nops on success (closed interval).
    pub reward_min: i64,
    /// Maximum payout in nops on success (closed interval).
    pub reward_max: i64,
    /// Balance delta applied on failure; typically negative.
    pub fail_penalty: i64,
    /// Probability of success in `[0, 1]`. Exactly 0 and 1 are legal.
    pub success_probability: f64,
    /// Cooldown between invocations, in seconds.
    pub cooldown_secs: u32,
    /// Experience granted on success; failure grants a quarter, rounded up.
    pub xp_reward: i64,
    /// Lesson price in nops. Zero marks an always-available starter.
    pub unlock_cost: i64,
    /// Minimum player level to purchase or invoke.
    pub required_level: i64,
    /// Obtainable only through the lesson shop, never as a starter.
    #[serde(default)]
    pub lesson_only: bool,
}

impl CommandDefinition {
    /// The cooldown as a duration.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::seconds(i64::from(self.cooldown_secs))
    }

    /// Starter commands cost nothing and are invokable without a lesson.
    #[must_use]
    pub fn is_starter(&self) -> bool {
        self.unlock_cost == 0 && !self.lesson_only
    }

    /// Experience granted for a failed attempt: a quarter of the success
    /// reward, rounded up (4 → 1, matching the original tuning).
    #[must_use]
    pub fn xp_on_failure(&self) -> i64 {
        // Equivalent to `self.xp_reward.div_ceil(4)`, which is unstable for
        // signed integers (`int_roundings`). Matches div_ceil for all i64.
        let q = self.xp_reward / 4;
        let r = self.xp_reward % 4;
        if r > 0 { q + 1 } else { q }
    }
}
