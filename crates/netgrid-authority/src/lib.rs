//! NetGrid — Command Execution Authority.
//!
//! The sole mutator of player balance, experience, cooldown, and unlock
//! state. Given a player id, a command id, and an idempotency token, the
//! Authority decides success or failure, computes the payout, enforces the
//! cooldown, and durably applies the update as one atomic commit — exactly
//! once, no matter how many tabs, double-clicks, or retries race it.

pub mod application;
pub mod domain;
