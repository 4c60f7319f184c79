//! NetGrid — PostgreSQL game store.
//!
//! Implements the `GameStore` contract on top of `sqlx`. Atomicity comes
//! from one SQL transaction per commit; serialization of concurrent
//! invocations comes from the version-guarded player update — the losing
//! `UPDATE` matches zero rows and the commit aborts without side effects.

pub mod pg_game_store;
pub mod schema;

pub use pg_game_store::PgGameStore;
