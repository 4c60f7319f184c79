//! NetGrid — Command Catalog.
//!
//! The catalog is the immutable, configured description of every executable
//! command: payout range, failure penalty, success probability, cooldown,
//! experience reward, and unlock gating. It is pure data — lookup and
//! eligibility answers only, no side effects. Misconfiguration is rejected
//! when the catalog is loaded, never at invocation time.

mod catalog;
mod definition;

pub use catalog::{Catalog, CatalogError};
pub use definition::CommandDefinition;
