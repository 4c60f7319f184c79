//! Shared application state.

use std::sync::{Arc, Mutex};

use netgrid_catalog::Catalog;
use netgrid_core::clock::Clock;
use netgrid_core::rng::DeterministicRng;
use netgrid_core::store::GameStore;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The immutable command catalog.
    pub catalog: Arc<Catalog>,
    /// The persistent game store.
    pub store: Arc<dyn GameStore>,
    /// Time source for cooldown arithmetic.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// Server-side draw source.
    pub rng: Arc<Mutex<dyn DeterministicRng + Send>>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn GameStore>,
        clock: Arc<dyn Clock + Send + Sync>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    ) -> Self {
        Self {
            catalog,
            store,
            clock,
            rng,
        }
    }
}
