//! NetGrid HTTP API.
//!
//! Thin axum layer over the Command Execution Authority: an identity
//! extractor, an error-code mapping, and one route module per concern.
//! Exposed as a library so integration tests drive the same router the
//! binary serves.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;
