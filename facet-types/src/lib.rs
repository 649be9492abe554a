//! Core type definitions for the facet entity engine.
//!
//! This crate defines the fundamental, schema-agnostic types used throughout
//! the engine:
//! - Entity and overflow-row identifiers (integer surrogate keys)
//!
//! Domain-specific field sets, table names and storage behavior belong to
//! `facet-model` and `facet-storage`, not here.

mod ids;

pub use ids::{EntityId, OverflowId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] std::num::ParseIntError),
}
