//! SQLite storage engine for facet entities.
//!
//! An entity lives in three places: a fixed-column main table, a dynamic
//! `(entity, name, value)` attribute side table, and a shared overflow
//! table for text attribute values longer than the inline limit. This crate
//! loads composite snapshots, diffs an input map against a snapshot, and
//! executes the minimal set of statements moving one to the other,
//! migrating text values between inline and overflow storage as they cross
//! the threshold.
//!
//! # Architecture
//!
//! - [`EntityStore`] — the facade: open, load, save, inspect
//! - [`MutationPlan`] — the pure diff of original vs. input
//! - `reader` / `executor` — snapshot assembly and statement execution
//! - [`EntityCache`] — optional read cache, evicted after every mutation

mod cache;
mod entity_store;
mod error;
mod executor;
mod overflow;
mod plan;
mod reader;

pub use cache::{cache_key, invalidate, EntityCache, InMemoryCache};
pub use entity_store::{EntityStore, SaveOutcome};
pub use error::{StorageError, StorageResult};
pub use plan::{BaseUpdate, MutationPlan, TextTransition};

use std::path::Path;
use std::time::Duration;

/// Opens a SQLite connection with the engine's pragmas applied: WAL journal
/// mode, foreign keys on, a five-second busy timeout.
pub fn open_sqlite(path: &Path) -> StorageResult<rusqlite::Connection> {
    let conn = rusqlite::Connection::open(path)?;
    conn.query_row("PRAGMA journal_mode = WAL", [], |_row| Ok(()))?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(conn)
}
