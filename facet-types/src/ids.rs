//! Identifier types used throughout the facet engine.
//!
//! Both identifiers are thin wrappers over the database's integer surrogate
//! keys (autoincrement rowids), so they order the way the tables do.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for an entity in the storage engine.
///
/// Assigned by the main table's autoincrement column on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    /// Creates an entity ID from a raw database value.
    #[must_use]
    pub const fn from_raw(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying integer key.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Parses an entity ID from its decimal string form.
    pub fn parse(s: &str) -> crate::Result<Self> {
        Ok(Self(s.parse()?))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Identifier of a row in the overflow table holding an out-of-line
/// text attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverflowId(i64);

impl OverflowId {
    /// Creates an overflow ID from a raw database value.
    #[must_use]
    pub const fn from_raw(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying integer key.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Parses an overflow ID from its decimal string form.
    pub fn parse(s: &str) -> crate::Result<Self> {
        Ok(Self(s.parse()?))
    }
}

impl fmt::Display for OverflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OverflowId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
