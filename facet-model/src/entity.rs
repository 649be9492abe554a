use crate::EntitySchema;
use facet_types::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field-name → value map used for both snapshots and mutation input.
/// `None` is a logical null (for attributes: no row in the side table).
pub type FieldMap = BTreeMap<String, Option<String>>;

/// A fully loaded entity snapshot.
///
/// Every field the schema declares is present as a key — the reader defaults
/// missing attribute rows to null — so the differ can distinguish "declared
/// but null" from "not a field of this entity type" by key presence alone.
/// Values are strings because the diff is defined over exact string
/// comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub fields: FieldMap,
}

impl Entity {
    /// The all-null snapshot of an entity type: every declared field present,
    /// every value null. The insert path diffs against this, which is what
    /// makes every supplied attribute a fresh insert.
    pub fn blank(id: EntityId, schema: &EntitySchema) -> Self {
        let fields = schema
            .declared_fields()
            .map(|name| (name.to_string(), None))
            .collect();
        Self { id, fields }
    }

    /// Returns the field's value, flattening "undeclared" and "null" to `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }

    /// True when the field is declared on this snapshot (possibly null).
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// True when the field is null or undeclared.
    pub fn is_null(&self, name: &str) -> bool {
        self.get(name).is_none()
    }

    /// Sets a field value in place.
    pub fn set(&mut self, name: &str, value: Option<String>) {
        self.fields.insert(name.to_string(), value);
    }
}
