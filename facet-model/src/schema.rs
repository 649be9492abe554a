use serde::{Deserialize, Serialize};

/// Describes where an entity type's fields live and how each one is treated
/// by the diff and mutation machinery.
///
/// The schema is supplied by the calling application, not computed: the
/// engine trusts it to name real tables and columns and to keep the three
/// field sets disjoint (text fields being the marked subset of attribute
/// fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Entity-type label; also the cache-key namespace (`"<type>:<id>"`).
    pub entity_type: String,
    /// Main (fixed-column) table.
    pub main_table: String,
    /// Primary-key column of the main table.
    pub id_column: String,
    /// The dynamic `(entity, name, value)` side table.
    pub attribute_table: AttributeTable,
    /// The shared long-text table.
    pub overflow_table: OverflowTable,
    /// Columns of the main table, with their literal encodings.
    pub base_fields: Vec<BaseField>,
    /// Names of the dynamic attribute fields.
    pub attribute_fields: Vec<String>,
    /// Subset of `attribute_fields` eligible for overflow storage.
    pub text_fields: Vec<String>,
}

impl EntitySchema {
    /// Creates a schema with conventional attribute/overflow column names.
    /// Field sets start empty; populate the public vectors directly.
    pub fn new(entity_type: &str, main_table: &str, id_column: &str) -> Self {
        Self {
            entity_type: entity_type.into(),
            main_table: main_table.into(),
            id_column: id_column.into(),
            attribute_table: AttributeTable::new(&format!("{main_table}_attributes")),
            overflow_table: OverflowTable::new("overflow_text"),
            base_fields: Vec::new(),
            attribute_fields: Vec::new(),
            text_fields: Vec::new(),
        }
    }

    /// Classifies a field name. Text attributes win over plain attributes
    /// because they are a subset of them.
    pub fn classify(&self, name: &str) -> FieldClass {
        if let Some(base) = self.base_fields.iter().find(|f| f.name == name) {
            return FieldClass::Base(base.encoding);
        }
        if self.text_fields.iter().any(|f| f == name) {
            return FieldClass::TextAttribute;
        }
        if self.attribute_fields.iter().any(|f| f == name) {
            return FieldClass::Attribute;
        }
        FieldClass::Unknown
    }

    /// Iterates every declared field name, base fields first.
    pub fn declared_fields(&self) -> impl Iterator<Item = &str> {
        self.base_fields
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.attribute_fields.iter().map(String::as_str))
    }

    /// True when the schema declares any dynamic attributes at all.
    pub fn has_attributes(&self) -> bool {
        !self.attribute_fields.is_empty()
    }
}

/// Table and column names of the dynamic attribute side table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeTable {
    pub table: String,
    pub entity_column: String,
    pub name_column: String,
    pub value_column: String,
}

impl AttributeTable {
    /// Conventional column names: `entity_id`, `name`, `value`.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.into(),
            entity_column: "entity_id".into(),
            name_column: "name".into(),
            value_column: "value".into(),
        }
    }
}

/// Table and column names of the shared overflow table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverflowTable {
    pub table: String,
    pub id_column: String,
    pub content_column: String,
}

impl OverflowTable {
    /// Conventional column names: `id`, `content`.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.into(),
            id_column: "id".into(),
            content_column: "content".into(),
        }
    }
}

/// A column of the main table together with its literal encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseField {
    pub name: String,
    pub encoding: FieldEncoding,
}

impl BaseField {
    /// Shorthand for a quoted-and-escaped text column.
    pub fn text(name: &str) -> Self {
        Self {
            name: name.into(),
            encoding: FieldEncoding::Text,
        }
    }

    /// Shorthand for an integer-cast column.
    pub fn numeric(name: &str) -> Self {
        Self {
            name: name.into(),
            encoding: FieldEncoding::Numeric,
        }
    }

    /// Shorthand for a column whose values are spliced raw (caller-prepared
    /// SQL expressions).
    pub fn opaque(name: &str) -> Self {
        Self {
            name: name.into(),
            encoding: FieldEncoding::Opaque,
        }
    }
}

/// How a base-field value is rendered into a SQL literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldEncoding {
    /// Spliced as-is; the caller guarantees SQL safety.
    Opaque,
    /// Cast to an integer literal.
    Numeric,
    /// Single-quoted with embedded quotes doubled.
    Text,
}

/// The diff-relevant classification of one field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    /// A column of the main table.
    Base(FieldEncoding),
    /// A dynamic attribute eligible for overflow storage.
    TextAttribute,
    /// A dynamic attribute stored inline only.
    Attribute,
    /// Not declared by the schema; ignored by the planner.
    Unknown,
}
