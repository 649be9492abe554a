//! Entity model for the facet engine.
//!
//! Defines the types the storage layer operates on:
//! - [`Entity`] — a loaded snapshot: id plus one string-or-null slot per
//!   declared field
//! - [`EntitySchema`] — the caller-supplied classification of an entity
//!   type's fields into base columns, dynamic attributes and text attributes,
//!   together with the table/column names they live in
//! - [`AttributeValue`] — the tagged inline/overflow/absent representation of
//!   a stored attribute value, including the overflow-pointer codec
//! - [`SizeClass`] — inline vs. overflow classification against the
//!   [`INLINE_LIMIT`] threshold
//!
//! These types carry no database dependency; `facet-storage` consumes them.

mod entity;
mod schema;
mod value;

pub use entity::{Entity, FieldMap};
pub use schema::{AttributeTable, BaseField, EntitySchema, FieldClass, FieldEncoding, OverflowTable};
pub use value::{AttributeValue, SizeClass, INLINE_LIMIT};
