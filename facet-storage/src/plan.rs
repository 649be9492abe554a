//! Diff/mutation planning.
//!
//! [`MutationPlan::build`] compares a requested input map against the
//! original snapshot and classifies every changed field into a base-column
//! update, an attribute upsert, an attribute delete, or a text transition.
//! The plan is pure data; [`crate::executor`] turns it into statements.

use facet_model::{Entity, EntitySchema, FieldClass, FieldEncoding, FieldMap, SizeClass};

/// The minimal set of mutations moving an entity from one snapshot to
/// another.
#[derive(Debug, Clone, Default)]
pub struct MutationPlan {
    /// Fragments of the main-table `UPDATE ... SET` list.
    pub base_updates: Vec<BaseUpdate>,
    /// `(name, value)` pairs for the batched attribute upsert.
    pub attr_upserts: Vec<(String, String)>,
    /// Attribute names whose rows are deleted (value became null).
    pub attr_deletes: Vec<String>,
    /// Text attributes changing value, with their storage-class movement.
    pub transitions: Vec<(String, TextTransition)>,
}

/// One `column = literal` fragment of the main-table update.
#[derive(Debug, Clone)]
pub struct BaseUpdate {
    pub column: String,
    pub literal: String,
}

/// The four old/new size-class cases of a text attribute change.
///
/// Old and new are classified independently by value size; there is no
/// separate storage-mode flag to consult. Null is reachable only on the
/// `*ToInline` arms — an oversized value is never null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextTransition {
    /// Short (or null) before and after: plain upsert, or delete on null.
    InlineToInline { new: Option<String> },
    /// The value grew past the limit: new overflow row, pointer upsert.
    InlineToOverflow { new: String },
    /// The value shrank (or nulled): drop the old overflow row, then
    /// upsert the raw value or delete the attribute row.
    OverflowToInline { new: Option<String> },
    /// Both oversized: rewrite the overflow row in place, pointer untouched.
    OverflowToOverflow { new: String },
}

impl MutationPlan {
    /// Computes the plan for moving `original` to the state described by
    /// `input`.
    ///
    /// A field is a no-op when it is not a key of the original snapshot
    /// (i.e. not declared for this entity type) or when old and new compare
    /// equal as exact strings. Everything else lands in exactly one bucket
    /// according to the schema's classification.
    pub fn build(schema: &EntitySchema, original: &Entity, input: &FieldMap) -> Self {
        let mut plan = Self::default();

        for (name, new) in input {
            let Some(old) = original.fields.get(name) else {
                continue;
            };
            if old == new {
                continue;
            }

            match schema.classify(name) {
                FieldClass::Base(encoding) => plan.base_updates.push(BaseUpdate {
                    column: name.clone(),
                    literal: encode_literal(new.as_deref(), encoding),
                }),
                FieldClass::Attribute => match new {
                    Some(value) => plan.attr_upserts.push((name.clone(), value.clone())),
                    None => plan.attr_deletes.push(name.clone()),
                },
                FieldClass::TextAttribute => {
                    let transition = classify_transition(old.as_deref(), new);
                    plan.transitions.push((name.clone(), transition));
                }
                FieldClass::Unknown => {}
            }
        }

        plan
    }

    /// True when the plan contains no work at all.
    pub fn is_empty(&self) -> bool {
        self.base_updates.is_empty()
            && self.attr_upserts.is_empty()
            && self.attr_deletes.is_empty()
            && self.transitions.is_empty()
    }
}

fn classify_transition(old: Option<&str>, new: &Option<String>) -> TextTransition {
    let old_class = SizeClass::of(old);
    let new_class = SizeClass::of(new.as_deref());
    match (old_class, new_class) {
        (SizeClass::Inline, SizeClass::Inline) => TextTransition::InlineToInline { new: new.clone() },
        (SizeClass::Inline, SizeClass::Overflow) => TextTransition::InlineToOverflow {
            new: new.clone().unwrap_or_default(),
        },
        (SizeClass::Overflow, SizeClass::Inline) => {
            TextTransition::OverflowToInline { new: new.clone() }
        }
        (SizeClass::Overflow, SizeClass::Overflow) => TextTransition::OverflowToOverflow {
            new: new.clone().unwrap_or_default(),
        },
    }
}

/// Renders a field value as a SQL literal under the given encoding.
/// Null renders as `NULL` regardless of encoding.
pub(crate) fn encode_literal(value: Option<&str>, encoding: FieldEncoding) -> String {
    match (value, encoding) {
        (None, _) => "NULL".to_string(),
        (Some(raw), FieldEncoding::Opaque) => raw.to_string(),
        (Some(raw), FieldEncoding::Numeric) => int_cast(raw).to_string(),
        (Some(raw), FieldEncoding::Text) => quote_text(raw),
    }
}

/// Single-quotes a string with embedded quotes doubled.
pub(crate) fn quote_text(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

/// Integer cast: parse the leading optional-sign digit run, anything
/// else is 0.
fn int_cast(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1i64, &trimmed[1..]),
        Some(b'+') => (1i64, &trimmed[1..]),
        _ => (1i64, trimmed),
    };
    let digits_end = rest
        .as_bytes()
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..digits_end]
        .parse::<i64>()
        .map(|n| sign * n)
        .unwrap_or(0)
}
