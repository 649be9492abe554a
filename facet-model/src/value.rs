//! Tagged representation of a stored attribute value.
//!
//! The attribute table's value column holds either the text itself (inline)
//! or a pointer to the overflow table, encoded as a single leading space
//! followed by the decimal overflow-row id. Ordinary values never match that
//! shape, which is what makes the pointer distinguishable in place. This
//! module keeps the wire form bit-exact while giving the rest of the engine
//! an explicit sum type to match on.

use facet_types::OverflowId;
use serde::{Deserialize, Serialize};

/// Maximum byte length a text attribute may have and still be stored inline
/// in its attribute row. Longer values move to the overflow table.
///
/// The limit is inclusive: a value of exactly this length stays inline.
pub const INLINE_LIMIT: usize = 255;

/// A stored attribute value, as found in the attribute table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// The text is stored directly in the attribute row.
    Inline(String),
    /// The attribute row holds a pointer into the overflow table.
    Overflow(OverflowId),
    /// No attribute row exists; the attribute is logically null.
    Absent,
}

impl AttributeValue {
    /// Decodes a raw value-column read into its tagged form.
    ///
    /// `None` (no row, or SQL NULL) is [`AttributeValue::Absent`]. A value
    /// consisting of one leading space and nothing but decimal digits is an
    /// overflow pointer; everything else is inline text. Never fails —
    /// unparseable pointer-shaped strings fall back to inline.
    pub fn decode(stored: Option<&str>) -> Self {
        let Some(raw) = stored else {
            return Self::Absent;
        };
        if let Some(digits) = raw.strip_prefix(' ') {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(id) = digits.parse::<i64>() {
                    return Self::Overflow(OverflowId::from_raw(id));
                }
            }
        }
        Self::Inline(raw.to_string())
    }

    /// Encodes the tagged form back into the value-column representation.
    ///
    /// The overflow pointer renders as `" {id}"`, byte-identical to what the
    /// decode side recognizes.
    pub fn encode(&self) -> Option<String> {
        match self {
            Self::Inline(text) => Some(text.clone()),
            Self::Overflow(id) => Some(Self::pointer_to(*id)),
            Self::Absent => None,
        }
    }

    /// The stored form of a pointer to `id`: one space, then decimal digits.
    pub fn pointer_to(id: OverflowId) -> String {
        format!(" {id}")
    }

    /// Returns the overflow id if this value is a pointer.
    pub fn overflow_id(&self) -> Option<OverflowId> {
        match self {
            Self::Overflow(id) => Some(*id),
            _ => None,
        }
    }
}

/// Which of the two storage representations a text value belongs in,
/// judged purely by its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    /// At most [`INLINE_LIMIT`] bytes (null counts as inline).
    Inline,
    /// Strictly more than [`INLINE_LIMIT`] bytes.
    Overflow,
}

impl SizeClass {
    /// Classifies a value by byte length. Null classifies inline.
    pub fn of(value: Option<&str>) -> Self {
        match value {
            Some(text) if text.len() > INLINE_LIMIT => Self::Overflow,
            _ => Self::Inline,
        }
    }
}
