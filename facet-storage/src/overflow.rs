//! DML against the shared overflow table, plus pointer resolution.
//!
//! The overflow table is the second home of a text attribute: a bare
//! `(id, content)` row referenced by the pointer stored in the attribute
//! row. All access is by exact id; resolving the id of the row an attribute
//! currently references goes through the attribute row's stored value.

use crate::error::{StorageError, StorageResult};
use facet_model::{AttributeValue, EntitySchema};
use facet_types::{EntityId, OverflowId};
use rusqlite::{params, Connection};

/// Inserts a new overflow row and returns its generated id.
pub(crate) fn insert_content(
    conn: &Connection,
    schema: &EntitySchema,
    content: &str,
) -> StorageResult<OverflowId> {
    let t = &schema.overflow_table;
    let sql = format!("INSERT INTO {} ({}) VALUES (?)", t.table, t.content_column);
    conn.execute(&sql, params![content])
        .map_err(|e| StorageError::stmt(&t.table, "insert", e))?;
    Ok(OverflowId::from_raw(conn.last_insert_rowid()))
}

/// Rewrites an overflow row's content in place. Returns the affected count
/// (0 when the row no longer exists).
pub(crate) fn update_content(
    conn: &Connection,
    schema: &EntitySchema,
    id: OverflowId,
    content: &str,
) -> StorageResult<usize> {
    let t = &schema.overflow_table;
    let sql = format!(
        "UPDATE {} SET {} = ? WHERE {} = ?",
        t.table, t.content_column, t.id_column
    );
    conn.execute(&sql, params![content, id.as_i64()])
        .map_err(|e| StorageError::stmt(&t.table, "update", e))
}

/// Deletes an overflow row by id.
pub(crate) fn delete_row(
    conn: &Connection,
    schema: &EntitySchema,
    id: OverflowId,
) -> StorageResult<usize> {
    let t = &schema.overflow_table;
    let sql = format!("DELETE FROM {} WHERE {} = ?", t.table, t.id_column);
    conn.execute(&sql, params![id.as_i64()])
        .map_err(|e| StorageError::stmt(&t.table, "delete", e))
}

/// Resolves the overflow row an attribute currently points at, by reading
/// the attribute row and decoding its value. `None` when the attribute row
/// is missing or does not hold a pointer.
pub(crate) fn stored_pointer(
    conn: &Connection,
    schema: &EntitySchema,
    entity: EntityId,
    name: &str,
) -> StorageResult<Option<OverflowId>> {
    let t = &schema.attribute_table;
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ? AND {} = ?",
        t.value_column, t.table, t.entity_column, t.name_column
    );
    let stored: Result<Option<String>, rusqlite::Error> =
        conn.query_row(&sql, params![entity.as_i64(), name], |row| row.get(0));
    match stored {
        Ok(value) => Ok(AttributeValue::decode(value.as_deref()).overflow_id()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StorageError::stmt(&t.table, "select", e)),
    }
}
