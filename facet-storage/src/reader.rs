//! Entity assembly: one main-table row, merged with the attribute side
//! table, with overflow pointers resolved to their full text.

use crate::error::{StorageError, StorageResult};
use facet_model::{AttributeValue, Entity, EntitySchema};
use facet_types::{EntityId, OverflowId};
use rusqlite::params;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::collections::HashMap;
use tracing::warn;

/// Loads one entity snapshot. `Ok(None)` when the main table has no row for
/// the id; query failures are surfaced as errors, not conflated with
/// absence.
pub(crate) fn load(
    conn: &Connection,
    schema: &EntitySchema,
    id: EntityId,
) -> StorageResult<Option<Entity>> {
    let Some(mut entity) = load_main_row(conn, schema, id)? else {
        return Ok(None);
    };

    if schema.has_attributes() {
        merge_attribute_rows(conn, schema, &mut entity)?;
        resolve_overflow(conn, schema, &mut entity)?;
    }

    Ok(Some(entity))
}

fn load_main_row(
    conn: &Connection,
    schema: &EntitySchema,
    id: EntityId,
) -> StorageResult<Option<Entity>> {
    let mut columns = vec![schema.id_column.as_str()];
    columns.extend(schema.base_fields.iter().map(|f| f.name.as_str()));
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ?",
        columns.join(", "),
        schema.main_table,
        schema.id_column
    );

    let row = conn.query_row(&sql, params![id.as_i64()], |row| {
        let mut values = Vec::with_capacity(schema.base_fields.len());
        for i in 0..schema.base_fields.len() {
            values.push(stringify(row.get_ref(i + 1)?));
        }
        Ok(values)
    });

    match row {
        Ok(values) => {
            let mut entity = Entity {
                id,
                fields: Default::default(),
            };
            for (field, value) in schema.base_fields.iter().zip(values) {
                entity.set(&field.name, value);
            }
            Ok(Some(entity))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StorageError::stmt(&schema.main_table, "select", e)),
    }
}

fn merge_attribute_rows(
    conn: &Connection,
    schema: &EntitySchema,
    entity: &mut Entity,
) -> StorageResult<()> {
    for name in &schema.attribute_fields {
        entity.set(name, None);
    }

    let t = &schema.attribute_table;
    let sql = format!(
        "SELECT {}, {} FROM {} WHERE {} = ?",
        t.name_column, t.value_column, t.table, t.entity_column
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| StorageError::stmt(&t.table, "select", e))?;
    let rows: Vec<(String, Option<String>)> = stmt
        .query_map(params![entity.id.as_i64()], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .map_err(|e| StorageError::stmt(&t.table, "select", e))?
        .filter_map(|r| r.ok())
        .collect();

    for (name, value) in rows {
        entity.set(&name, value);
    }
    Ok(())
}

/// Substitutes overflow pointers among the declared text attributes with
/// the referenced content, fetched in one batch.
fn resolve_overflow(
    conn: &Connection,
    schema: &EntitySchema,
    entity: &mut Entity,
) -> StorageResult<()> {
    let mut pointers: Vec<(String, OverflowId)> = Vec::new();
    for name in &schema.text_fields {
        if let Some(oid) = AttributeValue::decode(entity.get(name)).overflow_id() {
            pointers.push((name.clone(), oid));
        }
    }
    if pointers.is_empty() {
        return Ok(());
    }

    let t = &schema.overflow_table;
    let in_clause = pointers
        .iter()
        .map(|(_, oid)| oid.as_i64().to_string())
        .collect::<Vec<_>>()
        .join(",");
    let sql = format!(
        "SELECT {}, {} FROM {} WHERE {} IN ({})",
        t.id_column, t.content_column, t.table, t.id_column, in_clause
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| StorageError::stmt(&t.table, "select", e))?;
    let contents: HashMap<i64, String> = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))
        .map_err(|e| StorageError::stmt(&t.table, "select", e))?
        .filter_map(|r| r.ok())
        .collect();

    for (name, oid) in pointers {
        match contents.get(&oid.as_i64()) {
            Some(content) => entity.set(&name, Some(content.clone())),
            None => {
                warn!(
                    entity = entity.id.as_i64(),
                    field = %name,
                    overflow = oid.as_i64(),
                    "dangling overflow pointer, resolving to null"
                );
                entity.set(&name, None);
            }
        }
    }
    Ok(())
}

fn stringify(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(r) => Some(r.to_string()),
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
    }
}
