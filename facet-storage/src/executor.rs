//! Turns a [`MutationPlan`] into statements.
//!
//! Text transitions are materialized first so their overflow writes are
//! durable before the attribute batch commits any pointer referencing them.
//! After that at most three statements run: the attribute delete, the
//! batched attribute upsert, and the main-table update. The returned count
//! sums those three; overflow side effects are not counted.

use crate::error::{StorageError, StorageResult};
use crate::overflow;
use crate::plan::{quote_text, MutationPlan, TextTransition};
use facet_model::{AttributeValue, EntitySchema};
use facet_types::EntityId;
use rusqlite::{params, Connection};
use tracing::{debug, warn};

pub(crate) fn execute(
    conn: &Connection,
    schema: &EntitySchema,
    id: EntityId,
    plan: &MutationPlan,
) -> StorageResult<usize> {
    let mut upserts = plan.attr_upserts.clone();
    let mut deletes = plan.attr_deletes.clone();

    for (name, transition) in &plan.transitions {
        apply_transition(conn, schema, id, name, transition, &mut upserts, &mut deletes)?;
    }

    let mut affected = 0;
    if !deletes.is_empty() {
        affected += delete_attributes(conn, schema, id, &deletes)?;
    }
    if !upserts.is_empty() {
        affected += upsert_attributes(conn, schema, id, &upserts)?;
    }
    if !plan.base_updates.is_empty() {
        affected += update_base(conn, schema, id, plan)?;
    }

    debug!(
        entity = id.as_i64(),
        entity_type = %schema.entity_type,
        deletes = deletes.len(),
        upserts = upserts.len(),
        base = plan.base_updates.len(),
        affected,
        "executed mutation plan"
    );
    Ok(affected)
}

/// Performs a transition's overflow side effects and appends the attribute
/// row consequence to the pending batches.
fn apply_transition(
    conn: &Connection,
    schema: &EntitySchema,
    id: EntityId,
    name: &str,
    transition: &TextTransition,
    upserts: &mut Vec<(String, String)>,
    deletes: &mut Vec<String>,
) -> StorageResult<()> {
    match transition {
        TextTransition::InlineToInline { new } => match new {
            Some(value) => upserts.push((name.to_string(), value.clone())),
            None => deletes.push(name.to_string()),
        },
        TextTransition::InlineToOverflow { new } => {
            let oid = overflow::insert_content(conn, schema, new)?;
            upserts.push((name.to_string(), AttributeValue::pointer_to(oid)));
        }
        TextTransition::OverflowToInline { new } => {
            match overflow::stored_pointer(conn, schema, id, name)? {
                Some(oid) => {
                    overflow::delete_row(conn, schema, oid)?;
                }
                None => warn!(
                    entity = id.as_i64(),
                    field = name,
                    "no overflow pointer to delete for shrinking text attribute"
                ),
            }
            match new {
                Some(value) => upserts.push((name.to_string(), value.clone())),
                None => deletes.push(name.to_string()),
            }
        }
        TextTransition::OverflowToOverflow { new } => {
            let rewritten = match overflow::stored_pointer(conn, schema, id, name)? {
                Some(oid) => overflow::update_content(conn, schema, oid, new)? > 0,
                None => false,
            };
            if !rewritten {
                // Pointer or row went missing; recover with a fresh row.
                warn!(
                    entity = id.as_i64(),
                    field = name,
                    "overflow row unresolvable, rewriting pointer"
                );
                let oid = overflow::insert_content(conn, schema, new)?;
                upserts.push((name.to_string(), AttributeValue::pointer_to(oid)));
            }
        }
    }
    Ok(())
}

fn delete_attributes(
    conn: &Connection,
    schema: &EntitySchema,
    id: EntityId,
    names: &[String],
) -> StorageResult<usize> {
    let t = &schema.attribute_table;
    let in_clause = names
        .iter()
        .map(|n| quote_text(n))
        .collect::<Vec<_>>()
        .join(",");
    let sql = format!(
        "DELETE FROM {} WHERE {} = ? AND {} IN ({})",
        t.table, t.entity_column, t.name_column, in_clause
    );
    conn.execute(&sql, params![id.as_i64()])
        .map_err(|e| StorageError::stmt(&t.table, "delete", e))
}

fn upsert_attributes(
    conn: &Connection,
    schema: &EntitySchema,
    id: EntityId,
    pairs: &[(String, String)],
) -> StorageResult<usize> {
    let t = &schema.attribute_table;
    let rows = pairs
        .iter()
        .map(|(name, value)| format!("({}, {}, {})", id.as_i64(), quote_text(name), quote_text(value)))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {table} ({entity}, {name}, {value}) VALUES {rows} \
         ON CONFLICT({entity}, {name}) DO UPDATE SET {value} = excluded.{value}",
        table = t.table,
        entity = t.entity_column,
        name = t.name_column,
        value = t.value_column,
    );
    conn.execute(&sql, [])
        .map_err(|e| StorageError::stmt(&t.table, "upsert", e))
}

fn update_base(
    conn: &Connection,
    schema: &EntitySchema,
    id: EntityId,
    plan: &MutationPlan,
) -> StorageResult<usize> {
    let assignments = plan
        .base_updates
        .iter()
        .map(|u| format!("{} = {}", u.column, u.literal))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        schema.main_table, assignments, schema.id_column
    );
    conn.execute(&sql, params![id.as_i64()])
        .map_err(|e| StorageError::stmt(&schema.main_table, "update", e))
}
