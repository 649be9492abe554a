//! The public surface of the engine: one store per entity type.

use crate::cache::{cache_key, invalidate, EntityCache};
use crate::error::{StorageError, StorageResult};
use crate::plan::MutationPlan;
use crate::{executor, reader};
use facet_model::{Entity, EntitySchema, FieldClass, FieldEncoding, FieldMap};
use facet_types::{EntityId, OverflowId};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Entity store backed by SQLite.
///
/// Owns the connection and the schema descriptor for one entity type, and
/// optionally consults an [`EntityCache`] around reads. All operations are
/// synchronous; each mutation runs inside a single transaction, so the
/// overflow writes, attribute batches and base update of one `save` commit
/// or roll back together.
#[derive(Clone)]
pub struct EntityStore {
    conn: Arc<Mutex<Connection>>,
    schema: EntitySchema,
    cache: Option<Arc<dyn EntityCache>>,
}

/// What a successful [`EntityStore::save`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    /// The entity written: the supplied id on update, the generated one on
    /// insert.
    pub id: EntityId,
    /// Summed affected-row count of the executed statements.
    pub affected: usize,
}

impl EntityStore {
    /// Opens or creates a store at the given path.
    pub fn open(path: &Path, schema: EntitySchema) -> StorageResult<Self> {
        let conn = crate::open_sqlite(path)?;
        initialize_tables(&conn, &schema)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            schema,
            cache: None,
        })
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory(schema: EntitySchema) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_tables(&conn, &schema)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            schema,
            cache: None,
        })
    }

    /// Attaches a cache consulted by [`load_by_id`](Self::load_by_id) and
    /// evicted after every successful mutation.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn EntityCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The schema this store was opened with.
    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Loads a fully resolved entity snapshot. `Ok(None)` when absent.
    pub fn load_by_id(&self, id: EntityId) -> StorageResult<Option<Entity>> {
        let key = cache_key(&self.schema.entity_type, id);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                return Ok(Some(hit));
            }
        }

        let conn = self.conn.lock().unwrap();
        let loaded = reader::load(&conn, &self.schema, id)?;
        drop(conn);

        if let (Some(cache), Some(entity)) = (&self.cache, &loaded) {
            cache.put(&key, entity);
        }
        Ok(loaded)
    }

    /// Writes an entity: `id: None` inserts a fresh row, `id: Some` updates
    /// an existing one against `original` (fetched by id when not supplied;
    /// a missing entity is [`StorageError::NotFound`]).
    pub fn save(
        &self,
        id: Option<EntityId>,
        input: &FieldMap,
        original: Option<&Entity>,
    ) -> StorageResult<SaveOutcome> {
        match id {
            None => {
                let (new_id, affected) = self.insert_inner(input)?;
                Ok(SaveOutcome {
                    id: new_id,
                    affected,
                })
            }
            Some(id) => {
                let affected = self.update(id, input, original)?;
                Ok(SaveOutcome { id, affected })
            }
        }
    }

    /// Creates a new entity from the input map and returns its generated id.
    ///
    /// Every base field present in the input goes into the main-table
    /// insert; attributes then run through the standard diff against an
    /// all-null original, so nothing is ever deleted on this path and
    /// absent fields produce no rows.
    pub fn insert(&self, input: &FieldMap) -> StorageResult<EntityId> {
        Ok(self.insert_inner(input)?.0)
    }

    /// Applies the diff between `original` and `input` to an existing
    /// entity, returning the summed affected-row count (0 for an empty
    /// diff).
    pub fn update(
        &self,
        id: EntityId,
        input: &FieldMap,
        original: Option<&Entity>,
    ) -> StorageResult<usize> {
        let fetched;
        let original = match original {
            Some(entity) => entity,
            None => {
                fetched = self
                    .load_by_id(id)?
                    .ok_or(StorageError::NotFound(id))?;
                &fetched
            }
        };

        let plan = MutationPlan::build(&self.schema, original, input);
        debug!(
            entity = id.as_i64(),
            entity_type = %self.schema.entity_type,
            base = plan.base_updates.len(),
            upserts = plan.attr_upserts.len(),
            deletes = plan.attr_deletes.len(),
            transitions = plan.transitions.len(),
            "planned update"
        );

        let affected = if plan.is_empty() {
            0
        } else {
            let mut conn = self.conn.lock().unwrap();
            let tx = conn.transaction()?;
            let affected = executor::execute(&tx, &self.schema, id, &plan)?;
            tx.commit()?;
            affected
        };

        self.invalidate_after(id);
        Ok(affected)
    }

    fn insert_inner(&self, input: &FieldMap) -> StorageResult<(EntityId, usize)> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let mut columns = Vec::new();
        let mut literals = Vec::new();
        for field in &self.schema.base_fields {
            if let Some(value) = input.get(&field.name) {
                columns.push(field.name.as_str());
                literals.push(crate::plan::encode_literal(value.as_deref(), field.encoding));
            }
        }
        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", self.schema.main_table)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.schema.main_table,
                columns.join(", "),
                literals.join(", ")
            )
        };
        tx.execute(&sql, [])
            .map_err(|e| StorageError::stmt(&self.schema.main_table, "insert", e))?;
        let id = EntityId::from_raw(tx.last_insert_rowid());

        // Attributes diff against the all-null snapshot of the fresh id.
        let attr_input: FieldMap = input
            .iter()
            .filter(|(name, _)| {
                !matches!(self.schema.classify(name), FieldClass::Base(_))
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let blank = Entity::blank(id, &self.schema);
        let plan = MutationPlan::build(&self.schema, &blank, &attr_input);
        let affected = 1 + executor::execute(&tx, &self.schema, id, &plan)?;

        tx.commit()?;
        drop(conn);

        self.invalidate_after(id);
        debug!(
            entity = id.as_i64(),
            entity_type = %self.schema.entity_type,
            affected,
            "inserted entity"
        );
        Ok((id, affected))
    }

    fn invalidate_after(&self, id: EntityId) {
        if let Some(cache) = &self.cache {
            invalidate(cache.as_ref(), &self.schema.entity_type, &[id]);
        }
    }

    // ── Inspection ───────────────────────────────────────────────

    /// Raw `(name, stored value)` rows of an entity's attribute table, as
    /// persisted — overflow pointers are not resolved.
    pub fn attribute_rows(
        &self,
        id: EntityId,
    ) -> StorageResult<Vec<(String, Option<String>)>> {
        let conn = self.conn.lock().unwrap();
        let t = &self.schema.attribute_table;
        let sql = format!(
            "SELECT {}, {} FROM {} WHERE {} = ? ORDER BY {}",
            t.name_column, t.value_column, t.table, t.entity_column, t.name_column
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StorageError::stmt(&t.table, "select", e))?;
        let rows = stmt
            .query_map(params![id.as_i64()], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(|e| StorageError::stmt(&t.table, "select", e))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Total number of rows in the overflow table.
    pub fn overflow_row_count(&self) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();
        let t = &self.schema.overflow_table;
        let sql = format!("SELECT COUNT(*) FROM {}", t.table);
        let count: i64 = conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| StorageError::stmt(&t.table, "select", e))?;
        Ok(count as usize)
    }

    /// Overflow rows no attribute row of this store's attribute table
    /// points at. Audit only — the engine never deletes them on its own.
    pub fn find_orphaned_overflow(&self) -> StorageResult<Vec<OverflowId>> {
        let conn = self.conn.lock().unwrap();
        let o = &self.schema.overflow_table;
        let a = &self.schema.attribute_table;
        let sql = format!(
            "SELECT o.{oid} FROM {ovf} o \
             WHERE NOT EXISTS (\
                 SELECT 1 FROM {attr} a WHERE a.{av} = ' ' || CAST(o.{oid} AS TEXT)\
             ) ORDER BY o.{oid}",
            oid = o.id_column,
            ovf = o.table,
            attr = a.table,
            av = a.value_column,
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StorageError::stmt(&o.table, "select", e))?;
        let ids = stmt
            .query_map([], |row| Ok(OverflowId::from_raw(row.get(0)?)))
            .map_err(|e| StorageError::stmt(&o.table, "select", e))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(ids)
    }
}

fn initialize_tables(conn: &Connection, schema: &EntitySchema) -> StorageResult<()> {
    let mut base_columns = String::new();
    for field in &schema.base_fields {
        let sql_type = match field.encoding {
            FieldEncoding::Numeric => "INTEGER",
            FieldEncoding::Opaque | FieldEncoding::Text => "TEXT",
        };
        base_columns.push_str(&format!(",\n    {} {}", field.name, sql_type));
    }

    let a = &schema.attribute_table;
    let o = &schema.overflow_table;
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {main} (
    {id} INTEGER PRIMARY KEY AUTOINCREMENT{base_columns}
);
CREATE TABLE IF NOT EXISTS {attr} (
    {ae} INTEGER NOT NULL,
    {an} TEXT NOT NULL,
    {av} TEXT,
    PRIMARY KEY ({ae}, {an})
);
CREATE TABLE IF NOT EXISTS {ovf} (
    {oi} INTEGER PRIMARY KEY AUTOINCREMENT,
    {oc} TEXT NOT NULL
);",
        main = schema.main_table,
        id = schema.id_column,
        attr = a.table,
        ae = a.entity_column,
        an = a.name_column,
        av = a.value_column,
        ovf = o.table,
        oi = o.id_column,
        oc = o.content_column,
    ))?;
    Ok(())
}
