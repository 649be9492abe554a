use facet_model::{AttributeValue, BaseField, Entity, EntitySchema, FieldMap, INLINE_LIMIT};
use facet_storage::{EntityStore, StorageError};
use facet_types::EntityId;
use pretty_assertions::assert_eq;

fn article_schema() -> EntitySchema {
    let mut schema = EntitySchema::new("article", "articles", "article_id");
    schema.base_fields = vec![BaseField::text("title"), BaseField::numeric("views")];
    schema.attribute_fields = vec!["subtitle".into(), "body".into()];
    schema.text_fields = vec!["body".into()];
    schema
}

fn store() -> EntityStore {
    EntityStore::open_in_memory(article_schema()).unwrap()
}

fn fm(pairs: &[(&str, Option<&str>)]) -> FieldMap {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.map(str::to_string)))
        .collect()
}

fn long(len: usize) -> String {
    "x".repeat(len)
}

// ── Insert & load ────────────────────────────────────────────────

#[test]
fn insert_then_load_round_trips() {
    let store = store();
    let id = store
        .insert(&fm(&[
            ("title", Some("First")),
            ("views", Some("3")),
            ("subtitle", Some("sub")),
            ("body", Some("short body")),
        ]))
        .unwrap();

    let entity = store.load_by_id(id).unwrap().unwrap();
    assert_eq!(entity.get("title"), Some("First"));
    assert_eq!(entity.get("views"), Some("3"));
    assert_eq!(entity.get("subtitle"), Some("sub"));
    assert_eq!(entity.get("body"), Some("short body"));
}

#[test]
fn load_missing_entity_is_none() {
    let store = store();
    assert!(store.load_by_id(EntityId::from_raw(404)).unwrap().is_none());
}

#[test]
fn generated_ids_are_sequential_rowids() {
    let store = store();
    let a = store.insert(&fm(&[("title", Some("a"))])).unwrap();
    let b = store.insert(&fm(&[("title", Some("b"))])).unwrap();
    assert!(b > a);
}

#[test]
fn sparse_insert_creates_no_rows_for_absent_attributes() {
    let store = store();
    let id = store
        .insert(&fm(&[("title", Some("t")), ("subtitle", Some("only this"))]))
        .unwrap();

    let rows = store.attribute_rows(id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "subtitle");

    // The absent field still loads as a declared null.
    let entity = store.load_by_id(id).unwrap().unwrap();
    assert!(entity.contains("body"));
    assert!(entity.is_null("body"));
}

#[test]
fn insert_with_explicit_null_attribute_creates_no_row() {
    let store = store();
    let id = store
        .insert(&fm(&[("title", Some("t")), ("subtitle", None)]))
        .unwrap();
    assert!(store.attribute_rows(id).unwrap().is_empty());
}

// ── Inline / overflow round trips ────────────────────────────────

#[test]
fn inline_text_round_trips_without_overflow_row() {
    let store = store();
    let text = long(INLINE_LIMIT);
    let id = store.insert(&fm(&[("body", Some(&text))])).unwrap();

    assert_eq!(store.load_by_id(id).unwrap().unwrap().get("body"), Some(text.as_str()));
    assert_eq!(store.overflow_row_count().unwrap(), 0);

    let rows = store.attribute_rows(id).unwrap();
    assert_eq!(rows[0].1.as_deref(), Some(text.as_str()));
}

#[test]
fn oversized_text_round_trips_through_one_overflow_row() {
    let store = store();
    let text = long(INLINE_LIMIT + 1);
    let id = store.insert(&fm(&[("body", Some(&text))])).unwrap();

    assert_eq!(store.load_by_id(id).unwrap().unwrap().get("body"), Some(text.as_str()));
    assert_eq!(store.overflow_row_count().unwrap(), 1);

    // The attribute row itself holds only the pointer.
    let rows = store.attribute_rows(id).unwrap();
    let stored = AttributeValue::decode(rows[0].1.as_deref());
    assert!(stored.overflow_id().is_some());
}

// ── Update semantics ─────────────────────────────────────────────

#[test]
fn noop_save_reports_zero_affected() {
    let store = store();
    let id = store
        .insert(&fm(&[("title", Some("t")), ("subtitle", Some("s"))]))
        .unwrap();
    let original = store.load_by_id(id).unwrap().unwrap();

    let input: FieldMap = original.fields.clone();
    let outcome = store.save(Some(id), &input, Some(&original)).unwrap();
    assert_eq!(outcome.affected, 0);
    assert_eq!(outcome.id, id);
}

#[test]
fn update_missing_entity_is_not_found() {
    let store = store();
    let err = store
        .update(EntityId::from_raw(999), &fm(&[("title", Some("x"))]), None)
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[test]
fn base_field_update_is_visible_on_reload() {
    let store = store();
    let id = store.insert(&fm(&[("title", Some("before"))])).unwrap();

    let affected = store.update(id, &fm(&[("title", Some("after"))]), None).unwrap();
    assert_eq!(affected, 1);
    assert_eq!(
        store.load_by_id(id).unwrap().unwrap().get("title"),
        Some("after")
    );
}

#[test]
fn numeric_field_stores_the_cast_value() {
    let store = store();
    let id = store.insert(&fm(&[("views", Some("12abc"))])).unwrap();
    assert_eq!(store.load_by_id(id).unwrap().unwrap().get("views"), Some("12"));

    store.update(id, &fm(&[("views", Some("7.5"))]), None).unwrap();
    assert_eq!(store.load_by_id(id).unwrap().unwrap().get("views"), Some("7"));
}

#[test]
fn null_clears_the_attribute_row() {
    let store = store();
    let id = store.insert(&fm(&[("subtitle", Some("here"))])).unwrap();
    assert_eq!(store.attribute_rows(id).unwrap().len(), 1);

    store.update(id, &fm(&[("subtitle", None)]), None).unwrap();
    assert!(store.attribute_rows(id).unwrap().is_empty());
    assert!(store.load_by_id(id).unwrap().unwrap().is_null("subtitle"));
}

#[test]
fn diff_runs_against_the_supplied_original_not_the_database() {
    let store = store();
    let id = store.insert(&fm(&[("title", Some("db value"))])).unwrap();

    // Caller claims the entity already holds the new value: empty diff,
    // nothing written. The equality filter is not a conflict detector.
    let mut claimed = Entity::blank(id, store.schema());
    claimed.set("title", Some("new".into()));
    let affected = store
        .update(id, &fm(&[("title", Some("new"))]), Some(&claimed))
        .unwrap();
    assert_eq!(affected, 0);
    assert_eq!(
        store.load_by_id(id).unwrap().unwrap().get("title"),
        Some("db value")
    );
}

#[test]
fn quotes_in_values_survive_round_trip() {
    let store = store();
    let id = store
        .insert(&fm(&[
            ("title", Some("it's quoted")),
            ("subtitle", Some("o'clock")),
        ]))
        .unwrap();
    let entity = store.load_by_id(id).unwrap().unwrap();
    assert_eq!(entity.get("title"), Some("it's quoted"));
    assert_eq!(entity.get("subtitle"), Some("o'clock"));
}

// ── save() dispatch ──────────────────────────────────────────────

#[test]
fn save_without_id_inserts() {
    let store = store();
    let outcome = store.save(None, &fm(&[("title", Some("new"))]), None).unwrap();
    assert!(outcome.affected >= 1);
    assert_eq!(
        store.load_by_id(outcome.id).unwrap().unwrap().get("title"),
        Some("new")
    );
}

#[test]
fn save_with_id_updates() {
    let store = store();
    let id = store.insert(&fm(&[("title", Some("v1"))])).unwrap();
    let outcome = store.save(Some(id), &fm(&[("title", Some("v2"))]), None).unwrap();
    assert_eq!(outcome.id, id);
    assert_eq!(outcome.affected, 1);
}

// ── Durability & atomicity ───────────────────────────────────────

#[test]
fn file_backed_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.db");

    let id = {
        let store = EntityStore::open(&path, article_schema()).unwrap();
        store
            .insert(&fm(&[("title", Some("kept")), ("body", Some(&long(300)))]))
            .unwrap()
    };

    let reopened = EntityStore::open(&path, article_schema()).unwrap();
    let entity = reopened.load_by_id(id).unwrap().unwrap();
    assert_eq!(entity.get("title"), Some("kept"));
    assert_eq!(entity.get("body"), Some(long(300).as_str()));
}

#[test]
fn save_rolls_back_as_one_unit() {
    // A failed statement takes the whole save down with it, attribute
    // writes included.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.db");

    let store = EntityStore::open(&path, article_schema()).unwrap();
    let id = store.insert(&fm(&[("subtitle", Some("v1"))])).unwrap();

    // Same tables, but a schema declaring a base column the main table does
    // not have: the attribute upsert succeeds, the base update then fails.
    let mut broken = article_schema();
    broken.base_fields.push(BaseField::text("missing_col"));
    let misconfigured = EntityStore::open(&path, broken.clone()).unwrap();

    let mut original = Entity::blank(id, &broken);
    original.set("subtitle", Some("v1".into()));
    let err = misconfigured.update(
        id,
        &fm(&[("subtitle", Some("v2")), ("missing_col", Some("x"))]),
        Some(&original),
    );
    assert!(err.is_err());

    // The upsert that had already run was rolled back with the failure.
    let entity = store.load_by_id(id).unwrap().unwrap();
    assert_eq!(entity.get("subtitle"), Some("v1"));
}

#[test]
fn statement_failure_names_table_and_operation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("articles.db");
    let store = EntityStore::open(&path, article_schema()).unwrap();
    let id = store.insert(&fm(&[("title", Some("t"))])).unwrap();

    let mut broken = article_schema();
    broken.base_fields.push(BaseField::text("missing_col"));
    let misconfigured = EntityStore::open(&path, broken.clone()).unwrap();

    let original = Entity::blank(id, &broken);
    let err = misconfigured
        .update(id, &fm(&[("missing_col", Some("x"))]), Some(&original))
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("articles"), "got: {message}");
    assert!(message.contains("update"), "got: {message}");
}
