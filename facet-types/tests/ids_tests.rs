use facet_types::{EntityId, OverflowId};

// ── EntityId ─────────────────────────────────────────────────────

#[test]
fn entity_id_round_trips_raw_value() {
    let id = EntityId::from_raw(42);
    assert_eq!(id.as_i64(), 42);
}

#[test]
fn entity_id_display_is_decimal() {
    assert_eq!(EntityId::from_raw(1007).to_string(), "1007");
}

#[test]
fn entity_id_parses_from_string() {
    let id: EntityId = "314".parse().unwrap();
    assert_eq!(id, EntityId::from_raw(314));
}

#[test]
fn entity_id_parse_rejects_garbage() {
    assert!(EntityId::parse("abc").is_err());
    assert!(EntityId::parse("").is_err());
    assert!(EntityId::parse("12 ").is_err());
}

#[test]
fn entity_id_orders_like_integers() {
    assert!(EntityId::from_raw(2) < EntityId::from_raw(10));
}

// ── OverflowId ───────────────────────────────────────────────────

#[test]
fn overflow_id_round_trips_raw_value() {
    let id = OverflowId::from_raw(9);
    assert_eq!(id.as_i64(), 9);
    assert_eq!(id.to_string(), "9");
}

#[test]
fn overflow_id_parses_from_string() {
    let id: OverflowId = "88".parse().unwrap();
    assert_eq!(id, OverflowId::from_raw(88));
}

#[test]
fn overflow_id_parse_rejects_signed_noise() {
    assert!(OverflowId::parse("7x").is_err());
}
