use std::collections::HashSet;
use std::str::FromStr;
use wrapkit_types::{Error, HandleId};

// ── HandleId ──────────────────────────────────────────────────────

#[test]
fn handle_id_new_is_unique() {
    let a = HandleId::new();
    let b = HandleId::new();
    assert_ne!(a, b);
}

#[test]
fn handle_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::now_v7();
    let id = HandleId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}

#[test]
fn handle_id_display_and_parse() {
    let id = HandleId::new();
    let parsed = HandleId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn handle_id_from_str() {
    let id = HandleId::new();
    let parsed = HandleId::from_str(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn handle_id_parse_invalid() {
    let err = HandleId::parse("not-a-uuid").unwrap_err();
    assert!(matches!(err, Error::InvalidUuid(_)));
    assert!(err.to_string().starts_with("invalid handle id"));
    assert!(HandleId::from_str("garbage").is_err());
}

#[test]
fn handle_id_orders_by_creation() {
    let a = HandleId::new();
    let b = HandleId::new();
    assert!(a < b);
}

#[test]
fn handle_id_hash_and_eq() {
    let id = HandleId::new();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id);
    assert_eq!(set.len(), 1);
}

#[test]
fn handle_id_serializes_as_plain_uuid() {
    let id = HandleId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
    let parsed: HandleId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn handle_id_debug_contains_type_name() {
    let debug = format!("{:?}", HandleId::new());
    assert!(debug.contains("HandleId"));
}
