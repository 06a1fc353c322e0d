use pretty_assertions::assert_eq;
use std::io::Write;
use wrapkit_runtime::{ForeignRuntime, MemoryRuntime, RuntimeError, Snapshot};
use wrapkit_types::ForeignValue;

const DRIVETRAIN: &str = r#"{
    "types": [
        {"name": "Component"},
        {"name": "Bearing", "base": "Component"},
        {"name": "Shaft", "base": "Component"},
        {"name": "ComponentList"}
    ],
    "enums": {"LubricantType": ["Mineral", "Synthetic"]},
    "objects": [
        {"key": "b1", "type": "Bearing", "properties": {
            "Id": 1, "Name": "Front", "Bore": 25.5,
            "Lubricant": {"enum": "LubricantType", "member": "Synthetic"},
            "Factor": {"value": 0.8, "overridden": true},
            "Mount": {"ref": "s1"},
            "Notes": null
        }},
        {"key": "s1", "type": "Shaft", "properties": {"Id": 2, "Name": "Main", "Tags": ["a", "b"]}},
        {"key": "parts", "type": "ComponentList", "items": ["b1", "s1"]}
    ],
    "roots": {"parts": "parts"}
}"#;

#[test]
fn loads_types_objects_and_roots() {
    let rt = MemoryRuntime::from_snapshot(&Snapshot::from_json_str(DRIVETRAIN).unwrap()).unwrap();
    let parts = rt.root("parts").unwrap();
    let items = rt.items(parts).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(rt.type_of(items[0]).unwrap(), "Bearing");
    assert_eq!(rt.base_type("Bearing").as_deref(), Some("Component"));
    assert_eq!(rt.object_count(), 3);
}

#[test]
fn resolves_value_shapes() {
    let rt = MemoryRuntime::from_snapshot(&Snapshot::from_json_str(DRIVETRAIN).unwrap()).unwrap();
    let parts = rt.root("parts").unwrap();
    let items = rt.items(parts).unwrap();
    let (bearing, shaft) = (items[0], items[1]);

    assert_eq!(rt.get_property(bearing, "Id").unwrap(), ForeignValue::Int(1));
    assert_eq!(rt.get_property(bearing, "Bore").unwrap(), ForeignValue::Float(25.5));
    assert_eq!(
        rt.get_property(bearing, "Lubricant").unwrap(),
        ForeignValue::enum_member("LubricantType", "Synthetic")
    );
    assert_eq!(
        rt.get_property(bearing, "Factor").unwrap(),
        ForeignValue::overridable(ForeignValue::Float(0.8), true)
    );
    assert_eq!(rt.get_property(bearing, "Mount").unwrap(), ForeignValue::Handle(shaft));
    assert!(rt.get_property(bearing, "Notes").unwrap().is_null());
    assert_eq!(
        rt.get_property(shaft, "Tags").unwrap(),
        ForeignValue::List(vec!["a".into(), "b".into()])
    );
}

#[test]
fn each_load_mints_fresh_handles() {
    let snapshot = Snapshot::from_json_str(DRIVETRAIN).unwrap();
    let a = MemoryRuntime::from_snapshot(&snapshot).unwrap();
    let b = MemoryRuntime::from_snapshot(&snapshot).unwrap();
    assert_ne!(a.root("parts"), b.root("parts"));
}

#[test]
fn rejects_dangling_reference() {
    let json = r#"{"types": [{"name": "T"}],
        "objects": [{"key": "a", "type": "T", "properties": {"Next": {"ref": "missing"}}}]}"#;
    let err = MemoryRuntime::from_snapshot(&Snapshot::from_json_str(json).unwrap()).unwrap_err();
    assert!(matches!(err, RuntimeError::Snapshot(msg) if msg.contains("missing")));
}

#[test]
fn rejects_undeclared_base() {
    let json = r#"{"types": [{"name": "Bearing", "base": "Component"}]}"#;
    let err = MemoryRuntime::from_snapshot(&Snapshot::from_json_str(json).unwrap()).unwrap_err();
    assert!(matches!(err, RuntimeError::Snapshot(_)));
}

#[test]
fn rejects_duplicate_keys() {
    let json = r#"{"types": [{"name": "T"}],
        "objects": [{"key": "a", "type": "T"}, {"key": "a", "type": "T"}]}"#;
    let err = MemoryRuntime::from_snapshot(&Snapshot::from_json_str(json).unwrap()).unwrap_err();
    assert!(matches!(err, RuntimeError::Snapshot(msg) if msg.contains("twice")));
}

#[test]
fn rejects_unknown_enum_member() {
    let json = r#"{"types": [{"name": "T"}], "enums": {"E": ["X"]},
        "objects": [{"key": "a", "type": "T", "properties": {"Kind": {"enum": "E", "member": "Y"}}}]}"#;
    let err = MemoryRuntime::from_snapshot(&Snapshot::from_json_str(json).unwrap()).unwrap_err();
    assert!(matches!(err, RuntimeError::Snapshot(msg) if msg.contains("'Y' is not a member of E")));
}

#[test]
fn load_json_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DRIVETRAIN.as_bytes()).unwrap();
    let rt = MemoryRuntime::load_json(file.path()).unwrap();
    assert_eq!(rt.root_names(), vec!["parts".to_string()]);
}

#[test]
fn load_json_missing_file_is_io_error() {
    let err = MemoryRuntime::load_json(std::path::Path::new("/nonexistent/snapshot.json")).unwrap_err();
    assert!(matches!(err, RuntimeError::Io(_)));
}
