mod common;

use common::LubricantType;
use pretty_assertions::assert_eq;
use wrapkit_proxy::convert::{enum_from_foreign, enum_into_foreign};
use wrapkit_proxy::{ForeignEnum, FromForeign, IntoForeign, Overridable, ProxyError};
use wrapkit_types::{ForeignValue, HandleId};

// ── Scalars ──────────────────────────────────────────────────────

#[test]
fn int_widens_to_float() {
    assert_eq!(f64::from_foreign(ForeignValue::Int(3)).unwrap(), 3.0);
}

#[test]
fn float_does_not_narrow_to_int() {
    let err = i64::from_foreign(ForeignValue::Float(3.5)).unwrap_err();
    assert!(matches!(err, ProxyError::TypeConversion(msg) if msg.contains("float")));
}

#[test]
fn out_of_range_narrowing_fails() {
    assert!(matches!(
        i32::from_foreign(ForeignValue::Int(i64::from(i32::MAX) + 1)),
        Err(ProxyError::TypeConversion(_))
    ));
    assert!(matches!(
        u32::from_foreign(ForeignValue::Int(-1)),
        Err(ProxyError::TypeConversion(_))
    ));
    assert_eq!(u32::from_foreign(ForeignValue::Int(7)).unwrap(), 7);
}

#[test]
fn nan_is_rejected_on_write() {
    assert!(matches!(
        f64::NAN.into_foreign(),
        Err(ProxyError::TypeConversion(_))
    ));
}

#[test]
fn strings_and_handles_convert() {
    assert_eq!(
        String::from_foreign(ForeignValue::from("shaft")).unwrap(),
        "shaft"
    );
    let id = HandleId::new();
    assert_eq!(HandleId::from_foreign(ForeignValue::Handle(id)).unwrap(), id);
    assert!(String::from_foreign(ForeignValue::Bool(true)).is_err());
}

// ── Nullability ──────────────────────────────────────────────────

#[test]
fn option_maps_null_to_none() {
    assert_eq!(Option::<f64>::from_foreign(ForeignValue::Null).unwrap(), None);
    assert_eq!(
        Option::<f64>::from_foreign(ForeignValue::Float(1.5)).unwrap(),
        Some(1.5)
    );
    assert_eq!(None::<i64>.into_foreign().unwrap(), ForeignValue::Null);
}

#[test]
fn plain_type_rejects_null() {
    let err = bool::from_foreign(ForeignValue::Null).unwrap_err();
    assert!(matches!(err, ProxyError::TypeConversion(msg) if msg.contains("null")));
}

// ── Lists ────────────────────────────────────────────────────────

#[test]
fn list_converts_element_wise() {
    let value = ForeignValue::List(vec![ForeignValue::Int(1), ForeignValue::Int(2)]);
    assert_eq!(Vec::<i64>::from_foreign(value).unwrap(), vec![1, 2]);
}

#[test]
fn list_with_bad_element_fails() {
    let value = ForeignValue::List(vec![ForeignValue::Int(1), ForeignValue::from("x")]);
    assert!(Vec::<i64>::from_foreign(value).is_err());
}

// ── Enums ────────────────────────────────────────────────────────

#[test]
fn enum_converts_by_member_name() {
    let value = ForeignValue::enum_member("Drive.LubricantType", "Synthetic");
    assert_eq!(
        LubricantType::from_foreign(value).unwrap(),
        LubricantType::Synthetic
    );
    assert_eq!(
        LubricantType::Grease.into_foreign().unwrap(),
        ForeignValue::enum_member("Drive.LubricantType", "Grease")
    );
}

#[test]
fn enum_accepts_bare_member_string() {
    let parsed: LubricantType = enum_from_foreign(ForeignValue::from("Mineral")).unwrap();
    assert_eq!(parsed, LubricantType::Mineral);
}

#[test]
fn enum_accepts_other_namespace_with_same_simple_name() {
    let value = ForeignValue::enum_member("Legacy.LubricantType", "Grease");
    assert_eq!(
        LubricantType::from_foreign(value).unwrap(),
        LubricantType::Grease
    );
}

#[test]
fn enum_rejects_foreign_enum_type() {
    let value = ForeignValue::enum_member("Drive.GearQuality", "Mineral");
    assert!(matches!(
        LubricantType::from_foreign(value),
        Err(ProxyError::TypeConversion(_))
    ));
}

#[test]
fn enum_rejects_unknown_member() {
    let err = LubricantType::from_foreign(ForeignValue::from("Water")).unwrap_err();
    assert!(matches!(err, ProxyError::TypeConversion(msg) if msg.contains("Water")));
}

#[test]
fn enum_members_are_exposed() {
    assert_eq!(LubricantType::FOREIGN_TYPE, "Drive.LubricantType");
    assert_eq!(LubricantType::Synthetic.member(), "Synthetic");
    assert_eq!(
        enum_into_foreign(LubricantType::Mineral),
        ForeignValue::enum_member("Drive.LubricantType", "Mineral")
    );
}

// ── Overridable ──────────────────────────────────────────────────

#[test]
fn plain_value_reads_as_computed() {
    let read = Overridable::<f64>::from_foreign(ForeignValue::Float(2.0)).unwrap();
    assert_eq!(read, Overridable::computed(2.0));
}

#[test]
fn pinned_value_writes_flag() {
    let written = Overridable::pinned(5_i64).into_foreign().unwrap();
    assert_eq!(
        written,
        ForeignValue::overridable(ForeignValue::Int(5), true)
    );
    let read = Overridable::<i64>::from_foreign(written).unwrap();
    assert!(read.overridden);
}
