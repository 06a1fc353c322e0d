mod common;

use common::Drivetrain;
use pretty_assertions::assert_eq;
use wrapkit_proxy::{OverloadSet, ParamShape, ProxyError, ValueKind};
use wrapkit_runtime::RuntimeError;
use wrapkit_types::ForeignValue;

/// `Mount` accepts a bearing, a position, or a position and a load factor.
fn mount_overloads() -> OverloadSet {
    OverloadSet::new("Mount")
        .overload("(float,float)", vec![
            ParamShape::Primitive(ValueKind::Float),
            ParamShape::Primitive(ValueKind::Float),
        ])
        .overload("(float)", vec![ParamShape::Primitive(ValueKind::Float)])
        .overload("(Drive.Bearing)", vec![ParamShape::identity("Drive.Bearing")])
        .overload("(Drive.Component)", vec![ParamShape::identity("Drive.Component")])
}

fn with_mount_methods(dt: &Drivetrain) {
    for signature in ["(float,float)", "(float)", "(Drive.Bearing)", "(Drive.Component)"] {
        let label = signature.to_string();
        dt.runtime
            .define_method("Drive.Shaft", "Mount", signature, move |_, _| {
                Ok(ForeignValue::Str(label.clone()))
            })
            .unwrap();
    }
}

// ── Resolution ───────────────────────────────────────────────────

#[test]
fn identity_overloads_are_tried_first() {
    let overloads = mount_overloads();
    let order: Vec<_> = overloads.overloads().iter().map(|o| o.signature()).collect();
    assert_eq!(
        order,
        vec!["(Drive.Bearing)", "(Drive.Component)", "(float)", "(float,float)"]
    );
}

#[test]
fn handle_argument_picks_most_specific_declared_identity() {
    let dt = Drivetrain::new();
    let overloads = mount_overloads();
    let runtime = &**dt.session.runtime();

    let bearing = [ForeignValue::Handle(dt.bearings[0])];
    assert_eq!(overloads.resolve(&bearing, runtime).unwrap().signature(), "(Drive.Bearing)");

    let shaft = [ForeignValue::Handle(dt.shaft)];
    assert_eq!(overloads.resolve(&shaft, runtime).unwrap().signature(), "(Drive.Component)");
}

#[test]
fn integer_argument_matches_float_parameter() {
    let dt = Drivetrain::new();
    let overloads = mount_overloads();
    let args = [ForeignValue::Int(3)];
    let chosen = overloads.resolve(&args, &**dt.session.runtime()).unwrap();
    assert_eq!(chosen.signature(), "(float)");
}

#[test]
fn arity_selects_between_overloads() {
    let dt = Drivetrain::new();
    let overloads = mount_overloads();
    let args = [ForeignValue::Float(1.0), ForeignValue::Int(2)];
    let chosen = overloads.resolve(&args, &**dt.session.runtime()).unwrap();
    assert_eq!(chosen.signature(), "(float,float)");
}

#[test]
fn no_match_reports_argument_kinds() {
    let dt = Drivetrain::new();
    let overloads = mount_overloads();
    let args = [ForeignValue::from("left"), ForeignValue::Bool(true)];
    let err = overloads.resolve(&args, &**dt.session.runtime()).unwrap_err();
    assert!(matches!(
        err,
        ProxyError::NoMatchingOverload { method, arguments }
            if method == "Mount" && arguments == "str, bool"
    ));
}

#[test]
fn equal_precedence_keeps_declaration_order() {
    let dt = Drivetrain::new();
    let overloads = OverloadSet::new("Describe")
        .overload("(any)", vec![ParamShape::Any])
        .overload("(str)", vec![ParamShape::Primitive(ValueKind::Str)])
        .overload("(any) second", vec![ParamShape::Any]);
    let args = [ForeignValue::Int(1)];
    let chosen = overloads.resolve(&args, &**dt.session.runtime()).unwrap();
    assert_eq!(chosen.signature(), "(any)");
}

#[test]
fn list_shape_checks_every_element() {
    let dt = Drivetrain::new();
    let runtime = &**dt.session.runtime();
    let shape = ParamShape::list_of(ParamShape::identity("Drive.Bearing"));

    let bearings = ForeignValue::List(dt.bearings.iter().copied().map(ForeignValue::Handle).collect());
    assert!(shape.matches(&bearings, runtime));

    let mixed = ForeignValue::List(vec![
        ForeignValue::Handle(dt.bearings[0]),
        ForeignValue::Handle(dt.shaft),
    ]);
    assert!(!shape.matches(&mixed, runtime));
    assert_eq!(shape.to_string(), "list<Drive.Bearing>");
}

#[test]
fn stale_handle_matches_no_identity() {
    let dt = Drivetrain::new();
    let shape = ParamShape::identity("Drive.Component");
    let ghost = ForeignValue::Handle(wrapkit_types::HandleId::new());
    assert!(!shape.matches(&ghost, &**dt.session.runtime()));
}

// ── Invocation ───────────────────────────────────────────────────

#[test]
fn invoke_calls_resolved_signature() {
    let dt = Drivetrain::new();
    with_mount_methods(&dt);
    let shaft = dt.session.acquire(dt.shaft).unwrap();

    let result = shaft
        .invoke(&mount_overloads(), &[ForeignValue::Handle(dt.bearings[1])])
        .unwrap();
    assert_eq!(result, ForeignValue::from("(Drive.Bearing)"));

    let result = shaft
        .invoke(&mount_overloads(), &[ForeignValue::Float(0.5), ForeignValue::Float(2.0)])
        .unwrap();
    assert_eq!(result, ForeignValue::from("(float,float)"));
}

#[test]
fn call_with_unknown_signature_surfaces_runtime_error() {
    let dt = Drivetrain::new();
    let shaft = dt.session.acquire(dt.shaft).unwrap();
    let err = shaft.call("Mount", "(str)", &[ForeignValue::from("x")]).unwrap_err();
    assert!(matches!(
        err,
        ProxyError::Runtime(RuntimeError::UnknownMethod { method, .. }) if method == "Mount"
    ));
}
