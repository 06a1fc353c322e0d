//! Qualified foreign type names.
//!
//! Foreign runtimes report names such as `Drive.Components.Bearing`. The
//! segment after the last `.` is the simple name.

/// Returns the unqualified part of a dotted type name.
pub fn simple_name(type_name: &str) -> &str {
    match type_name.rfind('.') {
        Some(pos) => &type_name[pos + 1..],
        None => type_name,
    }
}

/// Returns the namespace part of a dotted type name, if any.
pub fn namespace_of(type_name: &str) -> Option<&str> {
    type_name.rfind('.').map(|pos| &type_name[..pos])
}
