//! The value domain that crosses the foreign boundary.

use crate::HandleId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value read from or written to a foreign runtime.
///
/// Every property read, property write and method argument is expressed
/// with this type. Object references travel as [`ForeignValue::Handle`];
/// they are turned into owning wrappers on the local side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A member of a foreign enumeration, carried by name.
    Enum { type_name: String, member: String },
    Handle(HandleId),
    List(Vec<ForeignValue>),
    /// A value the foreign side computes by default but lets callers pin.
    Overridable {
        value: Box<ForeignValue>,
        overridden: bool,
    },
}

impl ForeignValue {
    /// Shorthand for an enum member value.
    pub fn enum_member(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self::Enum {
            type_name: type_name.into(),
            member: member.into(),
        }
    }

    /// Shorthand for an overridable value.
    pub fn overridable(value: ForeignValue, overridden: bool) -> Self {
        Self::Overridable {
            value: Box::new(value),
            overridden,
        }
    }

    /// Returns the kind tag of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Str(_) => ValueKind::Str,
            Self::Enum { .. } => ValueKind::Enum,
            Self::Handle(_) => ValueKind::Handle,
            Self::List(_) => ValueKind::List,
            Self::Overridable { .. } => ValueKind::Overridable,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<HandleId> {
        match self {
            Self::Handle(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ForeignValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for ForeignValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ForeignValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ForeignValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ForeignValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ForeignValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<HandleId> for ForeignValue {
    fn from(value: HandleId) -> Self {
        Self::Handle(value)
    }
}

/// The kind tag of a [`ForeignValue`], used for shape checks and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Enum,
    Handle,
    List,
    Overridable,
}

impl ValueKind {
    /// Primitive kinds are scalars that carry no object identity.
    #[must_use]
    pub const fn is_primitive(self) -> bool {
        matches!(
            self,
            Self::Bool | Self::Int | Self::Float | Self::Str | Self::Enum
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Enum => "enum",
            Self::Handle => "handle",
            Self::List => "list",
            Self::Overridable => "overridable",
        };
        f.write_str(name)
    }
}
