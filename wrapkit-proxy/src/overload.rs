//! Overload selection for dynamic argument lists.
//!
//! Typed Rust callers never need this: they call named methods on wrapper
//! types. It exists for callers that only have a `[ForeignValue]` in hand,
//! such as the CLI, and must pick one of several foreign call shapes.

use crate::{ProxyError, ProxyResult};
use std::fmt;
use wrapkit_runtime::ForeignRuntime;
use wrapkit_types::{ForeignValue, ValueKind};

/// Predicate on one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamShape {
    /// A handle whose runtime type is this type or derives from it.
    Identity(String),
    /// A scalar of this kind. `Float` also accepts integers.
    Primitive(ValueKind),
    /// A list whose every element matches the inner shape.
    ListOf(Box<ParamShape>),
    Any,
}

impl ParamShape {
    pub fn identity(type_name: impl Into<String>) -> Self {
        Self::Identity(type_name.into())
    }

    pub fn list_of(inner: ParamShape) -> Self {
        Self::ListOf(Box::new(inner))
    }

    /// Identity shapes are checked first, then primitives, then containers.
    fn precedence(&self) -> u8 {
        match self {
            Self::Identity(_) => 0,
            Self::Primitive(_) => 1,
            Self::ListOf(_) => 2,
            Self::Any => 3,
        }
    }

    pub fn matches(&self, value: &ForeignValue, runtime: &dyn ForeignRuntime) -> bool {
        match self {
            Self::Identity(type_name) => match value {
                ForeignValue::Handle(id) => runtime
                    .type_of(*id)
                    .is_ok_and(|actual| runtime.is_subtype(&actual, type_name)),
                _ => false,
            },
            Self::Primitive(kind) => {
                value.kind() == *kind
                    || (*kind == ValueKind::Float && value.kind() == ValueKind::Int)
            }
            Self::ListOf(inner) => value
                .as_list()
                .is_some_and(|items| items.iter().all(|item| inner.matches(item, runtime))),
            Self::Any => true,
        }
    }
}

impl fmt::Display for ParamShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity(type_name) => f.write_str(type_name),
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::ListOf(inner) => write!(f, "list<{inner}>"),
            Self::Any => f.write_str("any"),
        }
    }
}

/// One foreign call shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overload {
    signature: String,
    params: Vec<ParamShape>,
}

impl Overload {
    /// Signature string passed to the runtime when this overload is called.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn params(&self) -> &[ParamShape] {
        &self.params
    }

    fn precedence(&self) -> Vec<u8> {
        self.params.iter().map(ParamShape::precedence).collect()
    }

    fn accepts(&self, args: &[ForeignValue], runtime: &dyn ForeignRuntime) -> bool {
        self.params.len() == args.len()
            && self
                .params
                .iter()
                .zip(args)
                .all(|(shape, arg)| shape.matches(arg, runtime))
    }
}

/// All call shapes of one foreign method, kept in precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverloadSet {
    method: String,
    overloads: Vec<Overload>,
}

impl OverloadSet {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            overloads: Vec::new(),
        }
    }

    /// Adds a call shape. Shapes with equal precedence keep declaration
    /// order.
    pub fn overload(mut self, signature: impl Into<String>, params: Vec<ParamShape>) -> Self {
        self.overloads.push(Overload {
            signature: signature.into(),
            params,
        });
        self.overloads.sort_by_key(Overload::precedence);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn overloads(&self) -> &[Overload] {
        &self.overloads
    }

    /// First overload, in precedence order, whose every parameter matches.
    pub fn resolve(&self, args: &[ForeignValue], runtime: &dyn ForeignRuntime) -> ProxyResult<&Overload> {
        self.overloads
            .iter()
            .find(|overload| overload.accepts(args, runtime))
            .ok_or_else(|| ProxyError::NoMatchingOverload {
                method: self.method.clone(),
                arguments: args
                    .iter()
                    .map(|arg| arg.kind().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}
