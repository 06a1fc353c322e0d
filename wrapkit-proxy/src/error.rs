//! Error types for the proxy layer.

use thiserror::Error;
use wrapkit_runtime::RuntimeError;

/// Result type for proxy operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Errors surfaced by wrappers, the registry and collection views.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Null, unknown or disposed foreign reference at construction.
    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    /// A value is outside the domain of the target type.
    #[error("type conversion error: {0}")]
    TypeConversion(String),

    /// Collection lookup or root lookup found nothing.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("ambiguous name '{name}': {count} elements match")]
    AmbiguousName { name: String, count: usize },

    #[error("no overload of '{method}' accepts ({arguments})")]
    NoMatchingOverload { method: String, arguments: String },

    #[error("invalid cast: {runtime_type} is not a {target}")]
    InvalidCast { runtime_type: String, target: String },

    #[error("type already registered: {0}")]
    DuplicateRegistration(String),

    #[error("simple name '{name}' matches several registered types: {}", candidates.join(", "))]
    AmbiguousRegistration {
        name: String,
        candidates: Vec<String>,
    },

    #[error("configuration error: {0}")]
    Config(String),

    /// Errors raised by the foreign runtime, passed through unchanged.
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl ProxyError {
    pub(crate) fn conversion(expected: impl std::fmt::Display, found: impl std::fmt::Display) -> Self {
        Self::TypeConversion(format!("expected {expected}, found {found}"))
    }
}
