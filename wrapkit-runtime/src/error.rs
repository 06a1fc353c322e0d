//! Error types for the foreign runtime boundary.

use thiserror::Error;
use wrapkit_types::HandleId;

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised by a foreign runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The runtime has no object with this handle.
    #[error("unknown handle: {0}")]
    UnknownHandle(HandleId),

    /// The object behind this handle was disposed.
    #[error("handle disposed: {0}")]
    Disposed(HandleId),

    /// Type name not declared in the runtime.
    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("type '{type_name}' has no property '{property}'")]
    UnknownProperty { type_name: String, property: String },

    #[error("type '{type_name}' has no method '{method}' with signature '{signature}'")]
    UnknownMethod {
        type_name: String,
        method: String,
        signature: String,
    },

    /// The handle does not refer to a collection object.
    #[error("not a collection: {0}")]
    NotACollection(HandleId),

    /// A written value is outside the domain the property accepts.
    #[error("type mismatch on '{property}': {detail}")]
    TypeMismatch { property: String, detail: String },

    /// A snapshot document is internally inconsistent.
    #[error("invalid snapshot: {0}")]
    Snapshot(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error raised by foreign code while executing a call.
    #[error("foreign error: {0}")]
    Foreign(String),
}
