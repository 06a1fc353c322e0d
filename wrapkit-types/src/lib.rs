//! Core type definitions for wrapkit.
//!
//! This crate defines the runtime-agnostic types every other crate shares:
//! - Handle identifiers for objects living in a foreign runtime (UUID v7)
//! - The value domain that crosses the foreign boundary
//! - Helpers for qualified foreign type names
//!
//! Nothing here knows how a foreign runtime is reached; that lives in
//! `wrapkit-runtime`.

mod ids;
mod names;
mod value;

pub use ids::HandleId;
pub use names::{namespace_of, simple_name};
pub use value::{ForeignValue, ValueKind};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing shared types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid handle id: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
