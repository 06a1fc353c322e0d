//! Typed proxies over a foreign object model.
//!
//! A [`Session`] pairs a [`ForeignRuntime`](wrapkit_runtime::ForeignRuntime)
//! with a [`WrapperRegistry`]. Objects are reached through owning
//! [`Handle`]s; typed wrappers declared with [`foreign_type!`] sit on top of
//! a handle and expose accessors that convert values on every call.
//!
//! - [`WrapperRegistry`] picks the most-derived local wrapper for a runtime
//!   type name.
//! - [`Collection`] gives id- and name-keyed lookup over foreign lists, with
//!   an index that rebuilds when the foreign side mutates the list.
//! - [`OverloadSet`] selects a foreign overload from a dynamic argument
//!   list.
//! - [`ProxyConfig`] carries the TOML-configurable knobs.

mod collection;
mod config;
pub mod convert;
mod error;
mod handle;
mod overload;
mod registry;
mod session;
mod wrapper;

pub use collection::{Collection, CollectionIter, Key, NamePolicy};
pub use config::{CollectionSettings, ProxyConfig, RegistrySettings};
pub use convert::{ForeignEnum, FromForeign, IntoForeign, Overridable};
pub use error::{ProxyError, ProxyResult};
pub use handle::Handle;
pub use overload::{Overload, OverloadSet, ParamShape};
pub use registry::WrapperRegistry;
pub use session::Session;
pub use wrapper::{ForeignType, Opaque, Wrapper};

pub use wrapkit_types::{ForeignValue, HandleId, ValueKind};
