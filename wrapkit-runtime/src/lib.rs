//! Foreign runtime boundary for wrapkit.
//!
//! Defines the [`ForeignRuntime`] trait, the only way the proxy layer talks
//! to an external object model, together with [`MemoryRuntime`], a complete
//! in-process implementation used for tests, demos and offline inspection
//! of [`Snapshot`] files.

mod error;
mod memory;
mod object;
mod runtime;
mod snapshot;

pub use error::{RuntimeError, RuntimeResult};
pub use memory::{MemoryRuntime, NativeMethod};
pub use object::ForeignObject;
pub use runtime::ForeignRuntime;
pub use snapshot::{ObjectDecl, Snapshot, SnapshotValue, TypeDecl};
