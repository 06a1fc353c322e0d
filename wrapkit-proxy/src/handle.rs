//! Owning references to foreign objects.

use crate::collection::Collection;
use crate::convert::{FromForeign, IntoForeign};
use crate::overload::OverloadSet;
use crate::wrapper::{ForeignType, Wrapper};
use crate::{ProxyError, ProxyResult, Session};
use std::fmt;
use tracing::warn;
use wrapkit_runtime::RuntimeError;
use wrapkit_types::{simple_name, ForeignValue, HandleId};

/// One retained reference to a foreign object.
///
/// A `Handle` registers itself with the runtime on acquisition and releases
/// that reference when dropped. It is deliberately not `Clone`: a second
/// local representation of the same object needs [`Handle::reacquire`],
/// which registers an independent reference.
///
/// Every accessor is a synchronous call into the runtime; nothing is cached.
pub struct Handle {
    id: HandleId,
    session: Session,
    released: bool,
}

impl Handle {
    /// Retains `id` in the session's runtime.
    pub fn acquire(session: &Session, id: HandleId) -> ProxyResult<Self> {
        match session.runtime().retain(id) {
            Ok(_) => Ok(Self {
                id,
                session: session.clone(),
                released: false,
            }),
            Err(RuntimeError::UnknownHandle(_)) => {
                Err(ProxyError::InvalidHandle(format!("{id} is not known to the runtime")))
            }
            Err(RuntimeError::Disposed(_)) => {
                Err(ProxyError::InvalidHandle(format!("{id} was disposed")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Acquires the object referenced by a handle-valued foreign value.
    pub fn from_value(session: &Session, value: &ForeignValue) -> ProxyResult<Self> {
        match value {
            ForeignValue::Handle(id) => Self::acquire(session, *id),
            ForeignValue::Null => Err(ProxyError::InvalidHandle("null reference".into())),
            other => Err(ProxyError::conversion("handle", other.kind())),
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Registers another reference to the same object.
    pub fn reacquire(&self) -> ProxyResult<Self> {
        Self::acquire(&self.session, self.id)
    }

    /// Most-derived type name the runtime reports for this object.
    pub fn runtime_type(&self) -> ProxyResult<String> {
        Ok(self.session.runtime().type_of(self.id)?)
    }

    /// Releases the reference now, surfacing runtime errors that a plain
    /// drop can only log.
    pub fn dispose(mut self) -> ProxyResult<()> {
        self.released = true;
        self.session.runtime().release(self.id)?;
        Ok(())
    }

    // ================================================================
    // Properties
    // ================================================================

    pub fn get_raw(&self, property: &str) -> ProxyResult<ForeignValue> {
        Ok(self.session.runtime().get_property(self.id, property)?)
    }

    pub fn set_raw(&self, property: &str, value: ForeignValue) -> ProxyResult<()> {
        match self.session.runtime().set_property(self.id, property, value) {
            Ok(()) => Ok(()),
            Err(RuntimeError::TypeMismatch { property, detail }) => Err(
                ProxyError::TypeConversion(format!("'{property}' rejected value: {detail}")),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Reads a property and converts it to a local type.
    pub fn get<T: FromForeign>(&self, property: &str) -> ProxyResult<T> {
        T::from_foreign(self.get_raw(property)?)
    }

    /// Converts a local value and writes it to a property.
    ///
    /// Enum members are written under the enumeration the property already
    /// holds when that differs from the local one only by namespace, so a
    /// value read through [`get`](Self::get) can always be written back.
    pub fn set<T: IntoForeign>(&self, property: &str, value: T) -> ProxyResult<()> {
        let mut value = value.into_foreign()?;
        if holds_enum(&value) {
            value = adopt_enum_type(&self.get_raw(property)?, value);
        }
        self.set_raw(property, value)
    }

    /// Reads a handle-valued property and wraps it in its most-derived type.
    pub fn get_wrapper(&self, property: &str) -> ProxyResult<Box<dyn Wrapper>> {
        let handle = Self::from_value(&self.session, &self.get_raw(property)?)?;
        self.session.registry().resolve(handle)
    }

    /// Like [`get_wrapper`](Self::get_wrapper), with `T` as the call-site
    /// type the result falls back to.
    pub fn get_wrapper_as<T: ForeignType>(&self, property: &str) -> ProxyResult<Box<dyn Wrapper>> {
        let handle = Self::from_value(&self.session, &self.get_raw(property)?)?;
        self.session.registry().resolve_as::<T>(handle)
    }

    /// Reads a nullable handle-valued property.
    pub fn get_optional_wrapper(&self, property: &str) -> ProxyResult<Option<Box<dyn Wrapper>>> {
        match self.get_raw(property)? {
            ForeignValue::Null => Ok(None),
            value => {
                let handle = Self::from_value(&self.session, &value)?;
                self.session.registry().resolve(handle).map(Some)
            }
        }
    }

    /// Points a handle-valued property at another wrapped object.
    pub fn set_wrapper(&self, property: &str, target: &dyn Wrapper) -> ProxyResult<()> {
        self.set_raw(property, ForeignValue::Handle(target.handle().id()))
    }

    /// Wraps a collection-valued property.
    pub fn get_collection<T: ForeignType>(&self, property: &str) -> ProxyResult<Collection<T>> {
        let handle = Self::from_value(&self.session, &self.get_raw(property)?)?;
        Collection::new(handle)
    }

    // ================================================================
    // Methods
    // ================================================================

    /// Calls one concrete foreign overload.
    pub fn call(&self, method: &str, signature: &str, args: &[ForeignValue]) -> ProxyResult<ForeignValue> {
        Ok(self
            .session
            .runtime()
            .invoke(self.id, method, signature, args)?)
    }

    /// Picks the overload matching `args` and calls it.
    pub fn invoke(&self, overloads: &OverloadSet, args: &[ForeignValue]) -> ProxyResult<ForeignValue> {
        let overload = overloads.resolve(args, &**self.session.runtime())?;
        self.call(overloads.method(), overload.signature(), args)
    }
}

fn holds_enum(value: &ForeignValue) -> bool {
    match value {
        ForeignValue::Enum { .. } => true,
        ForeignValue::Overridable { value, .. } => holds_enum(value),
        _ => false,
    }
}

fn adopt_enum_type(stored: &ForeignValue, value: ForeignValue) -> ForeignValue {
    match (stored, value) {
        (
            ForeignValue::Enum { type_name: stored_type, .. },
            ForeignValue::Enum { type_name, member },
        ) if *stored_type != type_name && simple_name(stored_type) == simple_name(&type_name) => {
            ForeignValue::Enum {
                type_name: stored_type.clone(),
                member,
            }
        }
        (
            ForeignValue::Overridable { value: stored, .. },
            ForeignValue::Overridable { value, overridden },
        ) => ForeignValue::overridable(adopt_enum_type(stored, *value), overridden),
        (_, value) => value,
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.session.runtime().release(self.id) {
            warn!(handle = %self.id, error = %e, "Failed to release foreign handle");
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("id", &self.id).finish()
    }
}
