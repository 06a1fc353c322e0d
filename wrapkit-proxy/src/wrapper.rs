//! Typed façades over a single [`Handle`].

use crate::{Handle, ProxyError, ProxyResult};
use std::any::Any;
use std::fmt;
use wrapkit_types::HandleId;

/// A local value that owns exactly one foreign handle.
///
/// The declared type is fixed when the wrapper is built. The registry picks
/// it so that it is the most specific local type known for the object's
/// runtime type.
pub trait Wrapper: Any + Send + Sync + fmt::Debug {
    fn handle(&self) -> &Handle;

    /// Foreign type name this wrapper was declared for.
    fn declared_type(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A concrete wrapper type that the registry can construct.
///
/// Declare these with [`foreign_type!`](crate::foreign_type) rather than by
/// hand.
pub trait ForeignType: Wrapper + Sized {
    /// Foreign runtime type name this wrapper stands for.
    const TYPE_NAME: &'static str;

    fn from_handle(handle: Handle) -> Self;

    fn into_handle(self) -> Handle;
}

impl dyn Wrapper {
    pub fn id(&self) -> HandleId {
        self.handle().id()
    }

    pub fn is<T: Wrapper>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Wrapper>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Recovers the concrete wrapper. Fails with `InvalidCast` when the
    /// declared type is not `T`.
    pub fn downcast<T: ForeignType>(self: Box<Self>) -> ProxyResult<T> {
        let declared = self.declared_type();
        self.into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| ProxyError::InvalidCast {
                runtime_type: declared.to_string(),
                target: T::TYPE_NAME.to_string(),
            })
    }
}

/// Declares one or more wrapper types.
///
/// Each declaration produces a struct holding a [`Handle`] plus the
/// [`Wrapper`] and [`ForeignType`] impls the registry needs. Accessors are
/// added in a regular `impl` block.
///
/// ```
/// wrapkit_proxy::foreign_type! {
///     /// A rolling-element bearing.
///     pub struct Bearing => "Drive.Bearing";
/// }
///
/// impl Bearing {
///     pub fn bore(&self) -> wrapkit_proxy::ProxyResult<f64> {
///         self.handle().get("Bore")
///     }
/// }
/// # use wrapkit_proxy::Wrapper;
/// # fn main() {}
/// ```
#[macro_export]
macro_rules! foreign_type {
    ($($(#[$meta:meta])* $vis:vis struct $name:ident => $foreign:literal;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            $vis struct $name {
                handle: $crate::Handle,
            }

            impl $crate::Wrapper for $name {
                fn handle(&self) -> &$crate::Handle {
                    &self.handle
                }

                fn declared_type(&self) -> &'static str {
                    <Self as $crate::ForeignType>::TYPE_NAME
                }

                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }

                fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                    self
                }
            }

            impl $crate::ForeignType for $name {
                const TYPE_NAME: &'static str = $foreign;

                fn from_handle(handle: $crate::Handle) -> Self {
                    Self { handle }
                }

                fn into_handle(self) -> $crate::Handle {
                    self.handle
                }
            }
        )+
    };
}

foreign_type! {
    /// Universal fallback wrapper. Always registered, so resolution has a
    /// type to return even when nothing more specific is known.
    pub struct Opaque => "Object";
}
