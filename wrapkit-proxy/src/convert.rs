//! Local ↔ foreign value conversion.
//!
//! [`FromForeign`] turns a [`ForeignValue`] read from the runtime into a
//! local type; [`IntoForeign`] goes the other way for property writes and
//! method arguments. Both fail with [`ProxyError::TypeConversion`] when a
//! value is outside the target domain.
//!
//! Nullability is explicit: `Option<T>` maps `Null` to `None`, while a plain
//! `T` rejects `Null`.

use crate::{ProxyError, ProxyResult};
use wrapkit_types::{simple_name, ForeignValue, HandleId};

pub trait FromForeign: Sized {
    fn from_foreign(value: ForeignValue) -> ProxyResult<Self>;
}

pub trait IntoForeign {
    fn into_foreign(self) -> ProxyResult<ForeignValue>;
}

/// A local enum mirroring a foreign enumeration member-by-member.
///
/// Declare these with [`foreign_enum!`](crate::foreign_enum).
pub trait ForeignEnum: Sized + Copy + 'static {
    /// Foreign type name of the enumeration.
    const FOREIGN_TYPE: &'static str;

    fn from_member(member: &str) -> Option<Self>;

    fn member(self) -> &'static str;
}

/// Converts by member name. Accepts both enum values and bare strings.
pub fn enum_from_foreign<E: ForeignEnum>(value: ForeignValue) -> ProxyResult<E> {
    let member = match value {
        ForeignValue::Enum { type_name, member } => {
            if type_name != E::FOREIGN_TYPE && simple_name(&type_name) != simple_name(E::FOREIGN_TYPE)
            {
                return Err(ProxyError::conversion(
                    E::FOREIGN_TYPE,
                    format!("member of {type_name}"),
                ));
            }
            member
        }
        ForeignValue::Str(member) => member,
        other => return Err(ProxyError::conversion(E::FOREIGN_TYPE, other.kind())),
    };
    E::from_member(&member).ok_or_else(|| {
        ProxyError::TypeConversion(format!(
            "'{member}' is not a member of {}",
            E::FOREIGN_TYPE
        ))
    })
}

pub fn enum_into_foreign<E: ForeignEnum>(value: E) -> ForeignValue {
    ForeignValue::enum_member(E::FOREIGN_TYPE, value.member())
}

// ── Scalars ──────────────────────────────────────────────────────

impl FromForeign for ForeignValue {
    fn from_foreign(value: ForeignValue) -> ProxyResult<Self> {
        Ok(value)
    }
}

impl IntoForeign for ForeignValue {
    fn into_foreign(self) -> ProxyResult<ForeignValue> {
        Ok(self)
    }
}

impl FromForeign for bool {
    fn from_foreign(value: ForeignValue) -> ProxyResult<Self> {
        value
            .as_bool()
            .ok_or_else(|| ProxyError::conversion("bool", value.kind()))
    }
}

impl IntoForeign for bool {
    fn into_foreign(self) -> ProxyResult<ForeignValue> {
        Ok(ForeignValue::Bool(self))
    }
}

impl FromForeign for i64 {
    fn from_foreign(value: ForeignValue) -> ProxyResult<Self> {
        value
            .as_i64()
            .ok_or_else(|| ProxyError::conversion("int", value.kind()))
    }
}

impl IntoForeign for i64 {
    fn into_foreign(self) -> ProxyResult<ForeignValue> {
        Ok(ForeignValue::Int(self))
    }
}

impl FromForeign for i32 {
    fn from_foreign(value: ForeignValue) -> ProxyResult<Self> {
        let wide = i64::from_foreign(value)?;
        i32::try_from(wide).map_err(|_| ProxyError::conversion("i32", wide))
    }
}

impl IntoForeign for i32 {
    fn into_foreign(self) -> ProxyResult<ForeignValue> {
        Ok(ForeignValue::Int(i64::from(self)))
    }
}

impl FromForeign for u32 {
    fn from_foreign(value: ForeignValue) -> ProxyResult<Self> {
        let wide = i64::from_foreign(value)?;
        u32::try_from(wide).map_err(|_| ProxyError::conversion("u32", wide))
    }
}

impl IntoForeign for u32 {
    fn into_foreign(self) -> ProxyResult<ForeignValue> {
        Ok(ForeignValue::Int(i64::from(self)))
    }
}

impl FromForeign for f64 {
    fn from_foreign(value: ForeignValue) -> ProxyResult<Self> {
        value
            .as_f64()
            .ok_or_else(|| ProxyError::conversion("float", value.kind()))
    }
}

impl IntoForeign for f64 {
    fn into_foreign(self) -> ProxyResult<ForeignValue> {
        if self.is_nan() {
            return Err(ProxyError::conversion("float", "NaN"));
        }
        Ok(ForeignValue::Float(self))
    }
}

impl FromForeign for String {
    fn from_foreign(value: ForeignValue) -> ProxyResult<Self> {
        match value {
            ForeignValue::Str(s) => Ok(s),
            other => Err(ProxyError::conversion("str", other.kind())),
        }
    }
}

impl IntoForeign for String {
    fn into_foreign(self) -> ProxyResult<ForeignValue> {
        Ok(ForeignValue::Str(self))
    }
}

impl IntoForeign for &str {
    fn into_foreign(self) -> ProxyResult<ForeignValue> {
        Ok(ForeignValue::Str(self.to_string()))
    }
}

impl FromForeign for HandleId {
    fn from_foreign(value: ForeignValue) -> ProxyResult<Self> {
        value
            .as_handle()
            .ok_or_else(|| ProxyError::conversion("handle", value.kind()))
    }
}

impl IntoForeign for HandleId {
    fn into_foreign(self) -> ProxyResult<ForeignValue> {
        Ok(ForeignValue::Handle(self))
    }
}

// ── Containers ───────────────────────────────────────────────────

impl<T: FromForeign> FromForeign for Option<T> {
    fn from_foreign(value: ForeignValue) -> ProxyResult<Self> {
        match value {
            ForeignValue::Null => Ok(None),
            other => T::from_foreign(other).map(Some),
        }
    }
}

impl<T: IntoForeign> IntoForeign for Option<T> {
    fn into_foreign(self) -> ProxyResult<ForeignValue> {
        match self {
            Some(value) => value.into_foreign(),
            None => Ok(ForeignValue::Null),
        }
    }
}

impl<T: FromForeign> FromForeign for Vec<T> {
    fn from_foreign(value: ForeignValue) -> ProxyResult<Self> {
        match value {
            ForeignValue::List(items) => items.into_iter().map(T::from_foreign).collect(),
            other => Err(ProxyError::conversion("list", other.kind())),
        }
    }
}

impl<T: IntoForeign> IntoForeign for Vec<T> {
    fn into_foreign(self) -> ProxyResult<ForeignValue> {
        self.into_iter()
            .map(IntoForeign::into_foreign)
            .collect::<ProxyResult<Vec<_>>>()
            .map(ForeignValue::List)
    }
}

/// A value the foreign side computes unless a caller pins it.
///
/// Reading a plain (non-overridable) foreign value yields
/// `overridden == false`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overridable<T> {
    pub value: T,
    pub overridden: bool,
}

impl<T> Overridable<T> {
    /// A value pinned by the caller.
    pub fn pinned(value: T) -> Self {
        Self {
            value,
            overridden: true,
        }
    }

    /// A value left to the foreign side's default computation.
    pub fn computed(value: T) -> Self {
        Self {
            value,
            overridden: false,
        }
    }
}

impl<T: FromForeign> FromForeign for Overridable<T> {
    fn from_foreign(value: ForeignValue) -> ProxyResult<Self> {
        match value {
            ForeignValue::Overridable { value, overridden } => Ok(Self {
                value: T::from_foreign(*value)?,
                overridden,
            }),
            other => T::from_foreign(other).map(Self::computed),
        }
    }
}

impl<T: IntoForeign> IntoForeign for Overridable<T> {
    fn into_foreign(self) -> ProxyResult<ForeignValue> {
        Ok(ForeignValue::overridable(
            self.value.into_foreign()?,
            self.overridden,
        ))
    }
}

/// Declares a local enum mirroring a foreign enumeration.
///
/// ```
/// wrapkit_proxy::foreign_enum! {
///     pub enum LubricantType => "Drive.LubricantType" { Mineral, Synthetic }
/// }
/// ```
#[macro_export]
macro_rules! foreign_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident => $foreign:literal { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::ForeignEnum for $name {
            const FOREIGN_TYPE: &'static str = $foreign;

            fn from_member(member: &str) -> ::std::option::Option<Self> {
                match member {
                    $(stringify!($variant) => ::std::option::Option::Some(Self::$variant),)+
                    _ => ::std::option::Option::None,
                }
            }

            fn member(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }
        }

        impl $crate::FromForeign for $name {
            fn from_foreign(value: $crate::ForeignValue) -> $crate::ProxyResult<Self> {
                $crate::convert::enum_from_foreign(value)
            }
        }

        impl $crate::IntoForeign for $name {
            fn into_foreign(self) -> $crate::ProxyResult<$crate::ForeignValue> {
                ::std::result::Result::Ok($crate::convert::enum_into_foreign(self))
            }
        }
    };
}
