use crate::RuntimeResult;
use std::collections::HashSet;
use wrapkit_types::{ForeignValue, HandleId};

/// The boundary to a foreign object model.
///
/// Every call is synchronous and blocking. Implementations own the object
/// graph; callers only ever hold [`HandleId`]s plus the reference counts
/// they registered through [`retain`](Self::retain).
///
/// Type information is only available as strings at this boundary. The
/// local side recovers concrete wrapper types from [`type_of`](Self::type_of)
/// and [`base_type`](Self::base_type).
pub trait ForeignRuntime: Send + Sync {
    /// Most-derived runtime type name of the object.
    fn type_of(&self, id: HandleId) -> RuntimeResult<String>;

    /// Direct base type of a type, or `None` at the root of a hierarchy or
    /// for unknown types.
    fn base_type(&self, type_name: &str) -> Option<String>;

    fn get_property(&self, id: HandleId, property: &str) -> RuntimeResult<ForeignValue>;

    fn set_property(&self, id: HandleId, property: &str, value: ForeignValue) -> RuntimeResult<()>;

    /// Calls one concrete overload, identified by `signature`.
    fn invoke(
        &self,
        id: HandleId,
        method: &str,
        signature: &str,
        args: &[ForeignValue],
    ) -> RuntimeResult<ForeignValue>;

    /// Element handles of a collection object, in foreign order.
    fn items(&self, id: HandleId) -> RuntimeResult<Vec<HandleId>>;

    /// Mutation counter of a collection. Changes whenever the element list
    /// changes.
    fn generation(&self, id: HandleId) -> RuntimeResult<u64>;

    /// Registers one more local reference. Returns the new count.
    fn retain(&self, id: HandleId) -> RuntimeResult<u32>;

    /// Drops one local reference. Returns the remaining count.
    fn release(&self, id: HandleId) -> RuntimeResult<u32>;

    /// Named entry point into the object graph.
    fn root(&self, name: &str) -> Option<HandleId>;

    /// Member names of a foreign enumeration.
    fn enum_members(&self, enum_type: &str) -> Option<Vec<String>>;

    /// Number of elements in a collection.
    fn len(&self, id: HandleId) -> RuntimeResult<usize> {
        Ok(self.items(id)?.len())
    }

    /// Base chain of a type, nearest first, excluding the type itself.
    fn ancestors(&self, type_name: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(type_name.to_string());
        let mut current = self.base_type(type_name);
        while let Some(base) = current {
            if !seen.insert(base.clone()) {
                break;
            }
            current = self.base_type(&base);
            chain.push(base);
        }
        chain
    }

    /// True when `type_name` is `ancestor` or derives from it.
    fn is_subtype(&self, type_name: &str, ancestor: &str) -> bool {
        type_name == ancestor || self.ancestors(type_name).iter().any(|t| t == ancestor)
    }
}
