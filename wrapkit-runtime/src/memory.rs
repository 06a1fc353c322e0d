//! In-memory foreign runtime.
//!
//! Holds a complete object graph behind one lock: declared types with their
//! bases, enumerations, objects, named roots and native methods. It behaves
//! like a strict foreign runtime: unknown handles, properties and enum
//! members are rejected, and property writes must keep the value kind.

use crate::{ForeignObject, ForeignRuntime, RuntimeError, RuntimeResult};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use wrapkit_types::{ForeignValue, HandleId};

/// A method implemented on the runtime side. Receives the target object and
/// the call arguments.
pub type NativeMethod =
    Arc<dyn Fn(&ForeignObject, &[ForeignValue]) -> RuntimeResult<ForeignValue> + Send + Sync>;

#[derive(Default)]
pub(crate) struct State {
    pub(crate) types: HashMap<String, Option<String>>,
    pub(crate) enums: HashMap<String, Vec<String>>,
    pub(crate) objects: HashMap<HandleId, ForeignObject>,
    pub(crate) disposed: HashSet<HandleId>,
    pub(crate) roots: BTreeMap<String, HandleId>,
    methods: HashMap<(String, String, String), NativeMethod>,
}

impl State {
    fn object(&self, id: HandleId) -> RuntimeResult<&ForeignObject> {
        match self.objects.get(&id) {
            Some(obj) => Ok(obj),
            None if self.disposed.contains(&id) => Err(RuntimeError::Disposed(id)),
            None => Err(RuntimeError::UnknownHandle(id)),
        }
    }

    fn object_mut(&mut self, id: HandleId) -> RuntimeResult<&mut ForeignObject> {
        if self.disposed.contains(&id) {
            return Err(RuntimeError::Disposed(id));
        }
        self.objects
            .get_mut(&id)
            .ok_or(RuntimeError::UnknownHandle(id))
    }

    fn collection_mut(&mut self, id: HandleId) -> RuntimeResult<&mut ForeignObject> {
        let obj = self.object_mut(id)?;
        if obj.items.is_none() {
            return Err(RuntimeError::NotACollection(id));
        }
        Ok(obj)
    }

    fn ensure_type(&self, type_name: &str) -> RuntimeResult<()> {
        if self.types.contains_key(type_name) {
            Ok(())
        } else {
            Err(RuntimeError::UnknownType(type_name.to_string()))
        }
    }

    /// Checks enum members and handle targets anywhere inside `value`.
    pub(crate) fn validate_value(&self, property: &str, value: &ForeignValue) -> RuntimeResult<()> {
        match value {
            ForeignValue::Enum { type_name, member } => {
                let members = self
                    .enums
                    .get(type_name)
                    .ok_or_else(|| RuntimeError::UnknownType(type_name.clone()))?;
                if !members.iter().any(|m| m == member) {
                    return Err(RuntimeError::TypeMismatch {
                        property: property.to_string(),
                        detail: format!("'{member}' is not a member of {type_name}"),
                    });
                }
                Ok(())
            }
            ForeignValue::Handle(target) => self.object(*target).map(|_| ()),
            ForeignValue::List(items) => items
                .iter()
                .try_for_each(|item| self.validate_value(property, item)),
            ForeignValue::Overridable { value, .. } => self.validate_value(property, value),
            _ => Ok(()),
        }
    }

    /// Returns the value to store, or a mismatch error when `value` cannot
    /// replace `current`.
    fn assignable(
        &self,
        property: &str,
        current: &ForeignValue,
        value: ForeignValue,
    ) -> RuntimeResult<ForeignValue> {
        self.validate_value(property, &value)?;
        coerce(property, current, value)
    }

    fn listed(&self, id: HandleId) -> bool {
        self.objects
            .values()
            .filter_map(|obj| obj.items.as_ref())
            .any(|items| items.contains(&id))
    }

    /// Frees a disposable object once no local reference and no collection
    /// holds it.
    fn dispose_if_unreferenced(&mut self, id: HandleId) {
        let free = self
            .objects
            .get(&id)
            .is_some_and(|obj| obj.disposable && obj.ref_count == 0);
        if !free {
            return;
        }
        if self.listed(id) {
            debug!(handle = %id, "Released object is still listed, keeping it");
            return;
        }
        self.objects.remove(&id);
        self.disposed.insert(id);
        self.roots.retain(|_, root| *root != id);
        debug!(handle = %id, "Disposed foreign object");
    }

    fn find_method(&self, type_name: &str, method: &str, signature: &str) -> Option<NativeMethod> {
        let mut current = Some(type_name.to_string());
        let mut seen = HashSet::new();
        while let Some(name) = current {
            if !seen.insert(name.clone()) {
                break;
            }
            let key = (name.clone(), method.to_string(), signature.to_string());
            if let Some(found) = self.methods.get(&key) {
                return Some(Arc::clone(found));
            }
            current = self.types.get(&name).cloned().flatten();
        }
        None
    }
}

/// Keeps the stored kind: `Null` replaces or is replaced by anything, an
/// integer widens into a float slot and overridable values are compared by
/// their inner value.
fn coerce(property: &str, current: &ForeignValue, value: ForeignValue) -> RuntimeResult<ForeignValue> {
    let mismatch = |detail: String| RuntimeError::TypeMismatch {
        property: property.to_string(),
        detail,
    };
    match (current, value) {
        (ForeignValue::Null, value) | (_, value @ ForeignValue::Null) => Ok(value),
        (ForeignValue::Float(_), ForeignValue::Int(i)) => Ok(ForeignValue::Float(i as f64)),
        (
            ForeignValue::Enum { type_name: expected, .. },
            ForeignValue::Enum { type_name, member },
        ) => {
            if *expected != type_name {
                return Err(mismatch(format!(
                    "expected {expected} member, got {type_name} member"
                )));
            }
            Ok(ForeignValue::Enum { type_name, member })
        }
        (
            ForeignValue::Overridable { value: stored, .. },
            ForeignValue::Overridable { value, overridden },
        ) => {
            let value = coerce(property, stored, *value)?;
            Ok(ForeignValue::overridable(value, overridden))
        }
        (current, value) if current.kind() != value.kind() => Err(mismatch(format!(
            "expected {}, got {}",
            current.kind(),
            value.kind()
        ))),
        (_, value) => Ok(value),
    }
}

/// An in-process [`ForeignRuntime`] backed by a hash map of objects.
#[derive(Default)]
pub struct MemoryRuntime {
    state: RwLock<State>,
}

impl fmt::Debug for MemoryRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRuntime").finish_non_exhaustive()
    }
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_state(state: State) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ================================================================
    // Schema
    // ================================================================

    /// Declares a type. The base, when given, must already be declared.
    pub fn define_type(&self, name: &str, base: Option<&str>) -> RuntimeResult<()> {
        let mut state = self.write();
        if let Some(base) = base {
            state.ensure_type(base)?;
        }
        state
            .types
            .insert(name.to_string(), base.map(str::to_string));
        Ok(())
    }

    pub fn define_enum<I, S>(&self, name: &str, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.write()
            .enums
            .insert(name.to_string(), members.into_iter().map(Into::into).collect());
    }

    /// Registers a native method for `type_name` and its descendants.
    pub fn define_method<F>(
        &self,
        type_name: &str,
        method: &str,
        signature: &str,
        f: F,
    ) -> RuntimeResult<()>
    where
        F: Fn(&ForeignObject, &[ForeignValue]) -> RuntimeResult<ForeignValue> + Send + Sync + 'static,
    {
        let mut state = self.write();
        state.ensure_type(type_name)?;
        state.methods.insert(
            (
                type_name.to_string(),
                method.to_string(),
                signature.to_string(),
            ),
            Arc::new(f),
        );
        Ok(())
    }

    // ================================================================
    // Objects
    // ================================================================

    /// Creates a plain object with initial properties.
    pub fn create<I, K>(&self, type_name: &str, properties: I) -> RuntimeResult<HandleId>
    where
        I: IntoIterator<Item = (K, ForeignValue)>,
        K: Into<String>,
    {
        let mut state = self.write();
        state.ensure_type(type_name)?;
        let mut obj = ForeignObject::new(type_name);
        for (key, value) in properties {
            let key = key.into();
            state.validate_value(&key, &value)?;
            obj.properties.insert(key, value);
        }
        let id = obj.id;
        state.objects.insert(id, obj);
        Ok(id)
    }

    /// Creates a collection object holding `items` in order.
    pub fn create_collection(&self, type_name: &str, items: Vec<HandleId>) -> RuntimeResult<HandleId> {
        let mut state = self.write();
        state.ensure_type(type_name)?;
        for item in &items {
            state.object(*item)?;
        }
        let mut obj = ForeignObject::new(type_name);
        obj.items = Some(items);
        let id = obj.id;
        state.objects.insert(id, obj);
        Ok(id)
    }

    /// Marks an object to be freed when its last reference is released.
    pub fn set_disposable(&self, id: HandleId, disposable: bool) -> RuntimeResult<()> {
        self.write().object_mut(id)?.disposable = disposable;
        Ok(())
    }

    pub fn set_root(&self, name: &str, id: HandleId) -> RuntimeResult<()> {
        let mut state = self.write();
        state.object(id)?;
        state.roots.insert(name.to_string(), id);
        Ok(())
    }

    /// Appends an element, bumping the collection generation.
    pub fn push_item(&self, collection: HandleId, item: HandleId) -> RuntimeResult<()> {
        let mut state = self.write();
        state.object(item)?;
        let obj = state.collection_mut(collection)?;
        obj.items.get_or_insert_with(Vec::new).push(item);
        obj.generation += 1;
        Ok(())
    }

    /// Removes the first occurrence of an element. Returns whether it was
    /// present. A disposable element nobody references any more is freed.
    pub fn remove_item(&self, collection: HandleId, item: HandleId) -> RuntimeResult<bool> {
        let mut state = self.write();
        let obj = state.collection_mut(collection)?;
        let items = obj.items.get_or_insert_with(Vec::new);
        match items.iter().position(|i| *i == item) {
            Some(pos) => {
                items.remove(pos);
                obj.generation += 1;
                state.dispose_if_unreferenced(item);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn contains(&self, id: HandleId) -> bool {
        self.read().objects.contains_key(&id)
    }

    pub fn is_disposed(&self, id: HandleId) -> bool {
        self.read().disposed.contains(&id)
    }

    pub fn ref_count(&self, id: HandleId) -> Option<u32> {
        self.read().objects.get(&id).map(|obj| obj.ref_count)
    }

    /// Copy of an object's current state.
    pub fn object(&self, id: HandleId) -> Option<ForeignObject> {
        self.read().objects.get(&id).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.read().objects.len()
    }

    pub fn root_names(&self) -> Vec<String> {
        self.read().roots.keys().cloned().collect()
    }
}

impl ForeignRuntime for MemoryRuntime {
    fn type_of(&self, id: HandleId) -> RuntimeResult<String> {
        Ok(self.read().object(id)?.type_name.clone())
    }

    fn base_type(&self, type_name: &str) -> Option<String> {
        self.read().types.get(type_name).cloned().flatten()
    }

    fn get_property(&self, id: HandleId, property: &str) -> RuntimeResult<ForeignValue> {
        let state = self.read();
        let obj = state.object(id)?;
        obj.properties
            .get(property)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownProperty {
                type_name: obj.type_name.clone(),
                property: property.to_string(),
            })
    }

    fn set_property(&self, id: HandleId, property: &str, value: ForeignValue) -> RuntimeResult<()> {
        let mut state = self.write();
        let obj = state.object(id)?;
        let current = obj
            .properties
            .get(property)
            .ok_or_else(|| RuntimeError::UnknownProperty {
                type_name: obj.type_name.clone(),
                property: property.to_string(),
            })?;
        let value = state.assignable(property, current, value)?;
        state
            .object_mut(id)?
            .properties
            .insert(property.to_string(), value);
        Ok(())
    }

    fn invoke(
        &self,
        id: HandleId,
        method: &str,
        signature: &str,
        args: &[ForeignValue],
    ) -> RuntimeResult<ForeignValue> {
        let state = self.read();
        let obj = state.object(id)?;
        let native = state
            .find_method(&obj.type_name, method, signature)
            .ok_or_else(|| RuntimeError::UnknownMethod {
                type_name: obj.type_name.clone(),
                method: method.to_string(),
                signature: signature.to_string(),
            })?;
        native(obj, args)
    }

    fn items(&self, id: HandleId) -> RuntimeResult<Vec<HandleId>> {
        let state = self.read();
        state
            .object(id)?
            .items
            .clone()
            .ok_or(RuntimeError::NotACollection(id))
    }

    fn generation(&self, id: HandleId) -> RuntimeResult<u64> {
        let state = self.read();
        let obj = state.object(id)?;
        if obj.items.is_none() {
            return Err(RuntimeError::NotACollection(id));
        }
        Ok(obj.generation)
    }

    fn retain(&self, id: HandleId) -> RuntimeResult<u32> {
        let mut state = self.write();
        let obj = state.object_mut(id)?;
        obj.ref_count += 1;
        Ok(obj.ref_count)
    }

    fn release(&self, id: HandleId) -> RuntimeResult<u32> {
        let mut state = self.write();
        let obj = state.object_mut(id)?;
        obj.ref_count = obj.ref_count.saturating_sub(1);
        let remaining = obj.ref_count;
        state.dispose_if_unreferenced(id);
        Ok(remaining)
    }

    fn root(&self, name: &str) -> Option<HandleId> {
        self.read().roots.get(name).copied()
    }

    fn enum_members(&self, enum_type: &str) -> Option<Vec<String>> {
        self.read().enums.get(enum_type).cloned()
    }

    fn len(&self, id: HandleId) -> RuntimeResult<usize> {
        let state = self.read();
        state
            .object(id)?
            .items
            .as_ref()
            .map(Vec::len)
            .ok_or(RuntimeError::NotACollection(id))
    }
}
