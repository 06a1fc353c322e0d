//! Id- and name-keyed views over foreign collections.

use crate::wrapper::{ForeignType, Wrapper};
use crate::{Handle, ProxyError, ProxyResult};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};
use wrapkit_runtime::RuntimeError;
use wrapkit_types::{ForeignValue, HandleId};

/// Collection lookup key.
///
/// Integer keys look up by element id, string keys by element name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Id(i64),
    Name(String),
}

impl From<i64> for Key {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<i32> for Key {
    fn from(id: i32) -> Self {
        Self::Id(i64::from(id))
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Name(name) => write!(f, "name '{name}'"),
        }
    }
}

/// What `get_by_name` does when several elements share a name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamePolicy {
    /// Fail with `AmbiguousName`.
    #[default]
    Strict,
    /// Return the element at the lowest position.
    FirstMatch,
}

/// One consistent snapshot of the foreign element list.
#[derive(Debug)]
struct CollectionIndex {
    generation: u64,
    items: Vec<HandleId>,
    by_id: HashMap<i64, usize>,
    /// Positions per name, ascending.
    by_name: HashMap<String, Vec<usize>>,
}

impl CollectionIndex {
    fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<_> = self.by_id.iter().map(|(id, pos)| (*pos, *id)).collect();
        ids.sort_unstable();
        ids.into_iter().map(|(_, id)| id).collect()
    }
}

/// A view over a homogeneous foreign collection whose elements are `T` or
/// derive from it.
///
/// Lookups go through a lazily built index. The index records the
/// collection generation it was built from and is rebuilt on the next
/// access after the foreign side mutates the collection. Elements are
/// wrapped fresh on every lookup and every traversal.
pub struct Collection<T: ForeignType> {
    handle: Handle,
    index: Mutex<Option<Arc<CollectionIndex>>>,
    _element: PhantomData<fn() -> T>,
}

impl<T: ForeignType> Collection<T> {
    /// Wraps a collection handle. Fails when the object is not a collection.
    pub fn new(handle: Handle) -> ProxyResult<Self> {
        handle.session().runtime().generation(handle.id())?;
        Ok(Self {
            handle,
            index: Mutex::new(None),
            _element: PhantomData,
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn into_handle(self) -> Handle {
        self.handle
    }

    /// Live element count.
    pub fn count(&self) -> ProxyResult<usize> {
        Ok(self.handle.session().runtime().len(self.handle.id())?)
    }

    pub fn is_empty(&self) -> ProxyResult<bool> {
        Ok(self.count()? == 0)
    }

    /// Looks up by id or by name.
    pub fn get(&self, key: impl Into<Key>) -> ProxyResult<Box<dyn Wrapper>> {
        match key.into() {
            Key::Id(id) => self.get_by_id(id),
            Key::Name(name) => self.get_by_name(&name),
        }
    }

    pub fn get_by_id(&self, id: i64) -> ProxyResult<Box<dyn Wrapper>> {
        let index = self.index()?;
        match index.by_id.get(&id) {
            Some(&pos) => self.element(index.items[pos]),
            None => Err(ProxyError::NotFound(format!("no element with id {id}"))),
        }
    }

    pub fn get_by_name(&self, name: &str) -> ProxyResult<Box<dyn Wrapper>> {
        let index = self.index()?;
        let positions = match index.by_name.get(name) {
            Some(positions) if !positions.is_empty() => positions,
            _ => return Err(ProxyError::NotFound(format!("no element named '{name}'"))),
        };
        if positions.len() > 1 && self.name_policy() == NamePolicy::Strict {
            return Err(ProxyError::AmbiguousName {
                name: name.to_string(),
                count: positions.len(),
            });
        }
        self.element(index.items[positions[0]])
    }

    /// True iff `get` would not fail with `NotFound`.
    pub fn contains(&self, key: impl Into<Key>) -> ProxyResult<bool> {
        let index = self.index()?;
        Ok(match key.into() {
            Key::Id(id) => index.by_id.contains_key(&id),
            Key::Name(name) => index.by_name.get(&name).is_some_and(|p| !p.is_empty()),
        })
    }

    /// Element ids in collection order.
    pub fn ids(&self) -> ProxyResult<Vec<i64>> {
        Ok(self.index()?.ids())
    }

    /// Distinct element names, sorted.
    pub fn names(&self) -> ProxyResult<Vec<String>> {
        let mut names: Vec<_> = self.index()?.by_name.keys().cloned().collect();
        names.sort_unstable();
        Ok(names)
    }

    /// Lazily wraps each element. The element list is captured when the
    /// iterator is created; calling `iter` again starts a new traversal.
    pub fn iter(&self) -> ProxyResult<CollectionIter<'_, T>> {
        let items = self.handle.session().runtime().items(self.handle.id())?;
        Ok(CollectionIter {
            collection: self,
            items: items.into_iter(),
        })
    }

    fn element(&self, id: HandleId) -> ProxyResult<Box<dyn Wrapper>> {
        let session = self.handle.session();
        let handle = Handle::acquire(session, id)?;
        session.registry().resolve_as::<T>(handle)
    }

    fn name_policy(&self) -> NamePolicy {
        self.handle.session().config().collections.name_policy
    }

    fn index(&self) -> ProxyResult<Arc<CollectionIndex>> {
        let runtime = self.handle.session().runtime();
        let generation = runtime.generation(self.handle.id())?;
        let mut slot = self.index.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = slot.as_ref() {
            if index.generation == generation {
                return Ok(Arc::clone(index));
            }
            debug!(
                collection = %self.handle.id(),
                built = index.generation,
                current = generation,
                "Collection changed, rebuilding index"
            );
        }
        let index = Arc::new(self.build_index(generation)?);
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    fn build_index(&self, generation: u64) -> ProxyResult<CollectionIndex> {
        let session = self.handle.session();
        let runtime = session.runtime();
        let settings = &session.config().collections;
        let items = runtime.items(self.handle.id())?;

        let mut by_id = HashMap::new();
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, item) in items.iter().enumerate() {
            if let Some(value) = optional_property(runtime.get_property(*item, &settings.id_property))? {
                let id = value.as_i64().ok_or_else(|| {
                    ProxyError::conversion(
                        format!("integer '{}'", settings.id_property),
                        value.kind(),
                    )
                })?;
                if by_id.contains_key(&id) {
                    warn!(collection = %self.handle.id(), id, "Duplicate element id, keeping first");
                } else {
                    by_id.insert(id, pos);
                }
            }
            if let Some(value) = optional_property(runtime.get_property(*item, &settings.name_property))? {
                match value {
                    ForeignValue::Str(name) => by_name.entry(name).or_default().push(pos),
                    other => {
                        return Err(ProxyError::conversion(
                            format!("string '{}'", settings.name_property),
                            other.kind(),
                        ));
                    }
                }
            }
        }

        debug!(
            collection = %self.handle.id(),
            generation,
            items = items.len(),
            "Built collection index"
        );
        Ok(CollectionIndex {
            generation,
            items,
            by_id,
            by_name,
        })
    }
}

/// Missing and null key properties both mean "not indexable by this key".
/// So does an element the runtime no longer knows.
fn optional_property(
    result: Result<ForeignValue, RuntimeError>,
) -> ProxyResult<Option<ForeignValue>> {
    match result {
        Ok(ForeignValue::Null)
        | Err(RuntimeError::UnknownProperty { .. })
        | Err(RuntimeError::Disposed(_))
        | Err(RuntimeError::UnknownHandle(_)) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(e.into()),
    }
}

impl<T: ForeignType> Wrapper for Collection<T> {
    fn handle(&self) -> &Handle {
        &self.handle
    }

    fn declared_type(&self) -> &'static str {
        "Collection"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl<T: ForeignType> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("handle", &self.handle)
            .field("element", &T::TYPE_NAME)
            .finish()
    }
}

/// Iterator returned by [`Collection::iter`].
pub struct CollectionIter<'a, T: ForeignType> {
    collection: &'a Collection<T>,
    items: std::vec::IntoIter<HandleId>,
}

impl<T: ForeignType> Iterator for CollectionIter<'_, T> {
    type Item = ProxyResult<Box<dyn Wrapper>>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.items.next()?;
        Some(self.collection.element(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}
