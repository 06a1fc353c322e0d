//! Most-derived wrapper selection.
//!
//! Foreign calls hand back handles typed as some ancestor; the only type
//! information available at the boundary is the runtime's type-name string.
//! [`WrapperRegistry`] maps those names to local constructors and picks the
//! most specific local wrapper for a handle:
//!
//! 1. the runtime type itself (after aliases),
//! 2. a registered type with the same simple name, when enabled,
//! 3. the nearest registered ancestor along the runtime's base chain,
//! 4. the call-site type.
//!
//! A candidate is only accepted when it is the call-site type or one of its
//! descendants. Decisions are memoized per (runtime type, call-site type).

use crate::config::RegistrySettings;
use crate::wrapper::{ForeignType, Opaque, Wrapper};
use crate::{Handle, ProxyError, ProxyResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, warn};
use wrapkit_runtime::ForeignRuntime;
use wrapkit_types::simple_name;

type Constructor = fn(Handle) -> Box<dyn Wrapper>;

fn construct<T: ForeignType>(handle: Handle) -> Box<dyn Wrapper> {
    Box::new(T::from_handle(handle))
}

/// Foreign type name → local wrapper constructor.
pub struct WrapperRegistry {
    constructors: HashMap<&'static str, Constructor>,
    by_simple_name: HashMap<&'static str, Vec<&'static str>>,
    aliases: BTreeMap<String, String>,
    match_simple_names: bool,
    memo: RwLock<HashMap<(String, &'static str), &'static str>>,
}

impl Default for WrapperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WrapperRegistry {
    /// Creates a registry holding only the [`Opaque`] fallback.
    pub fn new() -> Self {
        let mut registry = Self {
            constructors: HashMap::new(),
            by_simple_name: HashMap::new(),
            aliases: BTreeMap::new(),
            match_simple_names: true,
            memo: RwLock::new(HashMap::new()),
        };
        registry.insert(Opaque::TYPE_NAME, construct::<Opaque>);
        registry
    }

    fn insert(&mut self, type_name: &'static str, constructor: Constructor) {
        self.constructors.insert(type_name, constructor);
        self.by_simple_name
            .entry(simple_name(type_name))
            .or_default()
            .push(type_name);
        self.memo.get_mut().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Registers `T` under its foreign type name.
    pub fn register<T: ForeignType>(&mut self) -> ProxyResult<()> {
        if self.constructors.contains_key(T::TYPE_NAME) {
            return Err(ProxyError::DuplicateRegistration(T::TYPE_NAME.to_string()));
        }
        self.insert(T::TYPE_NAME, construct::<T>);
        debug!(type_name = T::TYPE_NAME, "Registered wrapper type");
        Ok(())
    }

    /// Chaining form of [`register`](Self::register).
    pub fn with<T: ForeignType>(mut self) -> ProxyResult<Self> {
        self.register::<T>()?;
        Ok(self)
    }

    /// Maps a foreign type name onto a registered one before lookup.
    pub fn add_alias(&mut self, foreign: impl Into<String>, local: impl Into<String>) {
        self.aliases.insert(foreign.into(), local.into());
        self.memo.get_mut().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Applies loaded settings. Earlier aliases with the same key are
    /// replaced.
    pub fn configure(&mut self, settings: &RegistrySettings) {
        self.match_simple_names = settings.match_simple_names;
        for (foreign, local) in &settings.aliases {
            self.aliases.insert(foreign.clone(), local.clone());
        }
        self.memo.get_mut().unwrap_or_else(PoisonError::into_inner).clear();
        info!(
            aliases = self.aliases.len(),
            match_simple_names = self.match_simple_names,
            "Registry configured"
        );
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Registered type names, sorted.
    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.constructors.keys().copied().collect();
        names.sort_unstable();
        names
    }

    // ================================================================
    // Resolution
    // ================================================================

    /// Wraps `handle` in the most specific registered type, falling back to
    /// [`Opaque`].
    pub fn resolve(&self, handle: Handle) -> ProxyResult<Box<dyn Wrapper>> {
        self.resolve_within(handle, Opaque::TYPE_NAME, construct::<Opaque>)
    }

    /// Wraps `handle` in the most specific registered type that is `Base`
    /// or derives from it, falling back to `Base` itself.
    pub fn resolve_as<Base: ForeignType>(&self, handle: Handle) -> ProxyResult<Box<dyn Wrapper>> {
        self.resolve_within(handle, Base::TYPE_NAME, construct::<Base>)
    }

    fn resolve_within(
        &self,
        handle: Handle,
        site: &'static str,
        fallback: Constructor,
    ) -> ProxyResult<Box<dyn Wrapper>> {
        let runtime_type = handle.runtime_type()?;
        let runtime = handle.session().runtime();
        let chosen = self.resolve_type_within(&**runtime, &runtime_type, site)?;
        match self.constructors.get(chosen) {
            Some(constructor) => Ok(constructor(handle)),
            None => Ok(fallback(handle)),
        }
    }

    /// Local type name [`resolve`](Self::resolve) would pick for a runtime
    /// type.
    pub fn resolve_type(
        &self,
        runtime: &dyn ForeignRuntime,
        runtime_type: &str,
    ) -> ProxyResult<&'static str> {
        self.resolve_type_within(runtime, runtime_type, Opaque::TYPE_NAME)
    }

    fn resolve_type_within(
        &self,
        runtime: &dyn ForeignRuntime,
        runtime_type: &str,
        site: &'static str,
    ) -> ProxyResult<&'static str> {
        let key = (runtime_type.to_string(), site);
        if let Some(hit) = self
            .memo
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(*hit);
        }

        let mut chain = vec![runtime_type.to_string()];
        chain.extend(runtime.ancestors(runtime_type));

        let mut chosen = None;
        for foreign in &chain {
            if let Some(local) = self.lookup(foreign)? {
                if self.accepts(runtime, foreign, site) {
                    chosen = Some(local);
                    break;
                }
                debug!(
                    runtime_type,
                    candidate = local,
                    site,
                    "Skipping candidate outside call-site hierarchy"
                );
            }
        }

        let chosen = match chosen {
            Some(local) => {
                if local != runtime_type {
                    debug!(runtime_type, resolved = local, "Resolved to registered ancestor");
                }
                local
            }
            None => {
                if site != Opaque::TYPE_NAME && !self.accepts(runtime, runtime_type, site) {
                    warn!(
                        runtime_type,
                        site, "Runtime type is outside the call-site hierarchy, using call-site type"
                    );
                }
                site
            }
        };

        self.memo
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, chosen);
        Ok(chosen)
    }

    /// Registered local name for one foreign name: alias, then exact, then
    /// unique simple name.
    fn lookup(&self, foreign: &str) -> ProxyResult<Option<&'static str>> {
        let name = self.aliases.get(foreign).map_or(foreign, String::as_str);
        if let Some((registered, _)) = self.constructors.get_key_value(name) {
            return Ok(Some(*registered));
        }
        if !self.match_simple_names {
            return Ok(None);
        }
        let simple = simple_name(name);
        match self.by_simple_name.get(simple).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([only]) => Ok(Some(*only)),
            Some(many) => Err(ProxyError::AmbiguousRegistration {
                name: simple.to_string(),
                candidates: many.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    fn names_match(&self, a: &str, b: &str) -> bool {
        a == b || (self.match_simple_names && simple_name(a) == simple_name(b))
    }

    /// True when the foreign type `foreign` is `site` or derives from it.
    pub(crate) fn accepts(&self, runtime: &dyn ForeignRuntime, foreign: &str, site: &str) -> bool {
        if site == Opaque::TYPE_NAME {
            return true;
        }
        let foreign = self.aliases.get(foreign).map_or(foreign, String::as_str);
        self.names_match(foreign, site)
            || runtime
                .ancestors(foreign)
                .iter()
                .any(|ancestor| self.names_match(ancestor, site))
    }

    // ================================================================
    // Casting
    // ================================================================

    /// Builds a `T` over a fresh reference to the wrapper's object when the
    /// object's runtime type is `T` or derives from it.
    pub fn cast<T: ForeignType>(&self, wrapper: &dyn Wrapper) -> ProxyResult<T> {
        let handle = wrapper.handle();
        let runtime_type = handle.runtime_type()?;
        if !self.accepts(&**handle.session().runtime(), &runtime_type, T::TYPE_NAME) {
            return Err(ProxyError::InvalidCast {
                runtime_type,
                target: T::TYPE_NAME.to_string(),
            });
        }
        Ok(T::from_handle(handle.reacquire()?))
    }

    /// True when the wrapper's object is an instance of `type_name`.
    pub fn is_instance(&self, wrapper: &dyn Wrapper, type_name: &str) -> ProxyResult<bool> {
        let handle = wrapper.handle();
        let runtime_type = handle.runtime_type()?;
        Ok(self.accepts(&**handle.session().runtime(), &runtime_type, type_name))
    }
}
