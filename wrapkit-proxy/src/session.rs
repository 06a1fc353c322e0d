use crate::wrapper::{ForeignType, Wrapper};
use crate::{Handle, ProxyConfig, ProxyError, ProxyResult, WrapperRegistry};
use std::sync::Arc;
use tracing::info;
use wrapkit_runtime::ForeignRuntime;
use wrapkit_types::HandleId;

struct SessionInner {
    runtime: Arc<dyn ForeignRuntime>,
    registry: WrapperRegistry,
    config: ProxyConfig,
}

/// A foreign runtime paired with the registry used to wrap its objects.
///
/// Cheap to clone; every [`Handle`] carries one so wrappers can resolve the
/// objects they reference.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub fn new(runtime: Arc<dyn ForeignRuntime>, registry: WrapperRegistry) -> Self {
        Self::with_config(runtime, registry, ProxyConfig::default())
    }

    /// Applies `config` to the registry and keeps it for collection views.
    pub fn with_config(
        runtime: Arc<dyn ForeignRuntime>,
        mut registry: WrapperRegistry,
        config: ProxyConfig,
    ) -> Self {
        registry.configure(&config.registry);
        info!(registered_types = registry.len(), "Session opened");
        Self {
            inner: Arc::new(SessionInner {
                runtime,
                registry,
                config,
            }),
        }
    }

    pub fn runtime(&self) -> &Arc<dyn ForeignRuntime> {
        &self.inner.runtime
    }

    pub fn registry(&self) -> &WrapperRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.inner.config
    }

    pub fn acquire(&self, id: HandleId) -> ProxyResult<Handle> {
        Handle::acquire(self, id)
    }

    /// Wraps an object in its most-derived registered type.
    pub fn wrap(&self, id: HandleId) -> ProxyResult<Box<dyn Wrapper>> {
        self.registry().resolve(self.acquire(id)?)
    }

    fn root_id(&self, name: &str) -> ProxyResult<HandleId> {
        self.runtime()
            .root(name)
            .ok_or_else(|| ProxyError::NotFound(format!("root '{name}'")))
    }

    /// Wraps a named entry point in its most-derived registered type.
    pub fn root(&self, name: &str) -> ProxyResult<Box<dyn Wrapper>> {
        self.wrap(self.root_id(name)?)
    }

    /// Wraps a named entry point as exactly `T`. Fails with `InvalidCast`
    /// when the object is not a `T`.
    pub fn root_as<T: ForeignType>(&self, name: &str) -> ProxyResult<T> {
        let handle = self.acquire(self.root_id(name)?)?;
        let runtime_type = handle.runtime_type()?;
        if !self
            .registry()
            .accepts(&**self.runtime(), &runtime_type, T::TYPE_NAME)
        {
            return Err(ProxyError::InvalidCast {
                runtime_type,
                target: T::TYPE_NAME.to_string(),
            });
        }
        Ok(T::from_handle(handle))
    }
}
