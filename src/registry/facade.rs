//! # Service Locator Facade
//!
//! Short-named aliases over the registry's primary operations, existing
//! purely for call-site ergonomics: frame-driven gameplay code resolves
//! collaborators on nearly every tick, and `locator.req::<dyn Camera>()?`
//! keeps those sites readable. Every method delegates; there is no
//! independent logic here.

use crate::error::Result;
use crate::lifecycle::Service;
use crate::registry::ServiceRegistry;
use std::sync::Arc;

/// Clone-able handle over a shared [`ServiceRegistry`].
///
/// Constructed once at startup and passed to subsystems; tests create
/// isolated instances instead of sharing a global.
#[derive(Debug, Clone, Default)]
pub struct ServiceLocator {
    registry: Arc<ServiceRegistry>,
}

impl ServiceLocator {
    /// Create a locator backed by a fresh registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a locator over an existing shared registry.
    pub fn with_registry(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    /// The underlying registry, for operations without a short alias.
    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Alias for [`ServiceRegistry::register`].
    pub fn set<T>(&self, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry.register(instance);
    }

    /// Alias for [`ServiceRegistry::register_service`].
    pub fn set_service<S: Service>(&self, instance: Arc<S>) {
        self.registry.register_service(instance);
    }

    /// Alias for [`ServiceRegistry::register_factory`].
    pub fn set_factory<T, F>(&self, factory: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.registry.register_factory(factory);
    }

    /// Alias for [`ServiceRegistry::get`].
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry.get::<T>()
    }

    /// Alias for [`ServiceRegistry::require`].
    pub fn req<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry.require::<T>()
    }

    /// Alias for [`ServiceRegistry::has`].
    pub fn has<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.registry.has::<T>()
    }

    /// Alias for [`ServiceRegistry::unregister`].
    pub fn del<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.registry.unregister::<T>()
    }

    /// Alias for [`ServiceRegistry::register_named`].
    pub fn set_named<T>(&self, name: &str, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry.register_named(name, instance);
    }

    /// Alias for [`ServiceRegistry::get_named`].
    pub fn get_named<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry.get_named::<T>(name)
    }

    /// Alias for [`ServiceRegistry::unregister_named`].
    pub fn del_named(&self, name: &str) -> bool {
        self.registry.unregister_named(name)
    }
}
