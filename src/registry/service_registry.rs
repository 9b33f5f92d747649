//! # Service Registry
//!
//! Central concurrent service store with type-keyed, factory-backed, and
//! name-keyed bindings plus lookup instrumentation.
//!
//! ## Overview
//!
//! The `ServiceRegistry` is a passive, thread-safe directory: subsystems
//! register their service instances under a type key (usually the capability
//! trait the instance implements) and collaborators resolve them without
//! hard-coded globals. Construction can be deferred with factories, and
//! structurally identical services can coexist under string names.
//!
//! ## Key Features
//!
//! - **Type-keyed singletons** with replace-with-warning semantics for
//!   hot-swapping implementations (e.g. test doubles)
//! - **Lazy construction** via zero-arg factories, published at most once
//! - **Named bindings** for multi-instance scenarios, type-checked on read
//! - **Lock-free hot path** using sharded concurrent maps and atomic counters
//! - **Hit-rate instrumentation** for coarse lookup monitoring
//!
//! ## Usage
//!
//! ```rust
//! use locator_core::registry::ServiceRegistry;
//! use std::sync::Arc;
//!
//! struct AudioManager {
//!     channels: usize,
//! }
//!
//! let registry = ServiceRegistry::new();
//! registry.register(Arc::new(AudioManager { channels: 32 }));
//!
//! let audio = registry.require::<AudioManager>().unwrap();
//! assert_eq!(audio.channels, 32);
//! ```
//!
//! ## Concurrency
//!
//! No operation takes a registry-wide lock. Under concurrent first access to
//! a factory binding, more than one factory invocation may occur; publish is
//! insert-if-absent, so exactly one instance is ever retained (first writer
//! wins) and the losers' constructions are dropped. This is an accepted
//! tradeoff in favor of a lock-free fast path, not an exactly-once guarantee.

use crate::error::{LocatorError, Result};
use crate::lifecycle::Service;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Type-erased service instance. Values are stored as `Arc<Arc<T>>` so that
/// unsized targets (trait objects) survive the round trip through `Any`.
type AnyInstance = Arc<dyn Any + Send + Sync>;

/// Type-erased deferred constructor.
type Factory = Arc<dyn Fn() -> AnyInstance + Send + Sync>;

struct EagerEntry {
    instance: AnyInstance,
    /// Lifecycle handle to the same instance, captured when registered via
    /// `register_service`. `None` for plain registrations.
    lifecycle: Option<Arc<dyn Service>>,
    type_name: &'static str,
    registered_at: DateTime<Utc>,
}

struct FactoryEntry {
    factory: Factory,
    type_name: &'static str,
    registered_at: DateTime<Utc>,
}

struct NamedEntry {
    instance: AnyInstance,
    type_name: &'static str,
    registered_at: DateTime<Utc>,
}

struct RosterEntry {
    key: TypeId,
    service: Arc<dyn Service>,
}

/// Kind of a registered binding, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    Eager,
    Factory,
    Named,
}

/// Diagnostic view of one registered binding.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceBinding {
    pub key: String,
    pub kind: BindingKind,
    pub service_name: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// Lookup statistics: `hit_rate` is `hit_count / access_count`, defined as
/// zero when no lookup has been attempted.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceStats {
    pub access_count: u64,
    pub hit_count: u64,
    pub hit_rate: f64,
}

/// Central concurrent service directory.
pub struct ServiceRegistry {
    /// Already-constructed instances keyed by type
    services: DashMap<TypeId, EagerEntry>,
    /// Deferred-construction bindings keyed by type
    factories: DashMap<TypeId, FactoryEntry>,
    /// Instances keyed by arbitrary string, for multi-instance scenarios
    named: DashMap<String, NamedEntry>,
    /// Lifecycle-capable services in registration order, for the coordinator
    roster: RwLock<Vec<RosterEntry>>,
    access_count: AtomicU64,
    hit_count: AtomicU64,
}

impl ServiceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
            factories: DashMap::new(),
            named: DashMap::new(),
            roster: RwLock::new(Vec::new()),
            access_count: AtomicU64::new(0),
            hit_count: AtomicU64::new(0),
        }
    }

    /// Bind `instance` under the type key `T`, unconditionally overwriting
    /// any prior binding (eager or factory) for that key.
    ///
    /// `T` may be a trait object, so services are usually registered under
    /// the capability trait callers will resolve:
    /// `registry.register::<dyn AudioService>(arc)`.
    pub fn register<T>(&self, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.insert_eager(
            TypeId::of::<T>(),
            std::any::type_name::<T>(),
            Arc::new(instance),
            None,
        );
    }

    /// Like [`register`](Self::register), but additionally enrolls the
    /// instance in the lifecycle roster the [`UpdateCoordinator`] iterates.
    ///
    /// Re-registering under the same key replaces the roster entry and moves
    /// it to the tail, so a replacement re-enters registration order last.
    ///
    /// [`UpdateCoordinator`]: crate::coordinator::UpdateCoordinator
    pub fn register_service<S: Service>(&self, instance: Arc<S>) {
        let key = TypeId::of::<S>();
        let lifecycle: Arc<dyn Service> = instance.clone();
        {
            let mut roster = self.roster.write();
            roster.retain(|entry| entry.key != key);
            roster.push(RosterEntry {
                key,
                service: lifecycle.clone(),
            });
        }
        self.insert_eager(
            key,
            std::any::type_name::<S>(),
            Arc::new(instance),
            Some(lifecycle),
        );
    }

    fn insert_eager(
        &self,
        key: TypeId,
        type_name: &'static str,
        instance: AnyInstance,
        lifecycle: Option<Arc<dyn Service>>,
    ) {
        // Invariant: a key never holds an eager and a factory binding at once.
        let removed_factory = self.factories.remove(&key).is_some();
        // A plain registration replacing a lifecycle-enrolled instance must
        // also evict it from the roster, or the coordinator would keep
        // ticking the replaced instance. `register_service` maintains its
        // own roster entry before reaching here.
        if lifecycle.is_none() {
            self.roster.write().retain(|entry| entry.key != key);
        }
        let prior = self.services.insert(
            key,
            EagerEntry {
                instance,
                lifecycle,
                type_name,
                registered_at: Utc::now(),
            },
        );

        if prior.is_some() || removed_factory {
            warn!(service = type_name, "Replacing existing registration");
        } else {
            info!(service = type_name, "Registered service");
        }
    }

    /// Bind a zero-arg constructor under the type key `T` without invoking
    /// it. Overwrites any prior factory for the same key; an existing eager
    /// binding is left untouched (callers should not mix the two for one
    /// key).
    pub fn register_factory<T, F>(&self, factory: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        let erased: Factory = Arc::new(move || Arc::new(factory()) as AnyInstance);
        let prior = self.factories.insert(
            TypeId::of::<T>(),
            FactoryEntry {
                factory: erased,
                type_name,
                registered_at: Utc::now(),
            },
        );

        if prior.is_some() {
            warn!(service = type_name, "Replacing existing factory");
        } else {
            debug!(service = type_name, "Registered factory");
        }
    }

    /// Resolve the instance bound under `T`, constructing it from a factory
    /// binding on first access.
    ///
    /// Under concurrent first access the returned instance may be a racing
    /// thread's publication rather than this thread's own construction;
    /// callers must not assume identity with any instance they built.
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.access_count.fetch_add(1, Ordering::Relaxed);
        let key = TypeId::of::<T>();

        // Hot path: frame-driven lookups land here.
        if let Some(entry) = self.services.get(&key) {
            if let Some(instance) = entry.instance.downcast_ref::<Arc<T>>() {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                return Some(instance.clone());
            }
        }

        // Lazy path. The factory is cloned out of the map so user code never
        // runs under a shard lock (a factory may itself call the registry).
        let factory = self
            .factories
            .get(&key)
            .map(|entry| (entry.factory.clone(), entry.type_name));
        if let Some((factory, type_name)) = factory {
            let produced = factory();
            let stored = match self.services.entry(key) {
                // A racing thread published first; keep its instance.
                Entry::Occupied(occupied) => occupied.get().instance.clone(),
                Entry::Vacant(vacant) => {
                    debug!(service = type_name, "Published lazily constructed service");
                    vacant
                        .insert(EagerEntry {
                            instance: produced,
                            lifecycle: None,
                            type_name,
                            registered_at: Utc::now(),
                        })
                        .instance
                        .clone()
                }
            };
            self.factories.remove(&key);
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return stored.downcast_ref::<Arc<T>>().cloned();
        }

        debug!(service = std::any::type_name::<T>(), "Service not found");
        None
    }

    /// Fail-fast resolution for mandatory collaborators.
    pub fn require<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get::<T>()
            .ok_or_else(|| LocatorError::RequiredServiceMissing(std::any::type_name::<T>()))
    }

    /// Whether `T` has an eager or factory binding. Does not touch
    /// statistics and never invokes a factory.
    pub fn has<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        let key = TypeId::of::<T>();
        self.services.contains_key(&key) || self.factories.contains_key(&key)
    }

    /// Remove the binding for `T` from both the eager and factory stores.
    /// Idempotent; returns whether anything was removed.
    pub fn unregister<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        let key = TypeId::of::<T>();
        let removed_eager = self.services.remove(&key).is_some();
        let removed_factory = self.factories.remove(&key).is_some();

        if removed_eager || removed_factory {
            self.roster.write().retain(|entry| entry.key != key);
            info!(service = std::any::type_name::<T>(), "Unregistered service");
            true
        } else {
            false
        }
    }

    /// Bind `instance` under an arbitrary string key, for scenarios where
    /// multiple instances of one capability must be independently
    /// addressable.
    pub fn register_named<T>(&self, name: &str, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let prior = self.named.insert(
            name.to_string(),
            NamedEntry {
                instance: Arc::new(instance),
                type_name: std::any::type_name::<T>(),
                registered_at: Utc::now(),
            },
        );

        if prior.is_some() {
            warn!(name, "Replacing existing named registration");
        } else {
            info!(name, service = std::any::type_name::<T>(), "Registered named service");
        }
    }

    /// Resolve a named binding, type-checked on read: a name bound to a
    /// value of a different type is treated as not-found, with a diagnostic
    /// distinguishing "registered wrong" from "never registered".
    pub fn get_named<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.access_count.fetch_add(1, Ordering::Relaxed);

        match self.named.get(name) {
            Some(entry) => match entry.instance.downcast_ref::<Arc<T>>() {
                Some(instance) => {
                    self.hit_count.fetch_add(1, Ordering::Relaxed);
                    Some(instance.clone())
                }
                None => {
                    warn!(
                        name,
                        stored = entry.type_name,
                        requested = std::any::type_name::<T>(),
                        "Named service registered under a different type"
                    );
                    None
                }
            },
            None => {
                debug!(name, "Named service not found");
                None
            }
        }
    }

    /// Remove a named binding. Idempotent; returns whether anything was
    /// removed.
    pub fn unregister_named(&self, name: &str) -> bool {
        if self.named.remove(name).is_some() {
            info!(name, "Unregistered named service");
            true
        } else {
            false
        }
    }

    /// Empty every store and zero the statistics. Used primarily at
    /// process/session boundaries to guarantee no cross-run leakage.
    pub fn clear(&self) {
        let removed = self.service_count();
        self.services.clear();
        self.factories.clear();
        self.named.clear();
        self.roster.write().clear();
        self.access_count.store(0, Ordering::Relaxed);
        self.hit_count.store(0, Ordering::Relaxed);
        info!(removed, "Cleared service registry");
    }

    /// Sum of eager, factory, and named binding counts. A coarse
    /// instrumentation signal, not a count of distinct logical services.
    pub fn service_count(&self) -> usize {
        self.services.len() + self.factories.len() + self.named.len()
    }

    /// Snapshot of the lookup counters.
    pub fn performance_stats(&self) -> PerformanceStats {
        let access_count = self.access_count.load(Ordering::Relaxed);
        let hit_count = self.hit_count.load(Ordering::Relaxed);
        let hit_rate = if access_count == 0 {
            0.0
        } else {
            hit_count as f64 / access_count as f64
        };
        PerformanceStats {
            access_count,
            hit_count,
            hit_rate,
        }
    }

    /// Zero both counters without touching stored services.
    pub fn reset_performance_stats(&self) {
        self.access_count.store(0, Ordering::Relaxed);
        self.hit_count.store(0, Ordering::Relaxed);
    }

    /// Full diagnostic listing of every registered binding.
    pub fn dump(&self) -> Vec<ServiceBinding> {
        let mut bindings = Vec::with_capacity(self.service_count());
        for entry in self.services.iter() {
            bindings.push(ServiceBinding {
                key: entry.type_name.to_string(),
                kind: BindingKind::Eager,
                service_name: entry
                    .lifecycle
                    .as_ref()
                    .map(|service| service.service_name().to_string()),
                registered_at: entry.registered_at,
            });
        }
        for entry in self.factories.iter() {
            bindings.push(ServiceBinding {
                key: entry.type_name.to_string(),
                kind: BindingKind::Factory,
                service_name: None,
                registered_at: entry.registered_at,
            });
        }
        for entry in self.named.iter() {
            bindings.push(ServiceBinding {
                key: entry.key().clone(),
                kind: BindingKind::Named,
                service_name: None,
                registered_at: entry.registered_at,
            });
        }
        bindings
    }

    /// Snapshot of lifecycle-capable services in registration order.
    /// Consumed by the [`UpdateCoordinator`](crate::coordinator::UpdateCoordinator).
    pub fn lifecycle_roster(&self) -> Vec<Arc<dyn Service>> {
        self.roster
            .read()
            .iter()
            .map(|entry| entry.service.clone())
            .collect()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.services.len())
            .field("factories", &self.factories.len())
            .field("named", &self.named.len())
            .field("access_count", &self.access_count.load(Ordering::Relaxed))
            .field("hit_count", &self.hit_count.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    struct AudioManager {
        channels: usize,
    }

    struct InputManager;

    trait Clock: Send + Sync {
        fn now_ms(&self) -> u64;
    }

    struct FixedClock(u64);
    impl Clock for FixedClock {
        fn now_ms(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn test_register_and_get_identity() {
        let registry = ServiceRegistry::new();
        let audio = Arc::new(AudioManager { channels: 16 });
        registry.register(audio.clone());

        let resolved = registry.get::<AudioManager>().unwrap();
        assert!(Arc::ptr_eq(&audio, &resolved));
    }

    #[test]
    fn test_trait_object_key() {
        let registry = ServiceRegistry::new();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(42));
        registry.register::<dyn Clock>(clock);

        let resolved = registry.get::<dyn Clock>().unwrap();
        assert_eq!(resolved.now_ms(), 42);
    }

    #[test]
    fn test_replace_semantics() {
        let registry = ServiceRegistry::new();
        registry.register(Arc::new(AudioManager { channels: 8 }));
        registry.register(Arc::new(AudioManager { channels: 64 }));

        let resolved = registry.get::<AudioManager>().unwrap();
        assert_eq!(resolved.channels, 64);
        assert_eq!(registry.service_count(), 1);
    }

    #[test]
    fn test_factory_is_lazy_and_invoked_once() {
        let registry = ServiceRegistry::new();
        let invocations = Arc::new(AtomicUsize::new(0));

        let counter = invocations.clone();
        registry.register_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(AudioManager { channels: 4 })
        });

        assert!(registry.has::<AudioManager>());
        assert_eq!(invocations.load(Ordering::SeqCst), 0);

        let first = registry.get::<AudioManager>().unwrap();
        assert_eq!(invocations.load(Ordering::SeqCst), 1);

        let second = registry.get::<AudioManager>().unwrap();
        assert_eq!(invocations.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_register_overwrites_factory() {
        let registry = ServiceRegistry::new();
        let invocations = Arc::new(AtomicUsize::new(0));

        let counter = invocations.clone();
        registry.register_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(AudioManager { channels: 4 })
        });
        registry.register(Arc::new(AudioManager { channels: 99 }));

        let resolved = registry.get::<AudioManager>().unwrap();
        assert_eq!(resolved.channels, 99);
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
        assert_eq!(registry.service_count(), 1);
    }

    #[test]
    fn test_unregister_removes_both_forms() {
        let registry = ServiceRegistry::new();
        registry.register_factory(|| Arc::new(InputManager));
        assert!(registry.has::<InputManager>());

        assert!(registry.unregister::<InputManager>());
        assert!(!registry.has::<InputManager>());
        // idempotent
        assert!(!registry.unregister::<InputManager>());
    }

    #[test]
    fn test_require_fails_loud() {
        let registry = ServiceRegistry::new();
        let err = registry.require::<AudioManager>().unwrap_err();
        assert!(matches!(err, LocatorError::RequiredServiceMissing(_)));
        assert!(err.to_string().contains("AudioManager"));

        registry.register(Arc::new(AudioManager { channels: 2 }));
        let required = registry.require::<AudioManager>().unwrap();
        let gotten = registry.get::<AudioManager>().unwrap();
        assert!(Arc::ptr_eq(&required, &gotten));
    }

    #[test]
    fn test_named_type_safety() {
        let registry = ServiceRegistry::new();
        registry.register_named("player_one", Arc::new(AudioManager { channels: 1 }));

        // Wrong type is a miss, not a panic
        assert!(registry.get_named::<InputManager>("player_one").is_none());
        // Right type resolves
        assert!(registry.get_named::<AudioManager>("player_one").is_some());
        // Absent name is also a miss
        assert!(registry.get_named::<AudioManager>("player_two").is_none());
    }

    #[test]
    fn test_named_lifecycle() {
        let registry = ServiceRegistry::new();
        registry.register_named("left", Arc::new(AudioManager { channels: 1 }));
        registry.register_named("right", Arc::new(AudioManager { channels: 2 }));
        assert_eq!(registry.service_count(), 2);

        assert!(registry.unregister_named("left"));
        assert!(!registry.unregister_named("left"));
        assert_eq!(registry.service_count(), 1);
    }

    #[test]
    fn test_performance_stats() {
        let registry = ServiceRegistry::new();
        let stats = registry.performance_stats();
        assert_eq!(stats.access_count, 0);
        assert_eq!(stats.hit_rate, 0.0);

        registry.register(Arc::new(AudioManager { channels: 2 }));
        registry.get::<AudioManager>(); // hit
        registry.get::<AudioManager>(); // hit
        registry.get::<InputManager>(); // miss
        registry.get_named::<AudioManager>("nope"); // miss

        let stats = registry.performance_stats();
        assert_eq!(stats.access_count, 4);
        assert_eq!(stats.hit_count, 2);
        assert_eq!(stats.hit_rate, 0.5);

        registry.reset_performance_stats();
        let stats = registry.performance_stats();
        assert_eq!(stats.access_count, 0);
        assert_eq!(stats.hit_count, 0);
        // services untouched by a stats reset
        assert!(registry.get::<AudioManager>().is_some());
    }

    #[test]
    fn test_has_does_not_touch_stats() {
        let registry = ServiceRegistry::new();
        registry.register(Arc::new(AudioManager { channels: 2 }));
        registry.has::<AudioManager>();
        registry.has::<InputManager>();
        assert_eq!(registry.performance_stats().access_count, 0);
    }

    #[test]
    fn test_clear_completeness() {
        let registry = ServiceRegistry::new();
        registry.register(Arc::new(AudioManager { channels: 2 }));
        registry.register_factory(|| Arc::new(InputManager));
        registry.register_named("aux", Arc::new(AudioManager { channels: 1 }));
        registry.get::<AudioManager>();

        registry.clear();
        assert_eq!(registry.service_count(), 0);
        let stats = registry.performance_stats();
        assert_eq!(stats.access_count, 0);
        assert_eq!(stats.hit_count, 0);
        assert!(registry.lifecycle_roster().is_empty());
    }

    #[test]
    fn test_dump_lists_all_binding_kinds() {
        let registry = ServiceRegistry::new();
        registry.register(Arc::new(AudioManager { channels: 2 }));
        registry.register_factory(|| Arc::new(InputManager));
        registry.register_named("aux", Arc::new(AudioManager { channels: 1 }));

        let bindings = registry.dump();
        assert_eq!(bindings.len(), 3);
        assert!(bindings.iter().any(|b| b.kind == BindingKind::Eager));
        assert!(bindings.iter().any(|b| b.kind == BindingKind::Factory));
        assert!(bindings
            .iter()
            .any(|b| b.kind == BindingKind::Named && b.key == "aux"));
    }

    #[test]
    fn test_concurrent_factory_publishes_single_instance() {
        let registry = Arc::new(ServiceRegistry::new());
        let invocations = Arc::new(AtomicUsize::new(0));

        let counter = invocations.clone();
        registry.register_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(AudioManager { channels: 7 })
        });

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(std::thread::spawn(move || {
                registry.get::<AudioManager>().unwrap()
            }));
        }
        let resolved: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // The factory may have run more than once, but everyone observes the
        // same published instance.
        for instance in &resolved[1..] {
            assert!(Arc::ptr_eq(&resolved[0], instance));
        }
        assert!(invocations.load(Ordering::SeqCst) >= 1);
        assert!(!registry.has::<InputManager>());
        assert_eq!(registry.service_count(), 1);
    }
}
