//! # Hybrid Resolver
//!
//! Fallback-aware lookup for staged migration off ambient global discovery.
//!
//! ## Resolution Flow
//!
//! ```text
//! resolve_with_fallback::<T>()
//!         │
//!    ┌────▼─────────┐  disabled
//!    │ use_registry?├────────────┐
//!    └────┬─────────┘            │
//!         │ enabled              │
//!    ┌────▼─────────┐   miss/    │
//!    │ registry get │───panic────┤
//!    └────┬─────────┘ (swallowed)│
//!         │ hit             ┌────▼──────────────┐ disabled
//!         ▼                 │ legacy_fallback?  ├─────────┐
//!       Some(v)             └────┬──────────────┘         │
//!                                │ enabled                │
//!                           ┌────▼──────────────┐  miss/  ▼
//!                           │ legacy discovery  ├──error─None
//!                           └────┬──────────────┘(swallowed)
//!                                │ found
//!                                ▼
//!                              Some(v)
//! ```
//!
//! The two toggles are independent so an operator can (a) verify the
//! registry path works before removing the legacy path, and (b) flip off the
//! legacy path per-environment without a code change.
//!
//! ## Failure swallowing
//!
//! Any failure during resolution, whether a panicking factory reached
//! through the registry or a legacy scan that errors, is deliberately
//! downgraded to a miss at this boundary. A half-migrated system must never let registry
//! failures break callers still depending on the old path. Swallowed
//! failures are routed to the diagnostic sink (`warn!`) so they stay
//! observable without being fatal.

use crate::registry::ServiceRegistry;
use std::any::{Any, TypeId};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Atomic view of the two migration toggles. Read on every hybrid lookup;
/// storage and persistence of the underlying flags belong to the host.
#[derive(Debug)]
pub struct ResolverToggles {
    use_registry: AtomicBool,
    allow_legacy_fallback: AtomicBool,
}

impl ResolverToggles {
    pub fn new(use_registry: bool, allow_legacy_fallback: bool) -> Self {
        Self {
            use_registry: AtomicBool::new(use_registry),
            allow_legacy_fallback: AtomicBool::new(allow_legacy_fallback),
        }
    }

    pub fn use_registry(&self) -> bool {
        self.use_registry.load(Ordering::Relaxed)
    }

    pub fn set_use_registry(&self, enabled: bool) {
        self.use_registry.store(enabled, Ordering::Relaxed);
    }

    pub fn allow_legacy_fallback(&self) -> bool {
        self.allow_legacy_fallback.load(Ordering::Relaxed)
    }

    pub fn set_allow_legacy_fallback(&self, enabled: bool) {
        self.allow_legacy_fallback.store(enabled, Ordering::Relaxed);
    }
}

impl Default for ResolverToggles {
    fn default() -> Self {
        Self::new(true, false)
    }
}

/// Legacy ambient discovery: scan a known object graph for the first
/// instance matching the requested key.
///
/// Implementations return the instance in the registry's erased
/// representation (`Arc<Arc<T>>` behind `Arc<dyn Any>`); the resolver
/// downcasts and treats a mismatch as a miss.
pub trait FallbackDiscovery: Send + Sync {
    fn discover(
        &self,
        key: TypeId,
        type_name: &str,
    ) -> Result<Option<Arc<dyn Any + Send + Sync>>, crate::error::ServiceError>;
}

/// Two-phase lookup helper: registry first, then (when enabled) legacy
/// discovery.
pub struct HybridResolver {
    registry: Arc<ServiceRegistry>,
    toggles: Arc<ResolverToggles>,
    fallback: Option<Arc<dyn FallbackDiscovery>>,
}

impl HybridResolver {
    pub fn new(registry: Arc<ServiceRegistry>, toggles: Arc<ResolverToggles>) -> Self {
        Self {
            registry,
            toggles,
            fallback: None,
        }
    }

    /// Attach the legacy discovery mechanism. Consumes self and returns it,
    /// enabling builder pattern usage.
    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackDiscovery>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Two-phase lookup: registry (when enabled), then legacy discovery
    /// (when enabled). Every failure in either phase is swallowed into a
    /// logged miss.
    pub fn resolve_with_fallback<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if let Some(instance) = self.registry_phase::<T>() {
            return Some(instance);
        }

        if self.toggles.allow_legacy_fallback() {
            if let Some(instance) = self.fallback_phase::<T>() {
                return Some(instance);
            }
        }

        None
    }

    /// Registry-only variant with no fallback phase. Used once migration is
    /// complete, so any code path still needing the fallback simply fails to
    /// resolve and becomes observable.
    pub fn resolve_pure<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry_phase::<T>()
    }

    fn registry_phase<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if !self.toggles.use_registry() {
            return None;
        }

        match catch_unwind(AssertUnwindSafe(|| self.registry.get::<T>())) {
            Ok(resolved) => resolved,
            Err(_) => {
                warn!(
                    service = std::any::type_name::<T>(),
                    "Registry resolution panicked; treating as miss"
                );
                None
            }
        }
    }

    fn fallback_phase<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let fallback = self.fallback.as_ref()?;
        let type_name = std::any::type_name::<T>();

        let discovered = catch_unwind(AssertUnwindSafe(|| {
            fallback.discover(TypeId::of::<T>(), type_name)
        }));

        match discovered {
            Ok(Ok(Some(instance))) => match instance.downcast_ref::<Arc<T>>() {
                Some(instance) => {
                    debug!(service = type_name, "Resolved via legacy fallback");
                    Some(instance.clone())
                }
                None => {
                    warn!(
                        service = type_name,
                        "Legacy fallback produced a value of the wrong type; treating as miss"
                    );
                    None
                }
            },
            Ok(Ok(None)) => {
                debug!(service = type_name, "Legacy fallback found nothing");
                None
            }
            Ok(Err(error)) => {
                warn!(
                    service = type_name,
                    error = %error,
                    "Legacy fallback discovery failed; treating as miss"
                );
                None
            }
            Err(_) => {
                warn!(
                    service = type_name,
                    "Legacy fallback discovery panicked; treating as miss"
                );
                None
            }
        }
    }
}
