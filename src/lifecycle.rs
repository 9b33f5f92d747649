//! # Lifecycle Capability Contracts
//!
//! Capability traits a registered service may implement à la carte. These are
//! not a class hierarchy: a concrete service satisfies [`Service`] (the base
//! identity contract, every method defaulted) and opts into update, pause,
//! disposal, or configuration behavior by implementing the matching trait and
//! overriding the corresponding `as_*` probe.
//!
//! ## Capability probing
//!
//! The registry stores instances as opaque values; only the
//! [`UpdateCoordinator`](crate::coordinator::UpdateCoordinator) and individual
//! callers probe for capabilities, via the `as_updatable()` / `as_pausable()`
//! / `as_disposable()` / `as_configurable()` accessors. Each defaults to
//! `None`; an implementer returns `Some(self)`:
//!
//! ```rust
//! use locator_core::lifecycle::{Service, Updatable};
//! use locator_core::error::ServiceError;
//!
//! struct CameraShake;
//!
//! impl Updatable for CameraShake {
//!     fn update(&self) -> Result<(), ServiceError> {
//!         // one tick of work
//!         Ok(())
//!     }
//!     fn update_priority(&self) -> i32 {
//!         10
//!     }
//! }
//!
//! impl Service for CameraShake {
//!     fn as_updatable(&self) -> Option<&dyn Updatable> {
//!         Some(self)
//!     }
//! }
//! ```
//!
//! ## Hook invocation contract
//!
//! `on_registered` / `on_unregistered` are **never** invoked automatically by
//! the registry. A caller that wants the hooks fired must call them around
//! its own register/unregister calls. Keeping registry mutation decoupled
//! from hook invocation means the registry never has to know which
//! capabilities an instance carries.

use crate::error::ServiceError;
use std::any::Any;

/// Base identity and lifecycle contract for registered services.
///
/// Every method has a default body, so opting in costs one line:
/// `impl Service for MyType {}`.
pub trait Service: Any + Send + Sync {
    /// Human-readable name, defaulting to the concrete type's name.
    fn service_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether the service considers itself ready for use.
    fn is_active(&self) -> bool {
        true
    }

    /// Hook for callers to invoke after registering this instance.
    /// The registry itself never calls this.
    fn on_registered(&self) {}

    /// Hook for callers to invoke after unregistering this instance.
    /// The registry itself never calls this.
    fn on_unregistered(&self) {}

    fn as_updatable(&self) -> Option<&dyn Updatable> {
        None
    }

    fn as_pausable(&self) -> Option<&dyn Pausable> {
        None
    }

    fn as_disposable(&self) -> Option<&dyn Disposable> {
        None
    }

    fn as_configurable(&self) -> Option<&dyn Configurable> {
        None
    }
}

/// Per-tick update participation.
pub trait Updatable: Send + Sync {
    /// Perform one tick of work. Must not block on I/O; long-running work
    /// belongs on the service's own schedule.
    fn update(&self) -> Result<(), ServiceError>;

    /// Dynamic opt-out: the coordinator skips services returning `false`
    /// without unregistering them.
    fn needs_update(&self) -> bool {
        true
    }

    /// Total order among updatable services within a tick. Lower runs first;
    /// ties preserve registration order.
    fn update_priority(&self) -> i32 {
        0
    }
}

/// Pause/resume participation. Both calls are idempotent state-setters;
/// what actually pauses is entirely internal to the service.
pub trait Pausable: Send + Sync {
    fn pause(&self);
    fn resume(&self);
    fn is_paused(&self) -> bool;
}

/// Deterministic release of non-memory resources. The registry never calls
/// `dispose` automatically; callers dispose before or around unregistration.
pub trait Disposable: Send + Sync {
    fn dispose(&self);
    fn is_disposed(&self) -> bool;
}

/// Configuration-driven initialization: transitions a service from
/// "constructed" to "ready for use".
///
/// Implementations must treat all use before `initialize` as either safely
/// inert or must fail loudly; either is acceptable, but an implementation
/// must pick one and stay consistent.
pub trait Configurable: Send + Sync {
    fn initialize(&self, config: &serde_json::Value) -> Result<(), ServiceError>;
    fn is_initialized(&self) -> bool;
}
