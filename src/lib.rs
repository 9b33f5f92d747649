#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Locator Core
//!
//! Concurrent service registry and lifecycle runtime for simulation and game
//! subsystems.
//!
//! ## Overview
//!
//! Every subsystem in a simulation runtime (audio, camera, input, stealth,
//! combat, build placement) needs to locate collaborators without
//! hard-coded global singletons. Locator Core provides the directory they
//! register with and resolve through: type-keyed and name-keyed storage,
//! lazy construction via factories, a formal lifecycle contract with per-tick
//! update scheduling, and a staged-migration resolver for moving call sites
//! off ambient global lookup without a flag-day cutover.
//!
//! ## Key Features
//!
//! - **Lock-free hot path**: sharded concurrent maps and atomic counters; no
//!   registry-wide lock on any operation
//! - **À-la-carte lifecycle capabilities**: update, pause/resume, disposal,
//!   and configuration contracts that services implement independently
//! - **Priority-ordered ticking**: a cooperative coordinator drives
//!   update-capable services in a deterministic order, isolating failures
//! - **Staged migration**: hybrid resolution with two independent toggles for
//!   de-risking the move from ambient lookup to registry lookup
//! - **Hit-rate instrumentation**: lookup counters exposed on demand
//!
//! ## Module Organization
//!
//! - [`registry`] - The concurrent store, facade, and hybrid resolver
//! - [`lifecycle`] - Capability contracts registered services may implement
//! - [`coordinator`] - Per-tick update driver and pause/resume broadcast
//! - [`config`] - Resolver migration toggles
//! - [`error`] - Structured error handling
//! - [`logging`] - Diagnostic sink initialization
//!
//! ## Quick Start
//!
//! ```rust
//! use locator_core::{ServiceLocator, ServiceRegistry, UpdateCoordinator};
//! use std::sync::Arc;
//!
//! struct CombatManager {
//!     difficulty: u8,
//! }
//!
//! // One registry per process lifetime, constructed at startup and passed
//! // around; tests create isolated instances instead.
//! let registry = Arc::new(ServiceRegistry::new());
//! let locator = ServiceLocator::with_registry(registry.clone());
//!
//! locator.set(Arc::new(CombatManager { difficulty: 3 }));
//! let combat = locator.req::<CombatManager>().unwrap();
//! assert_eq!(combat.difficulty, 3);
//!
//! // host loop drives registered update-capable services once per tick
//! let coordinator = UpdateCoordinator::new(registry);
//! coordinator.tick();
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod registry;

pub use config::LocatorConfig;
pub use coordinator::{TickStats, UpdateCoordinator};
pub use error::{LocatorError, Result, ServiceError};
pub use lifecycle::{Configurable, Disposable, Pausable, Service, Updatable};
pub use registry::{
    BindingKind, FallbackDiscovery, HybridResolver, PerformanceStats, ResolverToggles,
    ServiceBinding, ServiceLocator, ServiceRegistry,
};
