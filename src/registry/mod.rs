//! # Registry Infrastructure
//!
//! The concurrent service directory and its resolution helpers.
//!
//! ## Overview
//!
//! This module holds the central [`ServiceRegistry`], the ergonomic
//! [`ServiceLocator`] facade over it, and the [`HybridResolver`] used while
//! migrating call sites from ambient global lookup to registry-based lookup.
//!
//! ## Architecture
//!
//! ```text
//! Registry Infrastructure
//! ├── ServiceRegistry   (type/factory/named stores + stats)
//! ├── ServiceLocator    (short-named facade, no independent logic)
//! └── HybridResolver    (registry lookup + toggled legacy fallback)
//! ```

pub mod facade;
pub mod resolver;
pub mod service_registry;

// Re-export main types for easy access
pub use facade::ServiceLocator;
pub use resolver::{FallbackDiscovery, HybridResolver, ResolverToggles};
pub use service_registry::{BindingKind, PerformanceStats, ServiceBinding, ServiceRegistry};
