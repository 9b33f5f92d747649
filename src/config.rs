//! # Runtime Configuration
//!
//! Configuration for the hybrid resolver's migration toggles. The two
//! booleans are owned by the host environment (env vars, launch flags); this
//! module only reads them and hands the resolver an atomic view it can
//! consult on every lookup.

use crate::error::{LocatorError, Result};
use crate::registry::ResolverToggles;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Whether lookups should consult the registry at all. Disabling this
    /// forces every hybrid resolution onto the legacy path.
    pub use_registry_resolution: bool,
    /// Whether a registry miss may fall back to legacy ambient discovery.
    /// Flip off per-environment to surface residual legacy dependence.
    pub allow_legacy_fallback: bool,
    pub custom_settings: HashMap<String, String>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            use_registry_resolution: true,
            allow_legacy_fallback: false,
            custom_settings: HashMap::new(),
        }
    }
}

impl LocatorConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(use_registry) = std::env::var("LOCATOR_USE_REGISTRY") {
            config.use_registry_resolution = use_registry.parse().map_err(|e| {
                LocatorError::ConfigurationError(format!("Invalid LOCATOR_USE_REGISTRY: {e}"))
            })?;
        }

        if let Ok(fallback) = std::env::var("LOCATOR_LEGACY_FALLBACK") {
            config.allow_legacy_fallback = fallback.parse().map_err(|e| {
                LocatorError::ConfigurationError(format!("Invalid LOCATOR_LEGACY_FALLBACK: {e}"))
            })?;
        }

        Ok(config)
    }

    /// Build the atomic toggle view consumed by the hybrid resolver.
    pub fn toggles(&self) -> ResolverToggles {
        ResolverToggles::new(self.use_registry_resolution, self.allow_legacy_fallback)
    }
}
