//! # Structured Error Handling
//!
//! Crate-level error taxonomy for registry and lifecycle operations.
//!
//! Lookups that simply find nothing are *soft* failures and are signaled by
//! `Option::None`, never by an error. The variants here cover the hard
//! failure paths: a mandatory dependency that is absent (the `require`
//! family) and malformed configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocatorError {
    /// A mandatory dependency was not registered. Raised only by the
    /// `require` family; plain lookups return `None` instead.
    #[error("required service not found: {0}")]
    RequiredServiceMissing(&'static str),

    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

pub type Result<T> = std::result::Result<T, LocatorError>;

/// Error type for fallible service hooks (`Updatable::update`,
/// `Configurable::initialize`, `FallbackDiscovery::discover`). Services
/// report their own failure types; the runtime only logs them.
pub type ServiceError = Box<dyn std::error::Error>;
