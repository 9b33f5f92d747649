//! # Update/Pause Coordinator
//!
//! Per-tick driver for update-capable services and broadcast driver for
//! pause-capable services.
//!
//! ## Overview
//!
//! The coordinator is a single-threaded, cooperative driver invoked once per
//! simulation tick by the host loop. Each tick it snapshots the registry's
//! lifecycle roster, keeps the active services that expose the update
//! capability and currently want updates, orders them by declared priority
//! (stable, so ties preserve registration order), and invokes them. A
//! failure in one service is isolated and reported; it never aborts the
//! remainder of the tick.
//!
//! Pause and resume are a separate, independently-triggered broadcast in
//! registration order. No priority ordering is applied there: pause and
//! resume are idempotent state-setters, not ordered computations.
//!
//! ## Usage
//!
//! ```rust
//! use locator_core::coordinator::UpdateCoordinator;
//! use locator_core::registry::ServiceRegistry;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ServiceRegistry::new());
//! let coordinator = UpdateCoordinator::new(registry);
//!
//! // host loop, once per tick:
//! let stats = coordinator.tick();
//! assert_eq!(stats.updated, 0);
//! ```

use crate::registry::ServiceRegistry;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Outcome of one coordinator tick.
#[derive(Debug, Clone, Default)]
pub struct TickStats {
    /// Services whose `update` ran and returned `Ok`
    pub updated: usize,
    /// Roster entries skipped (inactive, not update-capable, or opted out)
    pub skipped: usize,
    /// Services whose `update` returned an error
    pub failed: usize,
}

/// Per-tick driver over a shared registry.
pub struct UpdateCoordinator {
    registry: Arc<ServiceRegistry>,
}

impl UpdateCoordinator {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    /// Run one tick: collect, filter, order by priority, invoke.
    ///
    /// Invocation order within a tick is fully determined by priority then
    /// registration order. Across ticks no ordering is guaranteed between
    /// unrelated services.
    pub fn tick(&self) -> TickStats {
        let roster = self.registry.lifecycle_roster();
        let mut stats = TickStats::default();

        let mut runnable = Vec::with_capacity(roster.len());
        for service in &roster {
            let updatable = match service.as_updatable() {
                Some(updatable) if service.is_active() && updatable.needs_update() => updatable,
                _ => {
                    stats.skipped += 1;
                    continue;
                }
            };
            runnable.push((updatable.update_priority(), service.clone()));
        }

        // Stable sort: ties keep registration order.
        runnable.sort_by_key(|(priority, _)| *priority);

        for (_, service) in &runnable {
            if let Some(updatable) = service.as_updatable() {
                match updatable.update() {
                    Ok(()) => stats.updated += 1,
                    Err(err) => {
                        // Isolate the failure; the rest of the tick proceeds.
                        error!(
                            service = service.service_name(),
                            error = %err,
                            "Service update failed"
                        );
                        stats.failed += 1;
                    }
                }
            }
        }

        debug!(
            updated = stats.updated,
            skipped = stats.skipped,
            failed = stats.failed,
            "Coordinator tick complete"
        );
        stats
    }

    /// Broadcast `pause` to every pause-capable service in registration
    /// order. Returns the number of services reached.
    pub fn pause_all(&self) -> usize {
        let mut paused = 0;
        for service in self.registry.lifecycle_roster() {
            if let Some(pausable) = service.as_pausable() {
                pausable.pause();
                paused += 1;
            }
        }
        info!(paused, "Paused services");
        paused
    }

    /// Broadcast `resume` to every pause-capable service in registration
    /// order. Returns the number of services reached.
    pub fn resume_all(&self) -> usize {
        let mut resumed = 0;
        for service in self.registry.lifecycle_roster() {
            if let Some(pausable) = service.as_pausable() {
                pausable.resume();
                resumed += 1;
            }
        }
        info!(resumed, "Resumed services");
        resumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::lifecycle::{Pausable, Service, Updatable};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Records invocations into a shared journal so tests can assert order.
    struct Recorder {
        label: &'static str,
        priority: i32,
        enabled: AtomicBool,
        fail: bool,
        journal: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Recorder {
        fn new(
            label: &'static str,
            priority: i32,
            journal: Arc<Mutex<Vec<&'static str>>>,
        ) -> Self {
            Self {
                label,
                priority,
                enabled: AtomicBool::new(true),
                fail: false,
                journal,
            }
        }
    }

    impl Updatable for Recorder {
        fn update(&self) -> Result<(), ServiceError> {
            self.journal.lock().push(self.label);
            if self.fail {
                return Err("tick exploded".into());
            }
            Ok(())
        }
        fn needs_update(&self) -> bool {
            self.enabled.load(Ordering::Relaxed)
        }
        fn update_priority(&self) -> i32 {
            self.priority
        }
    }

    impl Service for Recorder {
        fn service_name(&self) -> &str {
            self.label
        }
        fn as_updatable(&self) -> Option<&dyn Updatable> {
            Some(self)
        }
    }

    // Distinct types so each gets its own type key.
    macro_rules! recorder_type {
        ($name:ident) => {
            struct $name(Recorder);
            impl Updatable for $name {
                fn update(&self) -> Result<(), ServiceError> {
                    self.0.update()
                }
                fn needs_update(&self) -> bool {
                    self.0.needs_update()
                }
                fn update_priority(&self) -> i32 {
                    self.0.update_priority()
                }
            }
            impl Service for $name {
                fn service_name(&self) -> &str {
                    self.0.service_name()
                }
                fn as_updatable(&self) -> Option<&dyn Updatable> {
                    Some(self)
                }
            }
        };
    }

    recorder_type!(SvcA);
    recorder_type!(SvcB);
    recorder_type!(SvcC);
    recorder_type!(SvcD);

    #[test]
    fn test_priority_order_with_stable_ties() {
        let registry = Arc::new(ServiceRegistry::new());
        let journal = Arc::new(Mutex::new(Vec::new()));

        // priorities [5, 1, 1, 3]; ties (b, c) must keep registration order
        registry.register_service(Arc::new(SvcA(Recorder::new("a", 5, journal.clone()))));
        registry.register_service(Arc::new(SvcB(Recorder::new("b", 1, journal.clone()))));
        registry.register_service(Arc::new(SvcC(Recorder::new("c", 1, journal.clone()))));
        registry.register_service(Arc::new(SvcD(Recorder::new("d", 3, journal.clone()))));

        let coordinator = UpdateCoordinator::new(registry);
        let stats = coordinator.tick();

        assert_eq!(stats.updated, 4);
        assert_eq!(*journal.lock(), vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn test_needs_update_opt_out() {
        let registry = Arc::new(ServiceRegistry::new());
        let journal = Arc::new(Mutex::new(Vec::new()));

        let a = Arc::new(SvcA(Recorder::new("a", 0, journal.clone())));
        registry.register_service(a.clone());
        registry.register_service(Arc::new(SvcB(Recorder::new("b", 10, journal.clone()))));

        let coordinator = UpdateCoordinator::new(registry.clone());
        coordinator.tick();
        assert_eq!(*journal.lock(), vec!["a", "b"]);

        a.0.enabled.store(false, Ordering::Relaxed);
        let stats = coordinator.tick();
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(*journal.lock(), vec!["a", "b", "b"]);
        // still registered, just skipped
        assert!(registry.has::<SvcA>());
    }

    #[test]
    fn test_failure_does_not_abort_tick() {
        let registry = Arc::new(ServiceRegistry::new());
        let journal = Arc::new(Mutex::new(Vec::new()));

        let mut failing = Recorder::new("boom", 0, journal.clone());
        failing.fail = true;
        registry.register_service(Arc::new(SvcA(failing)));
        registry.register_service(Arc::new(SvcB(Recorder::new("after", 1, journal.clone()))));

        let coordinator = UpdateCoordinator::new(registry);
        let stats = coordinator.tick();

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.updated, 1);
        assert_eq!(*journal.lock(), vec!["boom", "after"]);
    }

    struct PauseProbe {
        paused: AtomicBool,
    }

    impl Pausable for PauseProbe {
        fn pause(&self) {
            self.paused.store(true, Ordering::Relaxed);
        }
        fn resume(&self) {
            self.paused.store(false, Ordering::Relaxed);
        }
        fn is_paused(&self) -> bool {
            self.paused.load(Ordering::Relaxed)
        }
    }

    impl Service for PauseProbe {
        fn as_pausable(&self) -> Option<&dyn Pausable> {
            Some(self)
        }
    }

    #[test]
    fn test_pause_resume_broadcast() {
        let registry = Arc::new(ServiceRegistry::new());
        let probe = Arc::new(PauseProbe {
            paused: AtomicBool::new(false),
        });
        registry.register_service(probe.clone());
        // not pause-capable; must be ignored by the broadcast
        registry.register_service(Arc::new(SvcA(Recorder::new(
            "a",
            0,
            Arc::new(Mutex::new(Vec::new())),
        ))));

        let coordinator = UpdateCoordinator::new(registry);
        assert_eq!(coordinator.pause_all(), 1);
        assert!(probe.is_paused());
        assert_eq!(coordinator.resume_all(), 1);
        assert!(!probe.is_paused());
    }

    #[test]
    fn test_plain_register_replaces_roster_entry() {
        let registry = Arc::new(ServiceRegistry::new());
        let journal = Arc::new(Mutex::new(Vec::new()));

        registry.register_service(Arc::new(SvcA(Recorder::new("old", 0, journal.clone()))));
        // Hot-swap via plain register: the second value wins with no leak of
        // the first binding, so the replaced instance must stop ticking.
        registry.register(Arc::new(SvcA(Recorder::new("new", 0, journal.clone()))));

        let coordinator = UpdateCoordinator::new(registry.clone());
        coordinator.tick();

        assert!(!journal.lock().contains(&"old"));
        assert!(registry.lifecycle_roster().is_empty());
        // the eager binding itself did swap
        assert_eq!(registry.get::<SvcA>().unwrap().0.label, "new");
    }

    #[test]
    fn test_unregistered_service_leaves_roster() {
        let registry = Arc::new(ServiceRegistry::new());
        let journal = Arc::new(Mutex::new(Vec::new()));
        registry.register_service(Arc::new(SvcA(Recorder::new("a", 0, journal.clone()))));

        let coordinator = UpdateCoordinator::new(registry.clone());
        coordinator.tick();
        registry.unregister::<SvcA>();
        let stats = coordinator.tick();

        assert_eq!(stats.updated, 0);
        assert_eq!(*journal.lock(), vec!["a"]);
    }
}
