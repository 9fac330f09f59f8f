//! Event fan-out to registered observers
//!
//! The observer list is guarded by a read-write lock. Publishing snapshots the
//! list under a read lock and delivers outside it, so cashiers never block each
//! other and an observer may subscribe further observers from `on_event`.
//! Observers added during a publish see the next event, not the current one.

use super::traits::Observer;
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, trace};

/// Synchronous, best-effort event delivery
#[derive(Default)]
pub struct EventBus {
    observers: RwLock<Vec<Arc<dyn Observer>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn Observer>) {
        self.observers.write().push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// Deliver `message` to every observer, in registration order
    ///
    /// Returns once every observer has seen the event.
    pub fn publish(&self, message: &str) {
        trace!(target: "bank::events", "{}", message);

        let observers: Vec<Arc<dyn Observer>> = self.observers.read().clone();
        for observer in &observers {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| observer.on_event(message)));
            if delivered.is_err() {
                error!(event = message, "observer panicked while handling event");
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observer_count())
            .finish()
    }
}
