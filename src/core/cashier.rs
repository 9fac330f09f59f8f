//! Cashier worker threads
//!
//! A cashier is a thread that repeatedly takes one operation from the shared
//! queue, processes it, and reports failures to observers. Cashiers own no
//! accounts; all of them share the queue, the account store and the rate
//! table through a [`CashierContext`].
//!
//! # Lifecycle
//!
//! `Running → Stopped`, one way. A stop request is cooperative: the cashier
//! finishes the operation in hand and observes the request at the top of its
//! next loop iteration. An idle cashier parked on the queue is woken by the
//! request itself.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use super::{EventBus, ProcessingStats, TransactionProcessor, TransactionQueue};
use crate::types::{BankError, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashierState {
    Running,
    Stopped,
}

/// Everything a cashier needs, shared with the coordinator
#[derive(Debug, Clone)]
pub struct CashierContext {
    pub queue: Arc<TransactionQueue>,
    pub processor: TransactionProcessor,
    pub events: Arc<EventBus>,
    pub stats: Arc<ProcessingStats>,
    pub poll_timeout: Duration,
}

impl CashierContext {
    /// Process one operation and report its outcome
    ///
    /// Panics raised while processing are caught and reported as
    /// `BankError::Internal`, so a defect in one operation never takes the
    /// cashier down.
    pub fn handle(&self, operation: &Operation) -> Result<(), BankError> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.processor.process(operation)))
            .unwrap_or_else(|payload| Err(BankError::internal(panic_message(payload.as_ref()))));

        match &outcome {
            Ok(()) => self.stats.record_success(),
            Err(failure) => {
                self.stats.record_failure();
                debug!(kind = %operation.kind(), error = %failure, "operation failed");
                self.events.publish(&failure.to_string());
            }
        }
        outcome
    }
}

/// Handle to one running (or stopped) cashier thread
#[derive(Debug)]
pub struct Cashier {
    id: usize,
    running: Arc<AtomicBool>,
    queue: Arc<TransactionQueue>,
    handle: Option<JoinHandle<()>>,
}

impl Cashier {
    /// Spawn a cashier thread named `cashier-<id>`
    pub fn spawn(id: usize, context: CashierContext) -> Result<Self, BankError> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let queue = Arc::clone(&context.queue);

        let handle = thread::Builder::new()
            .name(format!("cashier-{}", id))
            .spawn(move || run(id, &flag, &context))
            .map_err(|e| BankError::internal(format!("failed to spawn cashier {}: {}", id, e)))?;

        Ok(Self {
            id,
            running,
            queue,
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> CashierState {
        if self.running.load(Ordering::Acquire) {
            CashierState::Running
        } else {
            CashierState::Stopped
        }
    }

    /// Ask the cashier to stop after its current operation
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::Release);
        self.queue.wake_all();
    }

    /// Request a stop and wait for the thread to exit
    pub fn stop(mut self) {
        self.request_stop();
        self.join();
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!(cashier = self.id, "cashier thread panicked");
            }
        }
    }
}

impl Drop for Cashier {
    fn drop(&mut self) {
        self.request_stop();
        self.join();
    }
}

fn run(id: usize, running: &AtomicBool, context: &CashierContext) {
    info!(cashier = id, "cashier started");
    context.events.publish(&format!("cashier {} started", id));

    while running.load(Ordering::Acquire) {
        let stopped = || !running.load(Ordering::Acquire);
        let Some(operation) = context.queue.take_unless(context.poll_timeout, stopped) else {
            continue;
        };
        // Failures are already reported to observers
        let _ = context.handle(&operation);
    }

    info!(cashier = id, "cashier stopped");
    context.events.publish(&format!("cashier {} stopped", id));
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "operation panicked".to_string()
    }
}
