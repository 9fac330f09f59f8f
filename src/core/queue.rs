//! Unbounded FIFO queue of pending operations
//!
//! Producers append without blocking; cashiers take with a timeout so they can
//! notice stop requests. A second condition variable is signalled whenever the
//! queue becomes empty, which lets the coordinator drain without spinning.
//!
//! "Empty" means every operation has been taken, not that every taken
//! operation has finished processing.

use crate::types::Operation;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Multi-producer multi-consumer operation queue
#[derive(Debug, Default)]
pub struct TransactionQueue {
    items: Mutex<VecDeque<Operation>>,
    /// Signalled when an item is pushed
    available: Condvar,
    /// Signalled when the queue transitions to empty
    emptied: Condvar,
}

impl TransactionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation to the tail
    pub fn submit(&self, operation: Operation) {
        self.items.lock().push_back(operation);
        self.available.notify_one();
    }

    /// Append several operations, keeping their order
    ///
    /// The batch is appended under one lock, so operations from other
    /// producers are not interleaved inside it.
    pub fn submit_all<I>(&self, operations: I) -> usize
    where
        I: IntoIterator<Item = Operation>,
    {
        let count = {
            let mut items = self.items.lock();
            let before = items.len();
            items.extend(operations);
            items.len() - before
        };
        if count > 0 {
            self.available.notify_all();
        }
        count
    }

    /// Take the head of the queue, waiting up to `timeout` for one to arrive
    ///
    /// Returns `None` if the timeout elapses with the queue still empty.
    pub fn take(&self, timeout: Duration) -> Option<Operation> {
        self.take_unless(timeout, || false)
    }

    /// Like [`take`](Self::take), but gives up as soon as `interrupted` holds
    ///
    /// `interrupted` is checked under the queue lock before taking and before
    /// every wait, so a flag set before [`wake_all`](Self::wake_all) is never
    /// missed.
    pub fn take_unless<F>(&self, timeout: Duration, interrupted: F) -> Option<Operation>
    where
        F: Fn() -> bool,
    {
        let deadline = Instant::now().checked_add(timeout);
        let mut items = self.items.lock();
        let mut timed_out = false;

        loop {
            if interrupted() {
                return None;
            }
            if let Some(operation) = items.pop_front() {
                if items.is_empty() {
                    self.emptied.notify_all();
                }
                return Some(operation);
            }
            if timed_out {
                return None;
            }
            timed_out = Self::wait(&self.available, &mut items, deadline);
        }
    }

    /// Wake every consumer parked in `take` so it rechecks its interrupt
    pub fn wake_all(&self) {
        let _items = self.items.lock();
        self.available.notify_all();
    }

    /// Discard every pending operation
    ///
    /// Returns the number of operations dropped.
    pub fn clear(&self) -> usize {
        let dropped = {
            let mut items = self.items.lock();
            let dropped = items.len();
            items.clear();
            dropped
        };
        self.emptied.notify_all();
        dropped
    }

    /// Block until the queue is observed empty
    ///
    /// `None` waits indefinitely. Returns `false` if the timeout elapsed first.
    /// Work submitted concurrently may or may not be observed.
    pub fn wait_until_empty(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));
        let mut items = self.items.lock();

        while !items.is_empty() {
            if Self::wait(&self.emptied, &mut items, deadline) {
                return items.is_empty();
            }
        }
        true
    }

    /// Best-effort emptiness check; stale as soon as it returns
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Wait on `condvar` until notified or `deadline`; returns whether it timed out
    fn wait(
        condvar: &Condvar,
        guard: &mut MutexGuard<'_, VecDeque<Operation>>,
        deadline: Option<Instant>,
    ) -> bool {
        match deadline {
            Some(deadline) => condvar.wait_until(guard, deadline).timed_out(),
            None => {
                condvar.wait(guard);
                false
            }
        }
    }
}
