// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Blocking queue
//!
//! The `queue` module provides the `BlockingQueue` type, a thread-safe FIFO
//! with blocking and timed dequeue plus shutdown semantics. It is the single
//! channel through which all producers (message posters, timer threads, the
//! signal-watch thread) reach a consumer loop.
//!

use parking_lot::{Condvar, Mutex};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Thread-safe FIFO queue with blocking dequeue and shutdown.
///
/// Once `shutdown` has been called no new item is accepted, but items
/// already queued remain retrievable until the queue is drained. All state
/// is guarded by one lock and one condition variable; ordering across
/// multiple producers is whatever order they acquire the lock in.
pub struct BlockingQueue<T> {
    /// Queued items, oldest first.
    items: Mutex<VecDeque<T>>,
    /// Signalled when an item arrives or shutdown is requested.
    available: Condvar,
    /// Set once by `shutdown`, never cleared.
    shutdown: AtomicBool,
}

impl<T> BlockingQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Appends an item and wakes one waiting consumer.
    ///
    /// Returns `false` without modifying the queue if `shutdown` has
    /// already been called.
    pub fn enqueue(&self, item: T) -> bool {
        let mut items = self.items.lock();
        if self.shutdown.load(Ordering::Acquire) {
            return false;
        }
        items.push_back(item);
        self.available.notify_one();
        true
    }

    /// Removes and returns the oldest item, blocking until one is
    /// available or the queue is shut down and drained.
    ///
    /// A `timeout` of zero waits indefinitely. Returns `None` when the
    /// timeout elapses with the queue still empty, or when the queue is
    /// shut down **and** empty. Shutdown alone does not stop delivery:
    /// items queued before shutdown drain in order first.
    pub fn dequeue(&self, timeout: Duration) -> Option<T> {
        let mut items = self.items.lock();

        if timeout.is_zero() {
            while items.is_empty() && !self.shutdown.load(Ordering::Acquire) {
                self.available.wait(&mut items);
            }
        } else {
            let deadline = std::time::Instant::now() + timeout;
            while items.is_empty() && !self.shutdown.load(Ordering::Acquire) {
                if self
                    .available
                    .wait_until(&mut items, deadline)
                    .timed_out()
                {
                    break;
                }
            }
        }

        items.pop_front()
    }

    /// Marks the queue as shut down and wakes every waiting consumer.
    /// Idempotent.
    pub fn shutdown(&self) {
        let _items = self.items.lock();
        self.shutdown.store(true, Ordering::Release);
        self.available.notify_all();
    }

    /// Point-in-time number of queued items.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// True when the queue currently holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// True once `shutdown` has been called.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
