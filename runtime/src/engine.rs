// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Event loop
//!
//! The `engine` module provides the `EventLoop` type, a generic queue-backed
//! consumer engine, and the `EventHandler` trait its callers implement.
//! Decoupling how items arrive (the queue) from what happens to them (the
//! handler) lets the same engine back both the process shell and the
//! asynchronous file logger.
//!

use crate::queue::BlockingQueue;
use crate::Error;

use tracing::debug;

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

/// Per-event callback driven by an [`EventLoop`].
///
/// `on_event` is invoked exactly once per dequeued item, synchronously, on
/// the driving thread. A failure returned from `on_event` — or a panic
/// raised inside it — is routed to `on_failure` and the loop continues: a
/// handler fault never terminates the loop.
pub trait EventHandler<T> {
    /// Processes one event.
    fn on_event(&mut self, event: T) -> Result<(), Error>;

    /// Called for every contained handler fault. The default writes to
    /// standard error; implementations with a logging service override
    /// this.
    fn on_failure(&mut self, error: Error) {
        eprintln!("Failure in on_event: {}", error);
    }
}

/// Generic queue-backed consumer engine.
///
/// Owns one [`BlockingQueue`]; producers call [`EventLoop::post`] from any
/// thread, a single consumer calls [`EventLoop::drive`]. The engine itself
/// never spawns threads — see [`crate::WorkerThread`] for a background
/// driver.
pub struct EventLoop<T> {
    queue: BlockingQueue<T>,
}

impl<T> EventLoop<T> {
    /// Creates an engine with an empty queue.
    pub fn new() -> Self {
        Self {
            queue: BlockingQueue::new(),
        }
    }

    /// Posts an item for the consumer.
    ///
    /// Returns `false` once the engine has been shut down.
    pub fn post(&self, item: T) -> bool {
        self.queue.enqueue(item)
    }

    /// Consumer loop. While `keep_going()` holds, dequeues with
    /// `poll_timeout` and forwards each item to `handler.on_event`.
    ///
    /// The poll timeout bounds how long the loop stays blocked before
    /// re-evaluating `keep_going`, so shutdown latency is at most one
    /// poll interval. A zero timeout waits indefinitely; the queue's
    /// shutdown is then the only wakeup.
    pub fn drive<H, F>(&self, handler: &mut H, keep_going: F, poll_timeout: Duration)
    where
        H: EventHandler<T>,
        F: Fn() -> bool,
    {
        debug!("Driving event loop.");
        while keep_going() {
            if let Some(event) = self.queue.dequeue(poll_timeout) {
                Self::invoke(handler, event);
            }
        }
        debug!("Event loop finished.");
    }

    /// Invokes the handler for one event, containing both typed failures
    /// and panics at this single boundary.
    fn invoke<H: EventHandler<T>>(handler: &mut H, event: T) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.on_event(event)
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => handler.on_failure(error),
            Err(payload) => {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown failure".to_owned());
                handler.on_failure(Error::Handler(detail));
            }
        }
    }

    /// Shuts the underlying queue down, waking a blocked consumer.
    pub fn shutdown(&self) {
        self.queue.shutdown();
    }

    /// True once the underlying queue has been shut down.
    pub fn is_shutdown(&self) -> bool {
        self.queue.is_shutdown()
    }

    /// Point-in-time number of pending events.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl<T> Default for EventLoop<T> {
    fn default() -> Self {
        Self::new()
    }
}
