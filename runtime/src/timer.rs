// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Timer manager
//!
//! The `timer` module provides the `TimerManager` type, which turns a delay
//! into an event posted to a target [`EventLoop`]. Each pending timer is
//! backed by one throwaway thread; this avoids a full timing wheel and is
//! acceptable only because individual timer counts are expected to be
//! small.
//!

use crate::engine::EventLoop;

use parking_lot::Mutex;
use tracing::debug;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Unique identifier for a timer.
pub type TimerId = u64;

/// Cancellation flag shared between the registry and the backing thread.
type CancelFlag = Arc<AtomicBool>;

/// One-shot timer registry posting into a receiver event loop.
///
/// The manager holds the receiver through a [`Weak`] reference: an
/// outstanding timer never extends the receiver's lifetime, and a fire
/// after the receiver is gone is silently dropped.
pub struct TimerManager<E> {
    receiver: Weak<EventLoop<E>>,
    /// Suppresses deliveries from threads still sleeping once set.
    shutdown: Arc<AtomicBool>,
    timers: Arc<Mutex<HashMap<TimerId, CancelFlag>>>,
}

impl<E> TimerManager<E>
where
    E: Send + 'static,
{
    /// Creates a manager bound to `receiver`.
    pub fn new(receiver: Weak<EventLoop<E>>) -> Self {
        Self {
            receiver,
            shutdown: Arc::new(AtomicBool::new(false)),
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Starts a one-shot timer. A timer already registered under `id` is
    /// stopped first; one live timer per id.
    ///
    /// After `delay` the backing thread posts `event` to the receiver,
    /// provided the timer was not cancelled, the manager has not been
    /// shut down, and the receiver still exists. The registry entry is
    /// removed regardless of outcome.
    pub fn start_timer(&self, id: TimerId, delay: Duration, event: E) {
        self.stop_timer(id);

        let cancelled: CancelFlag = Arc::new(AtomicBool::new(false));
        {
            let mut timers = self.timers.lock();
            timers.insert(id, cancelled.clone());
        }

        let receiver = self.receiver.clone();
        let shutdown = self.shutdown.clone();
        let timers = self.timers.clone();
        // Detached by construction: the JoinHandle is dropped and nobody
        // ever joins a timer thread.
        std::thread::spawn(move || {
            std::thread::sleep(delay);

            if !shutdown.load(Ordering::Acquire)
                && !cancelled.load(Ordering::Acquire)
            {
                if let Some(receiver) = receiver.upgrade() {
                    debug!("Timer {} fired.", id);
                    receiver.post(event);
                }
            }

            // Remove our own entry, unless a replacement already took
            // the slot.
            let mut timers = timers.lock();
            if let Some(current) = timers.get(&id) {
                if Arc::ptr_eq(current, &cancelled) {
                    timers.remove(&id);
                }
            }
        });
    }

    /// Removes the timer registered under `id` and abandons its backing
    /// thread without waiting for it to finish.
    ///
    /// Best-effort cancellation: a thread already past its cancellation
    /// check may still deliver its event after this returns. Callers rely
    /// on the non-blocking nature of this call, so that race stays.
    pub fn stop_timer(&self, id: TimerId) {
        let mut timers = self.timers.lock();
        if let Some(cancelled) = timers.remove(&id) {
            cancelled.store(true, Ordering::Release);
            debug!("Timer {} stopped.", id);
        }
    }

    /// Sets the shutdown flag, suppressing future deliveries from threads
    /// still sleeping, and abandons all outstanding backing threads
    /// without joining.
    pub fn stop_all_timers(&self) {
        self.shutdown.store(true, Ordering::Release);
        let mut timers = self.timers.lock();
        for cancelled in timers.values() {
            cancelled.store(true, Ordering::Release);
        }
        timers.clear();
    }

    /// Number of registered (not yet fired or stopped) timers.
    pub fn pending(&self) -> usize {
        self.timers.lock().len()
    }
}

impl<E> Drop for TimerManager<E> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
    }
}
