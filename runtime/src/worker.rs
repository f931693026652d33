// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Worker thread
//!
//! The `worker` module provides the `WorkerThread` type, which drives an
//! [`EventLoop`] on a dedicated background thread. The process shell drives
//! its loop on the caller's thread instead; the worker exists for clients
//! like the file logger that want the consumer off the main thread.
//!

use crate::engine::{EventHandler, EventLoop};

use tracing::debug;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// Poll interval used by the background loop between checks of the
/// running flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs an [`EventLoop`] on a dedicated background thread.
///
/// `start` and `stop` are idempotent; `stop` shuts the underlying queue
/// down, drains every item already posted and then joins, blocking the
/// caller until the loop has fully exited.
pub struct WorkerThread<T, H> {
    engine: Arc<EventLoop<T>>,
    /// Handler moved into the thread on `start`, recovered on `stop`.
    handler: Option<H>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<H>>,
}

impl<T, H> WorkerThread<T, H>
where
    T: Send + 'static,
    H: EventHandler<T> + Send + 'static,
{
    /// Creates a stopped worker bound to `engine`.
    pub fn new(engine: Arc<EventLoop<T>>, handler: H) -> Self {
        Self {
            engine,
            handler: Some(handler),
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    /// Launches the background thread. No-op when already running or when
    /// no handler is bound.
    pub fn start(&mut self) {
        if self.running.load(Ordering::Acquire) || self.thread.is_some() {
            return;
        }
        let Some(mut handler) = self.handler.take() else {
            return;
        };
        self.running.store(true, Ordering::Release);

        let engine = self.engine.clone();
        let running = self.running.clone();
        debug!("Starting worker thread.");
        self.thread = Some(std::thread::spawn(move || {
            // Keep draining after the flag clears: stop() shuts the
            // queue down first, so the backlog is finite.
            engine.drive(
                &mut handler,
                || {
                    running.load(Ordering::Acquire) || engine.pending() > 0
                },
                POLL_INTERVAL,
            );
            handler
        }));
    }

    /// Stops the loop and joins the thread. The queue is shut down
    /// before the running flag clears, so every item posted before this
    /// call is processed before it returns. Idempotent.
    pub fn stop(&mut self) {
        self.engine.shutdown();
        self.running.store(false, Ordering::Release);

        if let Some(thread) = self.thread.take() {
            debug!("Joining worker thread.");
            if let Ok(handler) = thread.join() {
                self.handler = Some(handler);
            }
        }
    }

    /// True while the background loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The engine this worker drives.
    pub fn engine(&self) -> &Arc<EventLoop<T>> {
        &self.engine
    }
}

impl<T, H> Drop for WorkerThread<T, H> {
    fn drop(&mut self) {
        self.engine.shutdown();
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::Error;

    use std::sync::Mutex;

    struct Collect {
        seen: Arc<Mutex<Vec<u32>>>,
    }

    impl EventHandler<u32> for Collect {
        fn on_event(&mut self, event: u32) -> Result<(), Error> {
            self.seen.lock().unwrap().push(event);
            Ok(())
        }
    }

    #[test]
    fn test_worker_processes_posted_events() {
        let engine = Arc::new(EventLoop::new());
        let seen = Arc::new(Mutex::new(vec![]));
        let mut worker =
            WorkerThread::new(engine.clone(), Collect { seen: seen.clone() });

        worker.start();
        assert!(worker.is_running());
        for i in 0..10 {
            assert!(engine.post(i));
        }
        std::thread::sleep(Duration::from_millis(200));
        worker.stop();
        assert!(!worker.is_running());
        assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<u32>>());
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let engine = Arc::new(EventLoop::new());
        let seen = Arc::new(Mutex::new(vec![]));
        let mut worker =
            WorkerThread::new(engine.clone(), Collect { seen: seen.clone() });

        worker.start();
        worker.start();
        engine.post(7);
        std::thread::sleep(Duration::from_millis(200));
        worker.stop();
        worker.stop();
        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }

    #[test]
    fn test_stop_drains_queued_events_before_returning() {
        let engine = Arc::new(EventLoop::new());
        let seen = Arc::new(Mutex::new(vec![]));
        let mut worker =
            WorkerThread::new(engine.clone(), Collect { seen: seen.clone() });

        worker.start();
        for i in 0..5_000 {
            assert!(engine.post(i));
        }
        // No sleep: stop must not return until the backlog is handled.
        worker.stop();
        assert_eq!(seen.lock().unwrap().len(), 5_000);
    }

    #[test]
    fn test_stop_unblocks_pending_wait() {
        let engine: Arc<EventLoop<u32>> = Arc::new(EventLoop::new());
        let seen = Arc::new(Mutex::new(vec![]));
        let mut worker = WorkerThread::new(engine, Collect { seen });

        worker.start();
        // The loop is blocked in dequeue; stop must return promptly.
        let start = std::time::Instant::now();
        worker.stop();
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
