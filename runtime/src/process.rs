// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Process shell
//!
//! The `process` module provides the `Process` type, the composition of the
//! runtime primitives into a dispatching service: one [`EventLoop`] fed by
//! message producers, a [`TimerManager`] and a signal-watch thread, with
//! three handler registries consulted by the single consumer.
//!
//! All handlers run on the consumer thread, one at a time, in queue
//! arrival order. No registry lock is held while a handler runs.
//!

use crate::config::ConfigFile;
use crate::engine::{EventHandler, EventLoop};
use crate::event::{MessageEvent, ProcessEvent, SignalEvent, TimerEvent};
use crate::signal::{self, SignalNo};
use crate::timer::{TimerId, TimerManager};
use crate::Error;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Poll interval of the consumer loop between checks of the running flag.
const DISPATCH_POLL: Duration = Duration::from_millis(100);

/// Handler for an application message.
pub type MessageHandler =
    Arc<dyn Fn(&MessageEvent) -> Result<(), Error> + Send + Sync>;
/// Handler for a timer expiration.
pub type TimerHandler =
    Arc<dyn Fn(&TimerEvent) -> Result<(), Error> + Send + Sync>;
/// Handler for an OS signal.
pub type SignalHandler =
    Arc<dyn Fn(&SignalEvent) -> Result<(), Error> + Send + Sync>;

/// Hook invoked once when the process is asked to stop.
type StopHook = Box<dyn FnOnce() + Send>;

/// Single-process dispatching service.
///
/// Lifecycle: construct, [`Process::initialize`], register handlers,
/// [`Process::start`] (drives the loop on the calling thread until
/// stopped), [`Process::stop`] from a handler or another thread.
pub struct Process {
    name: String,
    engine: Arc<EventLoop<ProcessEvent>>,
    timers: TimerManager<ProcessEvent>,
    message_handlers: Mutex<HashMap<String, MessageHandler>>,
    timer_handlers: Mutex<HashMap<TimerId, TimerHandler>>,
    signal_handlers: Mutex<HashMap<SignalNo, SignalHandler>>,
    args: Mutex<HashMap<String, String>>,
    config: Mutex<ConfigFile>,
    running: AtomicBool,
    stop_hook: Mutex<Option<StopHook>>,
}

impl Process {
    /// Creates a stopped, uninitialized process. Each instance runs at
    /// most once; see [`Process::start`].
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let engine = Arc::new(EventLoop::new());
        let timers = TimerManager::new(Arc::downgrade(&engine));
        Arc::new(Self {
            name: name.into(),
            engine,
            timers,
            message_handlers: Mutex::new(HashMap::new()),
            timer_handlers: Mutex::new(HashMap::new()),
            signal_handlers: Mutex::new(HashMap::new()),
            args: Mutex::new(HashMap::new()),
            config: Mutex::new(ConfigFile::new()),
            running: AtomicBool::new(false),
            stop_hook: Mutex::new(None),
        })
    }

    /// Parses command-line arguments and loads the config file.
    ///
    /// Each `key=value` token is split at its last `=`; tokens without
    /// `=` are ignored. The `config` key names the config file; a missing
    /// or unparsable file is a warning, the process continues with
    /// defaults.
    pub fn initialize(&self, args: &[String]) {
        let mut parsed = self.args.lock();
        for token in args {
            let Some((key, value)) = token.rsplit_once('=') else {
                continue;
            };
            debug!("Argument {}={}.", key, value);
            parsed.insert(key.to_owned(), value.to_owned());
        }
        let config_path = parsed.get("config").cloned();
        drop(parsed);

        if let Some(path) = config_path {
            match ConfigFile::load_from_file(&path) {
                Ok(config) => *self.config.lock() = config,
                Err(error) => {
                    warn!("Continuing with default config: {}", error);
                }
            }
        }
    }

    /// Registers (or replaces) the handler for messages named `name`.
    pub fn register_message_handler(
        &self,
        name: impl Into<String>,
        handler: impl Fn(&MessageEvent) -> Result<(), Error> + Send + Sync + 'static,
    ) {
        self.message_handlers
            .lock()
            .insert(name.into(), Arc::new(handler));
    }

    /// Registers (or replaces) the handler for timer `id`.
    pub fn register_timer(
        &self,
        id: TimerId,
        handler: impl Fn(&TimerEvent) -> Result<(), Error> + Send + Sync + 'static,
    ) {
        self.timer_handlers.lock().insert(id, Arc::new(handler));
    }

    /// Registers (or replaces) the handler for OS signal `signal`.
    ///
    /// The wake signal is reserved for the runtime and refused with
    /// [`Error::ReservedSignal`]. Registration raises the wake signal so
    /// the watch thread rebuilds its wait set.
    pub fn register_signal_handler(
        &self,
        signal: SignalNo,
        handler: impl Fn(&SignalEvent) -> Result<(), Error> + Send + Sync + 'static,
    ) -> Result<(), Error> {
        if signal == signal::WAKE_SIGNAL {
            return Err(Error::ReservedSignal(signal));
        }
        self.signal_handlers.lock().insert(signal, Arc::new(handler));
        signal::raise(signal::WAKE_SIGNAL);
        Ok(())
    }

    /// Posts an application message to the process.
    ///
    /// Returns `false` once the process is shutting down.
    pub fn post_message(
        &self,
        name: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> bool {
        self.engine.post(ProcessEvent::message(name, payload))
    }

    /// Starts (or restarts) the one-shot timer `id`. Its expiration is
    /// dispatched to the handler registered under the same id.
    pub fn start_timer(&self, id: TimerId, delay: Duration) {
        self.timers.start_timer(
            id,
            delay,
            ProcessEvent::TimerFired(TimerEvent { timer_id: id }),
        );
    }

    /// Best-effort cancellation of timer `id`.
    pub fn stop_timer(&self, id: TimerId) {
        self.timers.stop_timer(id);
    }

    /// Installs the hook invoked once by [`Process::stop`].
    pub fn set_stop_hook(&self, hook: impl FnOnce() + Send + 'static) {
        *self.stop_hook.lock() = Some(Box::new(hook));
    }

    /// Runs the process: spawns the signal-watch thread, then drives the
    /// event loop on the calling thread until [`Process::stop`]. No-op
    /// when already running.
    ///
    /// The lifecycle is one-shot: once stopped, the queue stays shut
    /// down and `start` refuses to run again. Build a new process to
    /// restart.
    pub fn start(self: &Arc<Self>) {
        if self.engine.is_shutdown() {
            warn!("Process {} can not be restarted.", self.name);
            return;
        }
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!("Process {} starting.", self.name);

        let watcher = self.clone();
        std::thread::spawn(move || watcher.watch_signals());

        let mut dispatcher = Dispatcher(self.as_ref());
        self.engine.drive(
            &mut dispatcher,
            || self.running.load(Ordering::Acquire),
            DISPATCH_POLL,
        );
        self.timers.stop_all_timers();
        debug!("Process {} finished.", self.name);
    }

    /// Asks the process to stop: clears the running flag, wakes the
    /// signal-watch thread, runs the stop hook and shuts the queue down.
    /// Safe to call from a handler or from another thread.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        debug!("Process {} stopping.", self.name);
        signal::raise(signal::WAKE_SIGNAL);
        if let Some(hook) = self.stop_hook.lock().take() {
            hook();
        }
        self.engine.shutdown();
    }

    /// True between `start` and `stop`.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Snapshot of the loaded configuration.
    pub fn config(&self) -> ConfigFile {
        self.config.lock().clone()
    }

    /// Looks a parsed command-line argument up.
    pub fn arg(&self, key: &str, default: &str) -> String {
        self.args
            .lock()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_owned())
    }

    /// Process name as given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Watch loop run on its own thread: wait for any registered signal
    /// plus the wake signal, forward real deliveries into the queue.
    fn watch_signals(&self) {
        while self.running.load(Ordering::Acquire) {
            let mut set: Vec<SignalNo> =
                self.signal_handlers.lock().keys().copied().collect();
            set.push(signal::WAKE_SIGNAL);

            match signal::wait(&set, signal::DEFAULT_POLL_INTERVAL) {
                // The wake signal only means "re-evaluate": the set may
                // have changed, or the process is stopping.
                Ok(sig) if sig == signal::WAKE_SIGNAL => continue,
                Ok(sig) => {
                    self.engine.post(ProcessEvent::SignalFired(SignalEvent {
                        signal: sig,
                    }));
                }
                Err(err) => {
                    error!("Signal watch for {} stopped: {}", self.name, err);
                    return;
                }
            }
        }
    }

    /// Invokes one handler, timing it and logging the elapsed time.
    fn timed(
        &self,
        label: &str,
        invoke: impl FnOnce() -> Result<(), Error>,
    ) -> Result<(), Error> {
        let start = Instant::now();
        let result = invoke();
        debug!(
            "Dispatched {} in {} ms.",
            label,
            start.elapsed().as_millis()
        );
        result
    }
}

/// Consumer-side adapter routing dequeued events into the registries.
struct Dispatcher<'a>(&'a Process);

impl EventHandler<ProcessEvent> for Dispatcher<'_> {
    fn on_event(&mut self, event: ProcessEvent) -> Result<(), Error> {
        match event {
            ProcessEvent::Message(message) => {
                // The handler is cloned out of the lock before invocation
                // so a handler may re-register without deadlocking.
                let handler =
                    self.0.message_handlers.lock().get(&message.name).cloned();
                let Some(handler) = handler else {
                    warn!(
                        "No handler registered for message {}.",
                        message.name
                    );
                    return Ok(());
                };
                self.0.timed(&message.name, || handler(&message))
            }
            ProcessEvent::TimerFired(timer) => {
                let handler =
                    self.0.timer_handlers.lock().get(&timer.timer_id).cloned();
                let Some(handler) = handler else {
                    warn!(
                        "No handler registered for timer {}.",
                        timer.timer_id
                    );
                    return Ok(());
                };
                let label = format!("timer {}", timer.timer_id);
                self.0.timed(&label, || handler(&timer))
            }
            ProcessEvent::SignalFired(signal) => {
                let handler =
                    self.0.signal_handlers.lock().get(&signal.signal).cloned();
                let Some(handler) = handler else {
                    warn!(
                        "No handler registered for signal {}.",
                        signal.signal
                    );
                    return Ok(());
                };
                let label = format!("signal {}", signal.signal);
                self.0.timed(&label, || handler(&signal))
            }
        }
    }

    fn on_failure(&mut self, error: Error) {
        error!("Handler in {} failed: {}", self.0.name, error);
    }
}
