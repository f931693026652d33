// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Runtime
//!
//! Core primitives for single-process, event-dispatching services: a
//! blocking FIFO queue with shutdown semantics, a generic queue-backed
//! consumer loop with failure containment, a background worker thread, a
//! thread-per-timer subsystem, a single-waiter OS-signal coordinator, and
//! the `Process` shell composing them into handler dispatch.
//!
//! Producers run on parallel OS threads; every handler runs on one
//! consumer thread, one at a time, in queue arrival order.
//!

pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod process;
pub mod queue;
pub mod signal;
pub mod stamp;
pub mod timer;
pub mod worker;

pub use config::ConfigFile;
pub use engine::{EventHandler, EventLoop};
pub use error::Error;
pub use event::{MessageEvent, ProcessEvent, SignalEvent, TimerEvent};
pub use process::{MessageHandler, Process, SignalHandler, TimerHandler};
pub use queue::BlockingQueue;
pub use signal::SignalNo;
pub use stamp::TimeStamp;
pub use timer::{TimerId, TimerManager};
pub use worker::WorkerThread;
