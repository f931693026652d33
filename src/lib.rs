//! Core library for the Dispatch framework.
//! Provides the foundational components for building single-process,
//! event-dispatching services: the blocking queue, the event loop, the
//! worker thread, timers, signal waiting and the process shell, plus the
//! asynchronous rotating file logger built on top of them.

pub use runtime::{
    BlockingQueue, ConfigFile, Error as RuntimeError, EventHandler,
    EventLoop, MessageEvent, Process, ProcessEvent, SignalEvent, SignalNo,
    TimeStamp, TimerEvent, TimerId, TimerManager, WorkerThread, signal,
};

pub use logfile::{Kind, LogConfig, LogService};
