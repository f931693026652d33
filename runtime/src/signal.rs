// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Signal coordinator
//!
//! Process-wide wait primitive for OS signals. Signal delivery is coarse
//! and async-signal-unsafe for complex logic, so the installed OS handler
//! only stores the signal number into a pending slot; all dispatch logic
//! runs on an ordinary thread polling that slot.
//!
//! At most one thread may block in [`wait`] at a time: the in-use flag is
//! the single point of mutual exclusion for handler installation and is
//! never held across user code.
//!

use crate::Error;

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::time::Duration;

/// Signal number as delivered by the OS.
pub type SignalNo = i32;

/// Reserved signal used purely to interrupt a blocking [`wait`], never
/// exposed for handler registration. Callers append it to every wait set
/// so that a changed set of signals of interest can force a prompt
/// re-entry into [`wait`].
pub const WAKE_SIGNAL: SignalNo = libc::SIGUSR2;

/// Default pending-slot poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Pending-signal slot, last write wins. No queueing: two signals
/// arriving between polls collapse to the later one.
static PENDING: AtomicI32 = AtomicI32::new(0);

/// At most one concurrent waiter.
static WAIT_IN_USE: AtomicBool = AtomicBool::new(false);

/// Store-only OS signal handler.
extern "C" fn store_signal(signal: libc::c_int) {
    PENDING.store(signal, Ordering::Relaxed);
}

/// Software-raises `signal`: unconditionally overwrites the pending slot.
/// Raising zero is a no-op.
pub fn raise(signal: SignalNo) {
    if signal == 0 {
        return;
    }
    PENDING.store(signal, Ordering::Relaxed);
}

/// Blocks until one of `signals` is delivered (or software-raised) and
/// returns its number, polling the pending slot at `poll_interval`.
///
/// Fails immediately with [`Error::WaitBusy`] if another `wait` is in
/// progress — a usage error, not a condition to retry. The in-use flag is
/// cleared on every return path.
pub fn wait(
    signals: &[SignalNo],
    poll_interval: Duration,
) -> Result<SignalNo, Error> {
    if WAIT_IN_USE
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return Err(Error::WaitBusy);
    }

    let handler: extern "C" fn(libc::c_int) = store_signal;
    for &signal in signals {
        unsafe {
            libc::signal(signal, handler as libc::sighandler_t);
        }
    }

    loop {
        let signal = PENDING.swap(0, Ordering::Relaxed);
        if signal != 0 {
            WAIT_IN_USE.store(false, Ordering::Release);
            return Ok(signal);
        }
        std::thread::sleep(poll_interval);
    }
}
