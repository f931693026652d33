// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Process events
//!
//! Everything a [`crate::Process`] consumes arrives as one `ProcessEvent`:
//! an application message, a timer expiration or an OS signal. The three
//! payload types are public so handlers receive the concrete variant they
//! registered for.
//!

use crate::signal::SignalNo;
use crate::timer::TimerId;

use bytes::Bytes;

/// Application message: a routing name plus an opaque payload.
///
/// The payload is [`Bytes`] so producers can hand the same buffer to
/// several processes without copying.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageEvent {
    pub name: String,
    pub payload: Bytes,
}

impl MessageEvent {
    pub fn new(name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }
}

/// Timer expiration carrying the id it was registered under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerEvent {
    pub timer_id: TimerId,
}

/// OS signal delivery forwarded by the signal-watch thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignalEvent {
    pub signal: SignalNo,
}

/// Closed sum of everything the process consumer dispatches.
#[derive(Clone, Debug, PartialEq)]
pub enum ProcessEvent {
    Message(MessageEvent),
    TimerFired(TimerEvent),
    SignalFired(SignalEvent),
}

impl ProcessEvent {
    /// Shorthand for a message event.
    pub fn message(name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self::Message(MessageEvent::new(name, payload))
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_message_payload_is_shared_not_copied() {
        let payload = Bytes::from_static(b"ping");
        let first = ProcessEvent::message("echo", payload.clone());
        let second = ProcessEvent::message("echo", payload);
        assert_eq!(first, second);
    }
}
