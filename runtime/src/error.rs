// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Errors module
//!

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for the dispatch runtime.
#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
pub enum Error {
    /// A signal number reserved for internal use was registered.
    #[error("Signal {0} is reserved for internal use.")]
    ReservedSignal(i32),
    /// `signal::wait` was entered while another wait was in progress.
    #[error("Signal wait called while another wait is in progress.")]
    WaitBusy,
    /// The configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),
    /// A timestamp string did not match the expected format.
    #[error("Invalid timestamp: {0}")]
    Timestamp(String),
    /// A user handler reported a failure.
    #[error("Handler failed: {0}")]
    Handler(String),
    /// Error that does not compromise the operation of the system.
    #[error("Error: {0}")]
    Functional(String),
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::ReservedSignal(12);
        assert_eq!(
            error.to_string(),
            "Signal 12 is reserved for internal use."
        );
        let error = Error::Handler("boom".to_owned());
        assert_eq!(error.to_string(), "Handler failed: boom");
    }
}
