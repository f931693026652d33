// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Logfile
//!
//! Asynchronous rotating file logger built on the runtime primitives:
//! producers post lines through [`LogService`], a worker thread appends
//! them to hour-bucketed files and purges expired ones on rotation.
//!

pub mod service;
pub mod sink;

pub use service::{Kind, LogConfig, LogService, MASK_ALL};
pub use sink::FileSink;
