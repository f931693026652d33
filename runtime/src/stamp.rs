// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Timestamp utility
//!
//! Microsecond-resolution wall-clock stamp with a fixed canonical text
//! form, `yyyy/MM/dd HH:mm:ss:ffffff` in local time. Log lines and
//! file-rotation bucketing both build on this type.
//!

use crate::Error;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

/// Canonical text form, 26 characters.
const FORMAT: &str = "%Y/%m/%d %H:%M:%S:%6f";
const FORMAT_LEN: usize = 26;

/// Local wall-clock timestamp with microsecond resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeStamp(DateTime<Local>);

impl TimeStamp {
    /// Captures the current wall-clock time.
    pub fn now() -> Self {
        Self(Local::now())
    }

    /// Formats with an arbitrary `chrono` format string.
    pub fn format(&self, fmt: &str) -> String {
        self.0.format(fmt).to_string()
    }

    /// Parses the canonical 26-character form. Anything else, including a
    /// string of the wrong length, is a [`Error::Timestamp`].
    pub fn from_string(text: &str) -> Result<Self, Error> {
        if text.len() != FORMAT_LEN {
            return Err(Error::Timestamp(format!(
                "Invalid timestamp length {}: {}",
                text.len(),
                text
            )));
        }
        let naive =
            NaiveDateTime::parse_from_str(text, FORMAT).map_err(|error| {
                Error::Timestamp(format!(
                    "Invalid timestamp {}: {}",
                    text, error
                ))
            })?;
        let local = Local
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| {
                Error::Timestamp(format!("Ambiguous local time: {}", text))
            })?;
        Ok(Self(local))
    }

    /// Microseconds since the Unix epoch.
    pub fn to_epoch_micros(&self) -> i64 {
        self.0.timestamp_micros()
    }

    /// Builds a stamp from microseconds since the Unix epoch.
    pub fn from_epoch_micros(micros: i64) -> Result<Self, Error> {
        let utc = DateTime::from_timestamp_micros(micros).ok_or_else(|| {
            Error::Timestamp(format!("Epoch out of range: {}", micros))
        })?;
        Ok(Self(utc.with_timezone(&Local)))
    }

    /// Whole seconds from `earlier` to `self`, negative when `self` is
    /// the earlier one.
    pub fn diff_seconds(&self, earlier: &TimeStamp) -> i64 {
        self.0.signed_duration_since(earlier.0).num_seconds()
    }

    /// Whole milliseconds from `earlier` to `self`.
    pub fn diff_millis(&self, earlier: &TimeStamp) -> i64 {
        self.0.signed_duration_since(earlier.0).num_milliseconds()
    }
}

impl std::fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}
