// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # File sink
//!
//! Consumer side of the log service: receives already-formatted lines on
//! the worker thread and appends them to an hour-bucketed file, rotating
//! and purging expired files when the bucket changes.
//!

use crate::service::LogConfig;

use chrono::Local;
use runtime::{Error, EventHandler};
use tracing::error;

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::time::SystemTime;

/// Appends log lines to `{dir}/{prefix}_{YYYYMMDD_HH}.txt`.
///
/// Runs entirely on the worker thread, so the open file handle needs no
/// locking.
pub struct FileSink {
    config: LogConfig,
    file: Option<File>,
    bucket: String,
}

impl FileSink {
    pub fn new(config: LogConfig) -> Self {
        Self {
            config,
            file: None,
            bucket: String::new(),
        }
    }

    /// Current hour bucket, e.g. `20250301_14`.
    fn current_bucket() -> String {
        Local::now().format("%Y%m%d_%H").to_string()
    }

    /// Closes the previous file, purges expired siblings and opens the
    /// file for `bucket`.
    fn rotate(&mut self, bucket: &str) -> Result<(), Error> {
        self.file = None;
        self.purge_expired(SystemTime::now());

        std::fs::create_dir_all(&self.config.dir).map_err(|err| {
            Error::Functional(format!(
                "Can not create log directory {}: {}",
                self.config.dir.display(),
                err
            ))
        })?;
        let path = self
            .config
            .dir
            .join(format!("{}_{}.txt", self.config.prefix, bucket));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| {
                Error::Functional(format!(
                    "Can not open log file {}: {}",
                    path.display(),
                    err
                ))
            })?;
        self.file = Some(file);
        self.bucket = bucket.to_owned();
        Ok(())
    }

    /// Deletes files in the log directory matching `{prefix}_` whose
    /// modification time is older than the configured expiry, measured
    /// against `now`. An expiry of zero keeps everything.
    fn purge_expired(&self, now: SystemTime) {
        if self.config.expire_secs == 0 {
            return;
        }
        let Ok(entries) = std::fs::read_dir(&self.config.dir) else {
            return;
        };
        let marker = format!("{}_", self.config.prefix);
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with(&marker) {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            if is_expired(modified, now, self.config.expire_secs) {
                let _ = std::fs::remove_file(entry.path());
            }
        }
    }
}

/// True when `modified` lies more than `expire_secs` before `now`.
pub(crate) fn is_expired(
    modified: SystemTime,
    now: SystemTime,
    expire_secs: u64,
) -> bool {
    match now.duration_since(modified) {
        Ok(age) => age.as_secs() > expire_secs,
        // A modification time in the future is never expired.
        Err(_) => false,
    }
}

impl EventHandler<String> for FileSink {
    fn on_event(&mut self, line: String) -> Result<(), Error> {
        let bucket = Self::current_bucket();
        if self.file.is_none() || bucket != self.bucket {
            self.rotate(&bucket)?;
        }
        if let Some(file) = self.file.as_mut() {
            writeln!(file, "{}", line).map_err(|err| {
                Error::Functional(format!("Log write failed: {}", err))
            })?;
        }
        if self.config.console_echo {
            println!("{}", line);
        }
        Ok(())
    }

    fn on_failure(&mut self, err: Error) {
        error!("Log sink failure: {}", err);
    }
}
