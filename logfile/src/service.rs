// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Log service
//!
//! Producer side of the asynchronous file logger. `LogService` is an
//! explicitly constructed service shared by `Arc`: callers post lines,
//! a [`WorkerThread`] drains them into the [`FileSink`] off the callers'
//! threads. A write never blocks on file I/O.
//!

use crate::sink::FileSink;

use parking_lot::Mutex;
use runtime::{ConfigFile, EventLoop, TimeStamp, WorkerThread};
use tracing::debug;

use std::path::PathBuf;
use std::sync::Arc;

/// Log-line category. Each kind occupies one bit of the configured mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Dump,
    Detail,
    Debug,
    Send,
    Recv,
    Info,
    Alert,
    Error,
}

impl Kind {
    /// Bit of this kind in a mask.
    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Fixed label used in formatted lines.
    pub fn label(self) -> &'static str {
        match self {
            Kind::Dump => "DUMP",
            Kind::Detail => "DETAIL",
            Kind::Debug => "DEBUG",
            Kind::Send => "SEND",
            Kind::Recv => "RECV",
            Kind::Info => "INFO",
            Kind::Alert => "ALERT",
            Kind::Error => "ERROR",
        }
    }
}

/// Mask enabling every kind.
pub const MASK_ALL: u32 = 0xFF;

/// Settings for one [`LogService`].
#[derive(Clone, Debug, PartialEq)]
pub struct LogConfig {
    /// Bitmask of enabled kinds.
    pub mask: u32,
    /// Files older than this many seconds are purged on rotation;
    /// zero keeps everything.
    pub expire_secs: u64,
    /// Log file name prefix.
    pub prefix: String,
    /// Directory holding the log files, created on demand.
    pub dir: PathBuf,
    /// Echo every line to standard output as well.
    pub console_echo: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            mask: MASK_ALL,
            expire_secs: 0,
            prefix: "log".to_owned(),
            dir: PathBuf::from("logs"),
            console_echo: false,
        }
    }
}

impl LogConfig {
    /// Reads the `[Log]` section: `Mask` (hex with `0x` prefix, or
    /// decimal), `ExpireSec`, `LogFilePrefix`, `LogDir`. Missing or
    /// unparsable values fall back to the defaults.
    pub fn from_config(config: &ConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            mask: parse_mask(&config.get("Log", "Mask", ""))
                .unwrap_or(defaults.mask),
            expire_secs: config
                .get("Log", "ExpireSec", "")
                .parse()
                .unwrap_or(defaults.expire_secs),
            prefix: match config.get("Log", "LogFilePrefix", "") {
                prefix if prefix.is_empty() => defaults.prefix,
                prefix => prefix,
            },
            dir: match config.get("Log", "LogDir", "") {
                dir if dir.is_empty() => defaults.dir,
                dir => PathBuf::from(dir),
            },
            console_echo: defaults.console_echo,
        }
    }
}

fn parse_mask(text: &str) -> Option<u32> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

/// Asynchronous rotating file logger.
///
/// Construct once, [`LogService::start`] at process start,
/// [`LogService::stop`] at process end; share by `Arc` in between.
pub struct LogService {
    mask: u32,
    engine: Arc<EventLoop<String>>,
    worker: Mutex<WorkerThread<String, FileSink>>,
}

impl LogService {
    pub fn new(config: LogConfig) -> Self {
        let engine = Arc::new(EventLoop::new());
        let sink = FileSink::new(config.clone());
        let worker = Mutex::new(WorkerThread::new(engine.clone(), sink));
        Self {
            mask: config.mask,
            engine,
            worker,
        }
    }

    /// Launches the sink thread.
    pub fn start(&self) {
        debug!("Starting log service.");
        self.worker.lock().start();
    }

    /// Drains and joins the sink thread. Lines posted before `stop` are
    /// on disk when it returns.
    pub fn stop(&self) {
        debug!("Stopping log service.");
        self.worker.lock().stop();
    }

    /// True when `kind` is enabled by the mask.
    pub fn enabled(&self, kind: Kind) -> bool {
        self.mask & kind.bit() != 0
    }

    /// Posts a raw line for the sink. Returns `false` when the kind is
    /// masked out or the service has stopped accepting lines.
    pub fn write(&self, kind: Kind, line: impl Into<String>) -> bool {
        if !self.enabled(kind) {
            return false;
        }
        self.engine.post(line.into())
    }

    /// Formatted write: prefixes timestamp, kind label and thread id.
    pub fn log(&self, kind: Kind, text: &str) -> bool {
        if !self.enabled(kind) {
            return false;
        }
        let line = format!(
            "{} [{}] ({:?}) {}",
            TimeStamp::now(),
            kind.label(),
            std::thread::current().id(),
            text
        );
        self.engine.post(line)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    use chrono::Local;

    fn bucket_path(dir: &std::path::Path, prefix: &str) -> PathBuf {
        dir.join(format!(
            "{}_{}.txt",
            prefix,
            Local::now().format("%Y%m%d_%H")
        ))
    }

    #[test]
    fn test_kind_bits_are_distinct() {
        let kinds = [
            Kind::Dump,
            Kind::Detail,
            Kind::Debug,
            Kind::Send,
            Kind::Recv,
            Kind::Info,
            Kind::Alert,
            Kind::Error,
        ];
        let mut mask = 0u32;
        for kind in kinds {
            assert_eq!(mask & kind.bit(), 0);
            mask |= kind.bit();
        }
        assert_eq!(mask, MASK_ALL);
    }

    #[test]
    fn test_config_section_parsing() {
        let mut config = ConfigFile::new();
        config.set("Log", "Mask", "0x21");
        config.set("Log", "ExpireSec", "86400");
        config.set("Log", "LogFilePrefix", "svc");
        config.set("Log", "LogDir", "/tmp/svc-logs");

        let parsed = LogConfig::from_config(&config);
        assert_eq!(parsed.mask, 0x21);
        assert_eq!(parsed.expire_secs, 86400);
        assert_eq!(parsed.prefix, "svc");
        assert_eq!(parsed.dir, PathBuf::from("/tmp/svc-logs"));
    }

    #[test]
    fn test_config_defaults_when_section_is_missing() {
        let parsed = LogConfig::from_config(&ConfigFile::new());
        assert_eq!(parsed, LogConfig::default());
    }

    #[test]
    fn test_decimal_mask_is_accepted() {
        let mut config = ConfigFile::new();
        config.set("Log", "Mask", "255");
        assert_eq!(LogConfig::from_config(&config).mask, MASK_ALL);
    }

    #[test]
    fn test_stop_flushes_pending_lines() {
        let dir = tempfile::tempdir().unwrap();
        let service = LogService::new(LogConfig {
            prefix: "flush".to_owned(),
            dir: dir.path().to_path_buf(),
            ..LogConfig::default()
        });

        service.start();
        for i in 0..5_000 {
            assert!(service.write(Kind::Info, format!("line {}", i)));
        }
        // stop() must drain the backlog, not just stop the worker.
        service.stop();

        let text =
            std::fs::read_to_string(bucket_path(dir.path(), "flush")).unwrap();
        assert_eq!(text.lines().count(), 5_000);
        assert!(text.contains("line 4999"));
    }

    #[test]
    fn test_masked_out_kind_never_reaches_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = LogService::new(LogConfig {
            mask: Kind::Error.bit(),
            prefix: "mask".to_owned(),
            dir: dir.path().to_path_buf(),
            ..LogConfig::default()
        });

        service.start();
        assert!(!service.write(Kind::Debug, "hidden"));
        assert!(service.write(Kind::Error, "visible"));
        service.stop();

        let text =
            std::fs::read_to_string(bucket_path(dir.path(), "mask")).unwrap();
        assert!(text.contains("visible"));
        assert!(!text.contains("hidden"));
    }

    #[test]
    fn test_formatted_line_carries_label_and_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let service = LogService::new(LogConfig {
            prefix: "fmt".to_owned(),
            dir: dir.path().to_path_buf(),
            ..LogConfig::default()
        });

        service.start();
        assert!(service.log(Kind::Alert, "something happened"));
        service.stop();

        let text =
            std::fs::read_to_string(bucket_path(dir.path(), "fmt")).unwrap();
        assert!(text.contains("[ALERT]"));
        assert!(text.contains("something happened"));
        // Canonical timestamp: yyyy/MM/dd HH:mm:ss:ffffff.
        let stamp = &text[..26];
        assert!(runtime::TimeStamp::from_string(stamp).is_ok());
    }
}
