// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! # Config file
//!
//! Line-oriented INI reader used by the process shell at initialization.
//! Lookups never fail: a missing section or key falls back to the
//! caller-supplied default, so a process always starts with a complete
//! configuration.
//!

use crate::Error;

use tracing::debug;

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// In-memory view of an INI-style config file.
///
/// Sections map keys to string values; typed interpretation is the
/// caller's business. Keys appearing before any `[section]` header land in
/// the unnamed section `""`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigFile {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl ConfigFile {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and parses `path`.
    ///
    /// Blank lines and lines starting with `;` or `#` are skipped.
    /// `[section]` switches the current section; `key=value` is split at
    /// the first `=` with both sides trimmed. A line without `=` is
    /// ignored, not an error.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|error| {
            Error::Config(format!(
                "Can not read config file {}: {}",
                path.display(),
                error
            ))
        })?;
        let config = Self::parse(&text);
        debug!(
            "Loaded config file {} with {} sections.",
            path.display(),
            config.sections.len()
        );
        Ok(config)
    }

    fn parse(text: &str) -> Self {
        let mut sections: BTreeMap<String, BTreeMap<String, String>> =
            BTreeMap::new();
        let mut current = String::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#')
            {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                current = line[1..line.len() - 1].trim().to_owned();
                sections.entry(current.clone()).or_default();
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            sections
                .entry(current.clone())
                .or_default()
                .insert(key.trim().to_owned(), value.trim().to_owned());
        }

        Self { sections }
    }

    /// Writes the configuration back out, one `[section]` block per
    /// section with a blank line between blocks.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let mut text = String::new();
        let mut first = true;
        for (section, entries) in &self.sections {
            if !first {
                text.push('\n');
            }
            first = false;
            if !section.is_empty() {
                let _ = writeln!(text, "[{}]", section);
            }
            for (key, value) in entries {
                let _ = writeln!(text, "{}={}", key, value);
            }
        }
        std::fs::write(path, text).map_err(|error| {
            Error::Config(format!(
                "Can not write config file {}: {}",
                path.display(),
                error
            ))
        })
    }

    /// Looks a value up, falling back to `default` when the section or
    /// key is absent.
    pub fn get(&self, section: &str, key: &str, default: &str) -> String {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .cloned()
            .unwrap_or_else(|| default.to_owned())
    }

    /// Inserts or replaces a value.
    pub fn set(
        &mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.sections
            .entry(section.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// All sections with their entries.
    pub fn all(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.sections
    }
}
