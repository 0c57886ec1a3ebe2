// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Call-stack annotated log written to a persisted text surface.
//!
//! Entries are rendered as `->caller->command: [LEVEL]: message` and are
//! always prepended, so the surface text starts with the newest entry.
//! Every entry is mirrored as a `tracing` event.

use std::fmt;
use std::io;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Severity of a persisted log entry. Ordered from least to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Info,
    Debug,
}

impl LogLevel {
    pub const ALL: [LogLevel; 3] = [LogLevel::Error, LogLevel::Info, LogLevel::Debug];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level name matches no variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level '{0}' (expected ERROR, INFO or DEBUG)")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

/// Text surface the log is persisted to.
///
/// The logger always performs a read-modify-write and calls `write` with
/// `append = false`.
pub trait LogSurface: Send {
    fn read(&self) -> io::Result<String>;

    fn write(&mut self, text: &str, append: bool) -> io::Result<()>;
}

/// In-memory surface, used by tests and as a fallback when no panel is configured.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    text: String,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl LogSurface for MemorySurface {
    fn read(&self) -> io::Result<String> {
        Ok(self.text.clone())
    }

    fn write(&mut self, text: &str, append: bool) -> io::Result<()> {
        if append {
            self.text.push_str(text);
        } else {
            self.text = text.to_string();
        }
        Ok(())
    }
}

/// Filtering and retention applied to persisted entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogPolicy {
    /// Most verbose level that is persisted.
    pub max_level: LogLevel,
    /// Keep at most this many lines of the surface text (newest first).
    /// Whole entries are dropped, and the newest entry is always kept.
    pub max_lines: Option<usize>,
}

impl Default for LogPolicy {
    fn default() -> Self {
        Self {
            max_level: LogLevel::Debug,
            max_lines: None,
        }
    }
}

impl LogPolicy {
    pub fn allows(&self, level: LogLevel) -> bool {
        level <= self.max_level
    }
}

/// Logger for a single dispatch invocation.
pub struct Logger<'a> {
    surface: &'a mut dyn LogSurface,
    policy: LogPolicy,
    call_stack: Vec<String>,
    persist_error: Option<io::Error>,
}

impl<'a> Logger<'a> {
    pub fn new(surface: &'a mut dyn LogSurface, policy: LogPolicy) -> Self {
        Self {
            surface,
            policy,
            call_stack: Vec::new(),
            persist_error: None,
        }
    }

    /// Append a caller to the trace. The stack is never popped.
    pub fn push_caller(&mut self, caller: impl Into<String>) {
        self.call_stack.push(caller.into());
    }

    pub fn call_stack(&self) -> &[String] {
        &self.call_stack
    }

    /// Render the call stack as `->a->b`.
    pub fn trace(&self) -> String {
        self.call_stack
            .iter()
            .map(|caller| format!("->{}", caller))
            .collect()
    }

    /// Record an entry. A failed surface write is kept and reported by
    /// [`Logger::take_persist_error`].
    pub fn log(&mut self, level: LogLevel, message: &str) {
        let trace = self.trace();
        match level {
            LogLevel::Error => error!(trace = %trace, "{}", message),
            LogLevel::Info => info!(trace = %trace, "{}", message),
            LogLevel::Debug => debug!(trace = %trace, "{}", message),
        }

        if !self.policy.allows(level) {
            return;
        }

        let line = format!("{}: [{}]: {}", trace, level, message);
        if let Err(e) = self.prepend(&line) {
            warn!("Failed to persist log entry: {}", e);
            if self.persist_error.is_none() {
                self.persist_error = Some(e);
            }
        }
    }

    /// First surface write failure since the logger was created.
    pub fn take_persist_error(&mut self) -> Option<io::Error> {
        self.persist_error.take()
    }

    /// Empty the persisted surface.
    pub fn clear(&mut self) -> io::Result<()> {
        self.surface.write("", false)
    }

    fn prepend(&mut self, line: &str) -> io::Result<()> {
        let existing = self.surface.read()?;
        let mut text = if existing.is_empty() {
            line.to_string()
        } else {
            format!("{}\n{}", line, existing)
        };
        if let Some(max_lines) = self.policy.max_lines {
            text = keep_newest_entries(&text, max_lines);
        }
        self.surface.write(&text, false)
    }
}

/// Whether `line` opens an entry, i.e. reads `[->trace]: [LEVEL]: ...`.
fn is_entry_start(line: &str) -> bool {
    let Some(at) = line.find(": [") else {
        return false;
    };
    let (trace, rest) = line.split_at(at);
    if !(trace.is_empty() || trace.starts_with("->")) {
        return false;
    }
    let rest = &rest[3..];
    LogLevel::ALL.iter().any(|level| {
        rest.strip_prefix(level.as_str())
            .is_some_and(|tail| tail.starts_with("]: "))
    })
}

/// Cut `text` to at most `max_lines` lines on an entry boundary.
fn keep_newest_entries(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines {
        return text.to_string();
    }
    let cut = (1..=max_lines)
        .rev()
        .find(|&i| is_entry_start(lines[i]))
        .or_else(|| (1..lines.len()).find(|&i| is_entry_start(lines[i])))
        .unwrap_or(lines.len());
    lines[..cut].join("\n")
}
