//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Logging configuration for codec, migration and validation operations.
//!
//! Messages route to the [`log`] crate facade by default; callers that want
//! save-system output somewhere else entirely can supply a sink callback.
//! Logging is purely informational and is never used to carry errors.

use std::fmt;

/// Verbosity threshold for save system log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Per-record detail. Very chatty on large worlds.
    Debug,
    /// Save/load summaries and migration steps.
    Info,
    /// Recoverable oddities, such as duplicate migration registrations.
    Warn,
    /// Failures about to be surfaced as errors.
    Error,
    /// No output at all.
    Off,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Off => "off",
        };
        write!(f, "{}", name)
    }
}

/// Callback receiving `(level, formatted message)` from the save system.
pub type LogSink = Box<dyn Fn(LogLevel, &str) + Send + Sync>;

/// Logging configuration carried by codecs, migrators and validators.
///
/// # Examples
///
/// ```
/// use worldsave::{LogConfig, LogLevel};
///
/// // Route to the `log` facade, info and up.
/// let config = LogConfig::new(LogLevel::Info);
///
/// // Route to a custom sink instead.
/// let config = LogConfig::new(LogLevel::Debug)
///     .with_sink(|level, message| eprintln!("[{level}] {message}"));
/// ```
pub struct LogConfig {
    level: LogLevel,
    sink: Option<LogSink>,
}

impl LogConfig {
    /// Creates a configuration routing to the `log` facade at `level`.
    pub fn new(level: LogLevel) -> Self {
        Self { level, sink: None }
    }

    /// Creates a configuration that discards all output.
    pub fn off() -> Self {
        Self::new(LogLevel::Off)
    }

    /// Replaces the `log` facade with a caller-supplied sink.
    pub fn with_sink(mut self, sink: impl Fn(LogLevel, &str) + Send + Sync + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Returns the configured threshold.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Whether a message at `level` would be emitted.
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.level != LogLevel::Off && level >= self.level
    }

    /// Emit a message at `level`, if the threshold allows it.
    pub fn emit(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }
        match &self.sink {
            Some(sink) => sink(level, message),
            None => match level {
                LogLevel::Debug => log::debug!("{}", message),
                LogLevel::Info => log::info!("{}", message),
                LogLevel::Warn => log::warn!("{}", message),
                LogLevel::Error => log::error!("{}", message),
                LogLevel::Off => {}
            },
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new(LogLevel::Warn)
    }
}

impl fmt::Debug for LogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogConfig")
            .field("level", &self.level)
            .field("sink", &self.sink.as_ref().map(|_| "<callback>"))
            .finish()
    }
}
