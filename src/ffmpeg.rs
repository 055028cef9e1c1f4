//! Engine log level configuration.
//!
//! The engine decides on its own how much it writes to stderr. This module
//! exposes its `-loglevel` option so callers can quiet banners and warnings
//! without touching argument vectors by hand.
//!
//! The analysis pass reads its measurement from the engine's `info` output,
//! so levels below [`EngineLogLevel::Info`] make analysis fail with
//! [`ParseError::NoJsonFound`](crate::parser::ParseError::NoJsonFound).
//!
//! # Example
//!
//! ```
//! use loudnorm::{EngineLogLevel, RunOptions};
//!
//! let options = RunOptions::new().with_engine_log_level(EngineLogLevel::Info);
//! assert_eq!(options.global_arguments(), ["-loglevel", "info"]);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Engine log verbosity, most quiet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EngineLogLevel {
    /// Print no output at all.
    Quiet,
    /// Only conditions that abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings.
    Warning,
    /// Informational messages, the engine's default.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Extremely verbose tracing output.
    Trace,
}

impl EngineLogLevel {
    /// The value passed to `-loglevel`.
    pub fn as_arg(self) -> &'static str {
        match self {
            EngineLogLevel::Quiet => "quiet",
            EngineLogLevel::Panic => "panic",
            EngineLogLevel::Fatal => "fatal",
            EngineLogLevel::Error => "error",
            EngineLogLevel::Warning => "warning",
            EngineLogLevel::Info => "info",
            EngineLogLevel::Verbose => "verbose",
            EngineLogLevel::Debug => "debug",
            EngineLogLevel::Trace => "trace",
        }
    }

    /// Whether the loudnorm summary is still printed at this level.
    pub fn shows_analysis_summary(self) -> bool {
        self >= EngineLogLevel::Info
    }
}

impl Display for EngineLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_arg())
    }
}

impl FromStr for EngineLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Ok(EngineLogLevel::Quiet),
            "panic" => Ok(EngineLogLevel::Panic),
            "fatal" => Ok(EngineLogLevel::Fatal),
            "error" => Ok(EngineLogLevel::Error),
            "warning" | "warn" => Ok(EngineLogLevel::Warning),
            "info" => Ok(EngineLogLevel::Info),
            "verbose" => Ok(EngineLogLevel::Verbose),
            "debug" => Ok(EngineLogLevel::Debug),
            "trace" => Ok(EngineLogLevel::Trace),
            other => Err(format!("unknown engine log level: {other}")),
        }
    }
}
