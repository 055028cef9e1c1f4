//! Error types for the `loudnorm` crate.
//!
//! This module defines [`NormalizeError`], the unified error type returned by
//! every fallible operation in the crate. Each variant maps to a stable,
//! machine-readable reason code via [`NormalizeError::code`], so callers can
//! branch programmatically while still logging the human-readable message.

use std::io::ErrorKind;

use thiserror::Error;

use crate::parser::ParseError;

/// The unified error type for all `loudnorm` operations.
///
/// Errors are [`Clone`] so they can travel through progress channels as part
/// of a terminal [`ProgressEvent`](crate::ProgressEvent).
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum NormalizeError {
    /// The analysis pass was submitted without an input path.
    #[error("Input path is empty")]
    EmptyInputPath,

    /// The normalization pass was submitted without an input or output path.
    #[error("Both an input and an output path are required")]
    MissingPath,

    /// The engine process could not be started at all.
    #[error("Failed to launch {program}: {reason}")]
    Launch {
        /// Program that was invoked.
        program: String,
        /// Kind of the underlying I/O failure (e.g. `NotFound`).
        kind: ErrorKind,
        /// Underlying reason the launch failed.
        reason: String,
    },

    /// A diagnostic line was not valid UTF-8.
    ///
    /// Reported through [`ProgressEvent::Degraded`](crate::ProgressEvent::Degraded);
    /// never fatal on its own.
    #[error("Undecodable diagnostic line {line}: {reason}")]
    Decode {
        /// One-based index of the offending line.
        line: usize,
        /// Decoder message.
        reason: String,
    },

    /// The analysis output could not be turned into a measurement.
    #[error("Failed to parse loudness analysis: {0}")]
    Parse(#[from] ParseError),

    /// The engine exited with a non-zero status code.
    #[error("Engine exited with status {0}")]
    NonZeroExit(i32),

    /// The engine was terminated by a signal it did not receive from us.
    #[error("Engine was terminated{}", signal_suffix(.signal))]
    Terminated {
        /// Signal number, when the platform reports one.
        signal: Option<i32>,
    },

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// Reading the engine's diagnostic stream failed.
    #[error("Failed to read engine output: {0}")]
    Stream(String),

    /// A loudness value supplied by the caller is not a finite number.
    #[error("Invalid value for {name}: {value}")]
    InvalidParameter {
        /// Parameter name, using the loudnorm key (e.g. `measured_I`).
        name: &'static str,
        /// The rejected value as given.
        value: String,
    },
}

impl NormalizeError {
    /// Stable snake_case reason code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            NormalizeError::EmptyInputPath => "empty_input_path",
            NormalizeError::MissingPath => "missing_path",
            NormalizeError::Launch { .. } => "launch_error",
            NormalizeError::Decode { .. } => "decode_error",
            NormalizeError::Parse(ParseError::NoJsonFound) => "no_json_found",
            NormalizeError::Parse(ParseError::MalformedJson(_)) => "malformed_json",
            NormalizeError::Parse(ParseError::MissingField(_)) => "missing_field",
            NormalizeError::Parse(ParseError::InvalidField { .. }) => "invalid_field",
            NormalizeError::NonZeroExit(_) => "non_zero_exit",
            NormalizeError::Terminated { .. } => "terminated",
            NormalizeError::Cancelled => "cancelled",
            NormalizeError::Stream(_) => "stream_error",
            NormalizeError::InvalidParameter { .. } => "invalid_parameter",
        }
    }
}

fn signal_suffix(signal: &Option<i32>) -> String {
    match signal {
        Some(signal) => format!(" by signal {signal}"),
        None => String::new(),
    }
}
