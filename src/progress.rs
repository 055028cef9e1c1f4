//! Progress reporting and cancellation support.
//!
//! Every operation reports a sequence of [`ProgressEvent`]s: one
//! [`Line`](ProgressEvent::Line) per diagnostic line the engine writes, in
//! the order it wrote them, followed by exactly one
//! [`Finished`](ProgressEvent::Finished). Nothing is reported after
//! `Finished`.
//!
//! [`CancellationToken`] stops an operation: the engine process is killed
//! and the operation finishes with [`NormalizeError::Cancelled`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use loudnorm::{AnalysisRequest, CancellationToken, ProgressEvent, RunOptions};
//!
//! # async fn example() {
//! let token = CancellationToken::new();
//! let options = RunOptions::new()
//!     .with_cancellation(token.clone())
//!     .with_progress(Arc::new(|event: ProgressEvent| {
//!         if let ProgressEvent::Line(line) = event {
//!             eprintln!("{line}");
//!         }
//!     }));
//!
//! let result = loudnorm::analyze(&AnalysisRequest::new("input.mp4"), &options).await;
//! # }
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use thiserror::Error;

use crate::error::NormalizeError;
use crate::loudness::LoudnessMeasurement;

/// The kind of operation an event stream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OperationType {
    /// First pass: measuring loudness.
    LoudnessAnalysis,
    /// Second pass: re-encoding audio with the loudnorm correction.
    Normalization,
}

impl Display for OperationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OperationType::LoudnessAnalysis => write!(f, "loudness analysis"),
            OperationType::Normalization => write!(f, "normalization"),
        }
    }
}

/// Successful outcome of an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The analysis pass produced a measurement.
    Analyzed(LoudnessMeasurement),
    /// The normalization pass wrote its output.
    Normalized,
}

/// Failed outcome of an operation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{reason}")]
pub struct Failure {
    /// Machine-readable cause.
    pub reason: NormalizeError,
    /// Diagnostic text the engine wrote before the failure, one line per
    /// line. Empty when the engine never started.
    pub diagnostics: String,
}

impl Failure {
    /// A failure that happened before any output was seen.
    pub fn new(reason: NormalizeError) -> Self {
        Self {
            reason,
            diagnostics: String::new(),
        }
    }

    /// A failure carrying the diagnostics gathered so far.
    pub fn with_diagnostics(reason: NormalizeError, diagnostics: String) -> Self {
        Self {
            reason,
            diagnostics,
        }
    }
}

/// One entry in an operation's progress stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A diagnostic line, with trailing whitespace removed.
    Line(String),
    /// A line that was not valid UTF-8. Processing continues.
    Degraded {
        /// Lossy rendering of the bytes.
        line: String,
        /// Always [`NormalizeError::Decode`].
        error: NormalizeError,
    },
    /// Terminal event. Sent exactly once, last.
    Finished(Result<Completion, Failure>),
}

impl ProgressEvent {
    /// Returns `true` for [`ProgressEvent::Finished`].
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Finished(_))
    }
}

/// Receiver of progress events.
///
/// Implementations must be [`Send`] and [`Sync`] because events are
/// delivered from worker tasks. Callbacks observe but cannot halt the
/// operation; use [`CancellationToken`] for that.
///
/// Any `Fn(ProgressEvent) + Send + Sync` closure is a callback.
pub trait ProgressCallback: Send + Sync {
    /// Called once per event, in order.
    fn on_event(&self, event: ProgressEvent);
}

impl<F> ProgressCallback for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn on_event(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards all events. The default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_event(&self, _event: ProgressEvent) {}
}

/// Cooperative cancellation token.
///
/// Clone it and share it between tasks; call
/// [`cancel`](CancellationToken::cancel) from anywhere to stop the
/// associated operation. A running engine process is killed; an operation
/// that has not launched yet never launches.
///
/// # Example
///
/// ```
/// use loudnorm::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.clone().cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: tokio_util::sync::CancellationToken,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            inner: tokio_util::sync::CancellationToken::new(),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        self.inner.cancelled().await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
