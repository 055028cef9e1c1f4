//! Operation configuration.
//!
//! [`RunOptions`] is a builder that threads the engine location, progress
//! callback, cancellation token and a few global engine flags through the
//! operations without widening every signature. [`SchedulerOptions`] sizes
//! the [`Scheduler`](crate::Scheduler)'s worker pool.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use loudnorm::{CancellationToken, ProgressEvent, RunOptions};
//!
//! let token = CancellationToken::new();
//! let options = RunOptions::new()
//!     .with_engine("/opt/ffmpeg/bin/ffmpeg")
//!     .with_progress(Arc::new(|event: ProgressEvent| println!("{event:?}")))
//!     .with_cancellation(token.clone())
//!     .with_overwrite(true);
//! assert_eq!(options.global_arguments(), ["-y"]);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ffmpeg::EngineLogLevel;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback, ProgressEvent};

/// Program run when no engine path is configured; resolved through `PATH`.
pub const DEFAULT_ENGINE: &str = "ffmpeg";

/// Settings shared by the analysis and normalization operations.
///
/// A default-constructed value runs `ffmpeg` from `PATH`, discards progress,
/// is never cancelled, and adds nothing to the engine's argument vector.
#[derive(Clone)]
pub struct RunOptions {
    pub(crate) engine: PathBuf,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) log_level: Option<EngineLogLevel>,
    pub(crate) overwrite: bool,
}

impl Debug for RunOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RunOptions")
            .field("engine", &self.engine)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("log_level", &self.log_level)
            .field("overwrite", &self.overwrite)
            .finish()
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RunOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            engine: PathBuf::from(DEFAULT_ENGINE),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            log_level: None,
            overwrite: false,
        }
    }

    /// Run the engine binary at `path` instead of `ffmpeg` from `PATH`.
    #[must_use]
    pub fn with_engine(mut self, path: impl Into<PathBuf>) -> Self {
        self.engine = path.into();
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled the operation kills the engine and
    /// finishes with [`NormalizeError::Cancelled`](crate::NormalizeError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Pass `-loglevel <level>` to the engine.
    #[must_use]
    pub fn with_engine_log_level(mut self, level: EngineLogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Pass `-y` so the engine replaces an existing output file instead of
    /// refusing to write it.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// The configured engine program.
    pub fn engine(&self) -> &Path {
        &self.engine
    }

    /// The configured cancellation token, if any.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    /// Global engine flags, placed ahead of the pass-specific arguments.
    pub fn global_arguments(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.overwrite {
            args.push("-y".to_string());
        }
        if let Some(level) = self.log_level {
            args.push("-loglevel".to_string());
            args.push(level.as_arg().to_string());
        }
        args
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        self.progress.on_event(event);
    }
}

/// Sizing for the [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Operations allowed to run at once. Further submissions wait in
    /// submission order.
    pub max_concurrent: NonZeroUsize,
}

impl Default for SchedulerOptions {
    /// One slot per available CPU.
    fn default() -> Self {
        let parallelism = std::thread::available_parallelism();
        Self {
            max_concurrent: parallelism.unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl SchedulerOptions {
    /// Allow `count` concurrent operations. Zero is clamped to one.
    pub fn with_max_concurrent(count: usize) -> Self {
        Self {
            max_concurrent: NonZeroUsize::new(count).unwrap_or(NonZeroUsize::MIN),
        }
    }
}
