//! # loudnorm
//!
//! Two-pass loudness normalization of the audio in a video file, leaving
//! the video stream bit-for-bit untouched.
//!
//! `loudnorm` drives an external `ffmpeg` binary through its `loudnorm`
//! filter: an analysis pass measures integrated loudness, true peak and
//! loudness range, and a normalization pass re-encodes the audio using
//! those measurements and your targets while stream-copying the video.
//! Both passes stream the engine's diagnostic output line by line, can be
//! cancelled (the engine process is killed), and can run concurrently on a
//! bounded worker pool.
//!
//! ## Quick Start
//!
//! ### Analyze, then normalize
//!
//! ```no_run
//! use loudnorm::{AnalysisRequest, NormalizationRequest, RunOptions};
//!
//! # async fn example() -> Result<(), loudnorm::Failure> {
//! let options = RunOptions::new();
//! let measurement = loudnorm::analyze(&AnalysisRequest::new("input.mp4"), &options).await?;
//!
//! let request = NormalizationRequest::new("input.mp4", "output.mp4", measurement);
//! loudnorm::normalize(&request, &options).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Run in the background with live progress
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//!
//! use loudnorm::{AnalysisRequest, ProgressEvent, RunOptions, Scheduler, SchedulerOptions};
//!
//! # async fn example() {
//! let scheduler = Scheduler::new(RunOptions::new(), SchedulerOptions::default());
//! let mut task = scheduler.submit(AnalysisRequest::new("input.mp4"));
//!
//! while let Some(event) = task.next().await {
//!     if let ProgressEvent::Line(line) = event {
//!         println!("{line}");
//!     }
//! }
//! # }
//! ```
//!
//! ## Requirements
//!
//! An `ffmpeg` binary with the `loudnorm` filter, on `PATH` or configured
//! through [`RunOptions::with_engine`].

pub mod analysis;
pub mod command;
pub mod configuration;
pub mod encoding;
pub mod error;
pub mod ffmpeg;
pub mod loudness;
pub mod normalization;
pub mod parser;
pub mod process;
pub mod progress;
pub mod request;
pub mod scheduler;

pub use analysis::analyze;
pub use configuration::{DEFAULT_ENGINE, RunOptions, SchedulerOptions};
pub use encoding::{AudioCodec, AudioEncoding};
pub use error::NormalizeError;
pub use ffmpeg::EngineLogLevel;
pub use loudness::{LoudnessMeasurement, LoudnessTargets};
pub use normalization::normalize;
pub use parser::{ParseError, extract_measurement};
pub use process::{DiagnosticLine, Engine, ExitOutcome, ProcessOutput, RunningProcess};
pub use progress::{
    CancellationToken, Completion, Failure, OperationType, ProgressCallback, ProgressEvent,
};
pub use request::{AnalysisRequest, NormalizationRequest, RunRequest};
pub use scheduler::{Scheduler, TaskHandle, TaskId};
