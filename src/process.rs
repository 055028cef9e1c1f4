//! Engine process execution.
//!
//! [`Engine::spawn`] starts the engine with its stdout discarded and its
//! stderr captured. [`RunningProcess::next_line`] then yields the
//! diagnostic stream one line at a time, as it is written, and
//! [`RunningProcess::wait`] reports how the process ended. The stream is
//! finite and cannot be restarted.
//!
//! The engine redraws its status line with carriage returns, so both `\r`
//! and `\n` end a line here. A line that is not valid UTF-8 is reported as
//! [`DiagnosticLine::Undecodable`] and reading carries on.
//!
//! # Example
//!
//! ```no_run
//! use loudnorm::process::{DiagnosticLine, Engine};
//!
//! # async fn example() -> Result<(), loudnorm::NormalizeError> {
//! let mut process = Engine::new("ffmpeg").spawn(&["-version".to_string()])?;
//! while let Some(line) = process.next_line().await? {
//!     if let DiagnosticLine::Text(text) = line {
//!         println!("{text}");
//!     }
//! }
//! let status = process.wait().await?;
//! println!("{status:?}");
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::mem;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, Command};

use crate::configuration::RunOptions;
use crate::error::NormalizeError;
use crate::progress::{CancellationToken, Failure, ProgressEvent};

const READ_CHUNK_SIZE: usize = 4096;

/// Handle to the engine binary.
#[derive(Debug, Clone)]
pub struct Engine {
    program: PathBuf,
}

impl Engine {
    /// Use the binary at `program` (a bare name is resolved through `PATH`).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The configured program.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Start the engine with `args`.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::Launch`] if the process cannot be started
    /// (binary missing, not executable, ...). No line has been produced
    /// at that point.
    pub fn spawn(&self, args: &[String]) -> Result<RunningProcess, NormalizeError> {
        log::debug!("Spawning {} {}", self.program.display(), args.join(" "));

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| NormalizeError::Launch {
                program: self.program.display().to_string(),
                kind: e.kind(),
                reason: e.to_string(),
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| NormalizeError::Stream("stderr was not captured".to_string()))?;

        Ok(RunningProcess {
            child,
            stderr,
            splitter: LineSplitter::new(),
            pending: VecDeque::new(),
            eof: false,
            lines_read: 0,
            transcript: String::new(),
        })
    }
}

/// One line of engine diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticLine {
    /// A decoded line without its terminator or trailing whitespace.
    Text(String),
    /// A line that was not valid UTF-8.
    Undecodable {
        /// Lossy rendering, invalid sequences replaced by U+FFFD.
        lossy: String,
        /// [`NormalizeError::Decode`] describing the failure.
        error: NormalizeError,
    },
}

/// How the engine process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Exit status zero.
    Success,
    /// Non-zero exit status.
    Code(i32),
    /// Killed by a signal (number, where the platform reports one).
    Signal(Option<i32>),
}

impl ExitOutcome {
    /// Map anything but [`ExitOutcome::Success`] to an error.
    pub fn into_result(self) -> Result<(), NormalizeError> {
        match self {
            ExitOutcome::Success => Ok(()),
            ExitOutcome::Code(code) => Err(NormalizeError::NonZeroExit(code)),
            ExitOutcome::Signal(signal) => Err(NormalizeError::Terminated { signal }),
        }
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            ExitOutcome::Success
        } else if let Some(code) = status.code() {
            ExitOutcome::Code(code)
        } else {
            ExitOutcome::Signal(exit_signal(&status))
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Everything a finished engine run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    /// Exit status.
    pub status: ExitOutcome,
    /// Every diagnostic line, each followed by `\n`.
    pub transcript: String,
}

/// A started engine process whose diagnostics have not been fully read.
#[derive(Debug)]
pub struct RunningProcess {
    child: Child,
    stderr: ChildStderr,
    splitter: LineSplitter,
    pending: VecDeque<Vec<u8>>,
    eof: bool,
    lines_read: usize,
    transcript: String,
}

impl RunningProcess {
    /// OS process id, while the process is running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Read the next diagnostic line, waiting for the engine to write one.
    ///
    /// Returns `Ok(None)` once the engine has closed its stderr. Blank
    /// lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::Stream`] if reading the pipe fails.
    pub async fn next_line(&mut self) -> Result<Option<DiagnosticLine>, NormalizeError> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            while let Some(bytes) = self.pending.pop_front() {
                if let Some(line) = self.decode(bytes) {
                    return Ok(Some(line));
                }
            }
            if self.eof {
                return Ok(None);
            }

            let read = self
                .stderr
                .read(&mut chunk)
                .await
                .map_err(|e| NormalizeError::Stream(e.to_string()))?;

            if read == 0 {
                self.eof = true;
                self.pending.extend(self.splitter.finish());
            } else {
                self.pending.extend(self.splitter.push(&chunk[..read]));
            }
        }
    }

    /// Read any remaining diagnostics into the transcript, then wait for
    /// the process to exit.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::Stream`] if reading or waiting fails.
    pub async fn wait(&mut self) -> Result<ExitOutcome, NormalizeError> {
        while self.next_line().await?.is_some() {}

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| NormalizeError::Stream(e.to_string()))?;

        log::debug!("Engine exited with {status}");
        Ok(ExitOutcome::from(status))
    }

    /// Kill the process and reap it.
    pub async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            log::warn!("Failed to kill engine process: {e}");
        }
    }

    /// Lines read so far, each followed by `\n`.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Consume the handle, keeping the transcript.
    pub fn into_transcript(self) -> String {
        self.transcript
    }

    fn decode(&mut self, bytes: Vec<u8>) -> Option<DiagnosticLine> {
        let line = match String::from_utf8(bytes) {
            Ok(text) => {
                let text = text.trim_end();
                if text.is_empty() {
                    return None;
                }
                self.lines_read += 1;
                DiagnosticLine::Text(text.to_string())
            }
            Err(e) => {
                self.lines_read += 1;
                let reason = e.utf8_error().to_string();
                let lossy = String::from_utf8_lossy(e.as_bytes());
                let lossy = lossy.trim_end().to_string();
                DiagnosticLine::Undecodable {
                    lossy,
                    error: NormalizeError::Decode {
                        line: self.lines_read,
                        reason,
                    },
                }
            }
        };

        let text = match &line {
            DiagnosticLine::Text(text) => text,
            DiagnosticLine::Undecodable { lossy, .. } => lossy,
        };
        self.transcript.push_str(text);
        self.transcript.push('\n');
        Some(line)
    }
}

/// Splits a byte stream into lines on `\n` and `\r`.
///
/// Bytes are buffered until a terminator arrives, so a multi-byte character
/// split across two reads is reassembled intact. Empty lines are dropped.
///
/// # Example
///
/// ```
/// use loudnorm::process::LineSplitter;
///
/// let mut splitter = LineSplitter::new();
/// assert_eq!(splitter.push(b"size=1\rsize=2\rdo"), vec![b"size=1".to_vec(), b"size=2".to_vec()]);
/// assert_eq!(splitter.push(b"ne\n"), vec![b"done".to_vec()]);
/// assert_eq!(splitter.finish(), None);
/// ```
#[derive(Debug, Default)]
pub struct LineSplitter {
    partial: Vec<u8>,
}

impl LineSplitter {
    /// Create an empty splitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning every line they complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\n' || byte == b'\r' {
                if !self.partial.is_empty() {
                    lines.push(mem::take(&mut self.partial));
                }
            } else {
                self.partial.push(byte);
            }
        }
        lines
    }

    /// Flush an unterminated final line.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        (!self.partial.is_empty()).then(|| mem::take(&mut self.partial))
    }
}

/// Run `args` to completion under `options`, forwarding each line to the
/// progress callback as it arrives.
///
/// Cancellation is observed while waiting for output and while waiting for
/// exit; either way the process is killed and the result is
/// [`NormalizeError::Cancelled`]. A non-successful exit is not an error
/// here; callers decide what it means.
pub(crate) async fn run_engine(
    args: &[String],
    options: &RunOptions,
) -> Result<ProcessOutput, Failure> {
    if options.is_cancelled() {
        log::debug!("Cancelled before launch");
        return Err(Failure::new(NormalizeError::Cancelled));
    }

    let mut process = Engine::new(options.engine())
        .spawn(args)
        .map_err(Failure::new)?;
    let token = options.cancellation();

    loop {
        let Some(next) = until_cancelled(token, process.next_line()).await else {
            return Err(cancel(process).await);
        };

        match next {
            Ok(Some(DiagnosticLine::Text(line))) => options.emit(ProgressEvent::Line(line)),
            Ok(Some(DiagnosticLine::Undecodable { lossy, error })) => {
                log::warn!("{error}");
                options.emit(ProgressEvent::Degraded { line: lossy, error });
            }
            Ok(None) => break,
            Err(reason) => {
                process.kill().await;
                return Err(Failure::with_diagnostics(reason, process.into_transcript()));
            }
        }
    }

    let Some(status) = until_cancelled(token, process.wait()).await else {
        return Err(cancel(process).await);
    };
    let status = match status {
        Ok(status) => status,
        Err(reason) => {
            return Err(Failure::with_diagnostics(reason, process.into_transcript()));
        }
    };

    // A cancel that raced with a clean exit still counts as a cancel.
    if options.is_cancelled() {
        let transcript = process.into_transcript();
        return Err(Failure::with_diagnostics(NormalizeError::Cancelled, transcript));
    }

    Ok(ProcessOutput {
        status,
        transcript: process.into_transcript(),
    })
}

/// Drive `future` unless `token` fires first, in which case `None`.
async fn until_cancelled<F: Future>(
    token: Option<&CancellationToken>,
    future: F,
) -> Option<F::Output> {
    match token {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => None,
            output = future => Some(output),
        },
        None => Some(future.await),
    }
}

async fn cancel(mut process: RunningProcess) -> Failure {
    log::info!("Cancelling engine process {:?}", process.id());
    process.kill().await;
    Failure::with_diagnostics(NormalizeError::Cancelled, process.into_transcript())
}
