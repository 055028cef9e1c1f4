//! Background execution of analysis and normalization runs.
//!
//! [`Scheduler::submit`] returns immediately with a [`TaskHandle`]; the run
//! itself happens on the Tokio runtime, at most
//! [`SchedulerOptions::max_concurrent`] at a time, admitted in submission
//! order. The handle is a [`Stream`] of that run's [`ProgressEvent`]s:
//! every diagnostic line in the order the engine wrote it, then exactly one
//! [`ProgressEvent::Finished`]. Events are never dropped and never mixed
//! between submissions.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//!
//! use loudnorm::{AnalysisRequest, ProgressEvent, RunOptions, Scheduler, SchedulerOptions};
//!
//! # async fn example() {
//! let scheduler = Scheduler::new(RunOptions::new(), SchedulerOptions::default());
//! let mut first = scheduler.submit(AnalysisRequest::new("a.mp4"));
//! let second = scheduler.submit(AnalysisRequest::new("b.mp4"));
//!
//! while let Some(event) = first.next().await {
//!     match event {
//!         ProgressEvent::Line(line) => println!("[a] {line}"),
//!         ProgressEvent::Degraded { line, .. } => println!("[a] (?) {line}"),
//!         ProgressEvent::Finished(result) => println!("[a] done: {result:?}"),
//!     }
//! }
//! let second_result = second.wait().await;
//! # }
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_stream::Stream;

use crate::analysis::analyze;
use crate::configuration::{RunOptions, SchedulerOptions};
use crate::error::NormalizeError;
use crate::normalization::normalize;
use crate::progress::{
    CancellationToken, Completion, Failure, OperationType, ProgressCallback, ProgressEvent,
};
use crate::request::RunRequest;

/// Identifier of one submission, unique per [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "task-{}", self.0)
    }
}

/// Bounded worker pool for engine runs.
///
/// Submissions share nothing but the pool: each gets its own engine
/// process, its own event channel and its own cancellation token.
#[derive(Debug)]
pub struct Scheduler {
    runtime: Handle,
    permits: Arc<Semaphore>,
    capacity: usize,
    options: RunOptions,
    next_id: AtomicU64,
}

impl Scheduler {
    /// Create a scheduler whose runs use `options` (engine path, log
    /// level, overwrite). The progress callback and cancellation token in
    /// `options` are replaced per submission by the handle's channel and
    /// token.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime. Once created, the
    /// scheduler accepts submissions from any thread.
    pub fn new(options: RunOptions, scheduler_options: SchedulerOptions) -> Self {
        Self::with_runtime(Handle::current(), options, scheduler_options)
    }

    /// Create a scheduler that spawns onto `runtime`.
    pub fn with_runtime(
        runtime: Handle,
        options: RunOptions,
        scheduler_options: SchedulerOptions,
    ) -> Self {
        let capacity = scheduler_options.max_concurrent.get();
        Self {
            runtime,
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            options,
            next_id: AtomicU64::new(1),
        }
    }

    /// Queue a run and return its handle without waiting.
    pub fn submit(&self, request: impl Into<RunRequest>) -> TaskHandle {
        let request = request.into();
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let operation = request.operation();
        let token = CancellationToken::new();
        let (sender, receiver) = mpsc::unbounded_channel();

        let options = self
            .options
            .clone()
            .with_cancellation(token.clone())
            .with_progress(Arc::new(ChannelProgress { sender }));
        let permits = Arc::clone(&self.permits);
        let task_token = token.clone();

        log::debug!("Submitted {id} ({operation})");

        let task = self.runtime.spawn(async move {
            let permit = tokio::select! {
                biased;
                _ = task_token.cancelled() => None,
                permit = permits.acquire_owned() => permit.ok(),
            };
            let Some(_permit) = permit else {
                log::debug!("{id} cancelled before launch");
                let failure = Failure::new(NormalizeError::Cancelled);
                options.emit(ProgressEvent::Finished(Err(failure)));
                return;
            };

            log::debug!("{id} admitted");
            match &request {
                RunRequest::Analysis(analysis) => {
                    let _ = analyze(analysis, &options).await;
                }
                RunRequest::Normalization(normalization) => {
                    let _ = normalize(normalization, &options).await;
                }
            }
        });

        TaskHandle {
            id,
            operation,
            receiver,
            token,
            task,
            finished: false,
        }
    }

    /// Runs currently executing (not waiting for admission).
    pub fn running(&self) -> usize {
        let available = self.permits.available_permits();
        self.capacity.saturating_sub(available)
    }

    /// Maximum number of runs executing at once.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Forwards events into a submission's channel.
struct ChannelProgress {
    sender: UnboundedSender<ProgressEvent>,
}

impl ProgressCallback for ChannelProgress {
    fn on_event(&self, event: ProgressEvent) {
        // The receiver may have been dropped; the run still completes.
        let _ = self.sender.send(event);
    }
}

/// Observer of one submitted run.
///
/// Implements [`Stream`], yielding events until (and including) the
/// terminal [`ProgressEvent::Finished`]. Dropping the handle does not stop
/// the run; call [`cancel`](TaskHandle::cancel) for that.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    operation: OperationType,
    receiver: UnboundedReceiver<ProgressEvent>,
    token: CancellationToken,
    task: JoinHandle<()>,
    finished: bool,
}

impl TaskHandle {
    /// This submission's identifier.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Which operation this submission runs.
    pub fn operation(&self) -> OperationType {
        self.operation
    }

    /// Stop the run. A running engine is killed; a queued run never
    /// starts. The terminal event is then [`NormalizeError::Cancelled`].
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// A token that cancels this run when fired.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Whether the worker task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the next event; `None` after the terminal event.
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        if self.finished {
            return None;
        }
        let event = self.receiver.recv().await;
        self.finished = event.as_ref().is_none_or(ProgressEvent::is_terminal);
        event
    }

    /// Discard remaining line events and return the terminal result.
    pub async fn wait(mut self) -> Result<Completion, Failure> {
        while let Some(event) = self.next_event().await {
            if let ProgressEvent::Finished(result) = event {
                return result;
            }
        }
        // The worker ended without reporting, e.g. the runtime shut down.
        Err(Failure::new(NormalizeError::Cancelled))
    }
}

impl Stream for TaskHandle {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        let polled = self.receiver.poll_recv(cx);
        if let Poll::Ready(event) = &polled {
            self.finished = event.as_ref().is_none_or(ProgressEvent::is_terminal);
        }
        polled
    }
}
