//! Progress events and cancellation token tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use loudnorm::{
    CancellationToken, Completion, Failure, NormalizeError, OperationType, ProgressCallback,
    ProgressEvent,
};

// ── CancellationToken ──────────────────────────────────────────────

#[test]
fn cancellation_token_default_not_cancelled() {
    assert!(!CancellationToken::new().is_cancelled());
    assert!(!CancellationToken::default().is_cancelled());
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn cancellation_token_cancel_is_idempotent() {
    let token = CancellationToken::new();
    token.cancel();
    token.cancel();
    assert!(token.is_cancelled());
}

#[tokio::test]
async fn cancelled_resolves_immediately_when_already_cancelled() {
    let token = CancellationToken::new();
    token.cancel();
    tokio::time::timeout(Duration::from_secs(1), token.cancelled())
        .await
        .expect("already-cancelled token should resolve");
}

#[tokio::test]
async fn cancelled_wakes_waiting_task() {
    let token = CancellationToken::new();
    let waiter = {
        let token = token.clone();
        tokio::spawn(async move { token.cancelled().await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    token.cancel();
    tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("waiter should wake on cancel")
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_wakes_every_waiting_clone() {
    let token = CancellationToken::new();
    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();
    for waiter in waiters {
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("every clone should observe the cancel")
            .unwrap();
    }
}

// ── Events ─────────────────────────────────────────────────────────

#[test]
fn only_finished_is_terminal() {
    assert!(!ProgressEvent::Line("size=N/A".to_string()).is_terminal());
    assert!(
        !ProgressEvent::Degraded {
            line: "\u{FFFD}".to_string(),
            error: NormalizeError::Decode {
                line: 1,
                reason: "invalid utf-8".to_string(),
            },
        }
        .is_terminal()
    );
    assert!(ProgressEvent::Finished(Ok(Completion::Normalized)).is_terminal());
    assert!(
        ProgressEvent::Finished(Err(Failure::new(NormalizeError::Cancelled))).is_terminal()
    );
}

#[test]
fn closures_are_progress_callbacks() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let callback: Arc<dyn ProgressCallback> = {
        let seen = Arc::clone(&seen);
        Arc::new(move |event: ProgressEvent| seen.lock().unwrap().push(event))
    };

    callback.on_event(ProgressEvent::Line("one".to_string()));
    callback.on_event(ProgressEvent::Line("two".to_string()));
    assert_eq!(
        *seen.lock().unwrap(),
        [
            ProgressEvent::Line("one".to_string()),
            ProgressEvent::Line("two".to_string()),
        ]
    );
}

#[test]
fn operation_type_display() {
    assert_eq!(
        OperationType::LoudnessAnalysis.to_string(),
        "loudness analysis"
    );
    assert_eq!(OperationType::Normalization.to_string(), "normalization");
}

// ── Failure ────────────────────────────────────────────────────────

#[test]
fn failure_displays_its_reason() {
    let failure = Failure::with_diagnostics(
        NormalizeError::NonZeroExit(1),
        "in.mp4: No such file or directory\n".to_string(),
    );
    assert_eq!(failure.to_string(), "Engine exited with status 1");
    assert!(failure.diagnostics.contains("No such file"));
    let bare = Failure::new(NormalizeError::Cancelled);
    assert!(bare.diagnostics.is_empty());
}
