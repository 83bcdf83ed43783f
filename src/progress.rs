//! Progress reporting and cancellation contract for a single planning
//! request (spec §5/§6.2). The transport (NDJSON over HTTP, a socket, a
//! test harness) is out of scope; this module only defines the channel
//! message shape and the producer-side reporter, in the same
//! single-producer/single-consumer `tokio::sync::mpsc` style the rest of
//! this codebase uses for its event channel (`agent_controller::Event` /
//! `web_api_server::background_task`).

use crate::models::PlannerResult as PlanResult;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Phase transitions are strictly ordered per spec §5:
/// `init -> candidates -> candidate* -> refinement -> finalize`, with
/// `fallback` substituting for `refinement`/`finalize` when the MILP
/// pathway gives up on every candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Init,
    Candidates,
    Candidate,
    Refinement,
    Finalize,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPayload {
    pub phase: Phase,
    pub message: String,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_ms: Option<u64>,
}

/// One line of the NDJSON stream described in spec §6.2. `result`/`error`
/// are each sent at most once, and always as the last message before the
/// channel closes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlanMessage {
    Progress { progress: ProgressPayload },
    Result { data: PlanResult },
    Error { error: String, #[serde(skip_serializing_if = "Option::is_none")] details: Option<String> },
}

/// Consumer-side handle to request cancellation (spec §5 "client
/// disconnect"). Cloneable so both the transport layer and, in tests, the
/// test body itself can trigger it.
#[derive(Clone)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Producer-side reporter passed down into the planner. Honors
/// cancellation at every emission point by silently dropping the message
/// instead of sending it — the planner keeps running to completion
/// internally (spec: "partial solver invocations may continue to
/// completion but their results must be discarded"), it just stops telling
/// anyone about it.
pub struct ProgressReporter {
    tx: mpsc::Sender<PlanMessage>,
    start: Instant,
    cancelled: Arc<AtomicBool>,
}

impl ProgressReporter {
    pub fn new(tx: mpsc::Sender<PlanMessage>) -> (Self, CancelHandle) {
        let cancelled = Arc::new(AtomicBool::new(false));
        let handle = CancelHandle(cancelled.clone());
        (
            ProgressReporter {
                tx,
                start: Instant::now(),
                cancelled,
            },
            handle,
        )
    }

    /// A reporter with nobody listening, for the non-streaming entrypoint:
    /// `emit` becomes a harmless no-op since the receiver is dropped
    /// immediately.
    pub fn null() -> Self {
        let (tx, _rx) = mpsc::channel(1);
        ProgressReporter {
            tx,
            start: Instant::now(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub async fn emit(&self, phase: Phase, message: impl Into<String>, completed: Option<u32>, total: Option<u32>) {
        if self.is_cancelled() {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let eta_ms = match (completed, total) {
            (Some(c), Some(t)) if c > 0 && t > c => {
                Some(((elapsed_ms as f64 / c as f64) * (t - c) as f64).round() as u64)
            }
            _ => None,
        };
        let payload = ProgressPayload {
            phase,
            message: message.into(),
            elapsed_ms,
            completed,
            total,
            eta_ms,
        };
        let _ = self.tx.send(PlanMessage::Progress { progress: payload }).await;
    }

    /// Sends the terminal message, unless the request was cancelled — a
    /// cancelled request produces neither `result` nor `error` (spec §5/§7).
    pub async fn finish(&self, outcome: Result<PlanResult, crate::error::PlannerError>) {
        if self.is_cancelled() {
            return;
        }
        let message = match outcome {
            Ok(data) => PlanMessage::Result { data },
            Err(err) => PlanMessage::Error {
                error: err.to_string(),
                details: None,
            },
        };
        let _ = self.tx.send(message).await;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_cancelled_reporter_drops_progress_and_result() {
        let (tx, mut rx) = mpsc::channel(8);
        let (reporter, handle) = ProgressReporter::new(tx);
        handle.cancel();
        reporter.emit(Phase::Init, "starting", None, None).await;
        reporter
            .finish(Err(crate::error::PlannerError::Planning("x".into())))
            .await;
        drop(reporter);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_uncancelled_reporter_emits_progress_then_result() {
        let (tx, mut rx) = mpsc::channel(8);
        let (reporter, _handle) = ProgressReporter::new(tx);
        reporter.emit(Phase::Init, "starting", None, None).await;
        reporter
            .finish(Err(crate::error::PlannerError::Planning("boom".into())))
            .await;
        drop(reporter);
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, PlanMessage::Progress { .. }));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second, PlanMessage::Error { .. }));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_eta_only_when_progress_known() {
        let (tx, mut rx) = mpsc::channel(8);
        let (reporter, _handle) = ProgressReporter::new(tx);
        reporter
            .emit(Phase::Candidate, "solving candidate 2", Some(2), Some(4))
            .await;
        drop(reporter);
        let msg = rx.recv().await.unwrap();
        let PlanMessage::Progress { progress } = msg else {
            panic!("expected progress message");
        };
        assert!(progress.eta_ms.is_some());
    }
}
