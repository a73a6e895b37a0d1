//! Diagnosis session lifecycle.
//!
//! ```text
//!            submit(text)                 completion(seq == outstanding)
//!   Idle ───────────────▶ Processing ─────────────────────────────▶ Succeeded
//!    ▲                      │   ▲                                      │
//!    │ dismiss_error        │   └──────────── submit(text) ────────────┤
//!    │                      ▼                                          │
//!   Failed ◀── transport / decode / mapping error, deadline ───────────┘
//! ```
//!
//! The controller is the only writer of session state. Network calls run on
//! spawned tasks and report back through a channel that is drained once per
//! frame by [`SessionController::process_completions`]; every completion
//! carries the [`RequestSeq`] it was issued with, and only the outstanding one
//! may commit a transition.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use hwdiag_client::{ClientError, DiagnosisBackend, UpstreamPayload, mapper};
use hwdiag_types::{
    DiagnosticResult, ErrorInfo, FailureKind, NonEmptyString, Phase, RequestSeq,
    sanitize_display_text,
};

/// Stage text shown while a request is outstanding.
pub const PROCESSING_STAGE: &str = "Neural Layer: Analyzing input...";

const COMPLETION_CHANNEL_CAPACITY: usize = 16;
const MAX_COMPLETIONS_PER_TICK: usize = 8;
const MAX_ERROR_DETAIL_CHARS: usize = 240;
/// Upper bound on the per-request deadline, so `Instant` arithmetic cannot overflow.
const MAX_DEADLINE: Duration = Duration::from_secs(24 * 60 * 60);

/// Result of a [`SessionController::submit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Started(RequestSeq),
    /// Empty or whitespace-only description.
    IgnoredBlank,
    /// A request is already outstanding.
    IgnoredBusy,
}

#[derive(Debug)]
enum SessionState {
    Idle,
    Processing { seq: RequestSeq, deadline: Instant },
    Succeeded(DiagnosticResult),
    Failed(ErrorInfo),
}

#[derive(Debug)]
struct Completion {
    seq: RequestSeq,
    outcome: Result<UpstreamPayload, ClientError>,
}

/// Read-only, cloneable view of the current phase.
///
/// Each read is an atomic snapshot of the latest committed phase.
#[derive(Debug, Clone)]
pub struct PhaseSignal(watch::Receiver<Phase>);

impl PhaseSignal {
    #[must_use]
    pub fn current(&self) -> Phase {
        *self.0.borrow()
    }

    #[cfg(test)]
    pub(crate) fn channel(initial: Phase) -> (watch::Sender<Phase>, Self) {
        let (tx, rx) = watch::channel(initial);
        (tx, Self(rx))
    }
}

/// Borrowed snapshot of the session for the presentation layer.
#[derive(Debug, Clone, Copy)]
pub struct SessionSnapshot<'a> {
    pub phase: Phase,
    pub input_text: Option<&'a str>,
    pub result: Option<&'a DiagnosticResult>,
    pub error: Option<&'a ErrorInfo>,
}

pub struct SessionController {
    backend: Arc<dyn DiagnosisBackend>,
    state: SessionState,
    input_text: Option<NonEmptyString>,
    last_seq: RequestSeq,
    deadline: Duration,
    completions_tx: mpsc::Sender<Completion>,
    completions_rx: mpsc::Receiver<Completion>,
    phase_tx: watch::Sender<Phase>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("last_seq", &self.last_seq)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// `deadline` bounds how long the session stays in `Processing` for one
    /// request. The request itself is not cancelled when it expires; its late
    /// response is discarded as stale.
    #[must_use]
    pub fn new(backend: Arc<dyn DiagnosisBackend>, deadline: Duration) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel(COMPLETION_CHANNEL_CAPACITY);
        let (phase_tx, _) = watch::channel(Phase::Idle);
        Self {
            backend,
            state: SessionState::Idle,
            input_text: None,
            last_seq: RequestSeq::new(0),
            deadline: deadline.min(MAX_DEADLINE),
            completions_tx,
            completions_rx,
            phase_tx,
        }
    }

    /// Start a diagnosis for `text`. Returns immediately; the response is
    /// applied by a later [`process_completions`](Self::process_completions)
    /// or [`settle`](Self::settle).
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        if matches!(self.state, SessionState::Processing { .. }) {
            tracing::debug!("Ignoring submit while a diagnosis is in flight");
            return SubmitOutcome::IgnoredBusy;
        }
        let Ok(input) = NonEmptyString::new(text) else {
            return SubmitOutcome::IgnoredBlank;
        };

        let seq = self.last_seq.next();
        self.last_seq = seq;

        let request = self.backend.diagnose(input.as_str().to_string());
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let outcome = request.await;
            if tx.send(Completion { seq, outcome }).await.is_err() {
                tracing::debug!(%seq, "Session dropped before diagnosis completed");
            }
        });

        self.input_text = Some(input);
        self.transition(SessionState::Processing {
            seq,
            deadline: Instant::now() + self.deadline,
        });
        tracing::info!(%seq, "Diagnosis submitted");
        SubmitOutcome::Started(seq)
    }

    /// `Failed -> Idle`. No-op in every other phase.
    pub fn dismiss_error(&mut self) -> bool {
        if !matches!(self.state, SessionState::Failed(_)) {
            return false;
        }
        self.transition(SessionState::Idle);
        true
    }

    /// Apply any completed requests without blocking. Call once per frame.
    pub fn process_completions(&mut self) {
        for _ in 0..MAX_COMPLETIONS_PER_TICK {
            match self.completions_rx.try_recv() {
                Ok(completion) => self.apply_completion(completion),
                Err(mpsc::error::TryRecvError::Empty | mpsc::error::TryRecvError::Disconnected) => {
                    break;
                }
            }
        }
        self.expire_if_overdue(Instant::now());
    }

    /// Wait until the session leaves `Processing` and return the new phase.
    pub async fn settle(&mut self) -> Phase {
        while let SessionState::Processing { seq, deadline } = self.state {
            match tokio::time::timeout_at(deadline, self.completions_rx.recv()).await {
                Ok(Some(completion)) => self.apply_completion(completion),
                // We hold a sender, so the channel cannot close under us.
                Ok(None) => break,
                Err(_) => self.expire(seq),
            }
        }
        self.phase()
    }

    /// Wait for the next completion, stale or not, and apply it.
    pub async fn next_completion(&mut self) {
        if let Some(completion) = self.completions_rx.recv().await {
            self.apply_completion(completion);
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        match self.state {
            SessionState::Idle => Phase::Idle,
            SessionState::Processing { .. } => Phase::Processing,
            SessionState::Succeeded(_) => Phase::Succeeded,
            SessionState::Failed(_) => Phase::Failed,
        }
    }

    #[must_use]
    pub fn phase_signal(&self) -> PhaseSignal {
        PhaseSignal(self.phase_tx.subscribe())
    }

    /// Live [`PhaseSignal`]s, including clones.
    #[must_use]
    pub fn phase_subscribers(&self) -> usize {
        self.phase_tx.receiver_count()
    }

    #[must_use]
    pub fn result(&self) -> Option<&DiagnosticResult> {
        match &self.state {
            SessionState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&ErrorInfo> {
        match &self.state {
            SessionState::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Last submitted description.
    #[must_use]
    pub fn input_text(&self) -> Option<&str> {
        self.input_text.as_ref().map(NonEmptyString::as_str)
    }

    /// Token of the request that may still commit, if any.
    #[must_use]
    pub fn outstanding(&self) -> Option<RequestSeq> {
        match self.state {
            SessionState::Processing { seq, .. } => Some(seq),
            _ => None,
        }
    }

    #[must_use]
    pub fn processing_stage(&self) -> Option<&'static str> {
        self.phase().is_processing().then_some(PROCESSING_STAGE)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            phase: self.phase(),
            input_text: self.input_text(),
            result: self.result(),
            error: self.error(),
        }
    }

    fn apply_completion(&mut self, completion: Completion) {
        let Completion { seq, outcome } = completion;
        if self.outstanding() != Some(seq) {
            tracing::debug!(%seq, current = ?self.outstanding(), "Discarding stale diagnosis response");
            return;
        }

        let next = match outcome {
            Ok(payload) => match mapper::map(&payload) {
                Ok(result) => {
                    tracing::info!(
                        %seq,
                        diagnosis = result.diagnosis_name(),
                        severity = %result.severity(),
                        "Diagnosis succeeded"
                    );
                    SessionState::Succeeded(result)
                }
                Err(e) => {
                    tracing::warn!(%seq, %e, "Diagnosis payload could not be mapped");
                    SessionState::Failed(error_info(FailureKind::Mapping, &e.to_string()))
                }
            },
            Err(e) => {
                tracing::warn!(%seq, %e, "Diagnosis request failed");
                SessionState::Failed(error_info(e.failure_kind(), &e.to_string()))
            }
        };
        self.transition(next);
    }

    fn expire_if_overdue(&mut self, now: Instant) {
        if let SessionState::Processing { seq, deadline } = self.state
            && now >= deadline
        {
            self.expire(seq);
        }
    }

    fn expire(&mut self, seq: RequestSeq) {
        tracing::warn!(%seq, deadline = ?self.deadline, "Diagnosis timed out");
        self.transition(SessionState::Failed(error_info(
            FailureKind::Transport,
            "no response from the diagnosis engine",
        )));
    }

    fn transition(&mut self, next: SessionState) {
        self.state = next;
        let phase = self.phase();
        self.phase_tx.send_replace(phase);
    }
}

fn error_info(kind: FailureKind, detail: &str) -> ErrorInfo {
    let sanitized = sanitize_display_text(detail);
    let mut detail: String = sanitized
        .trim()
        .chars()
        .take(MAX_ERROR_DETAIL_CHARS)
        .collect();
    if sanitized.trim().chars().count() > MAX_ERROR_DETAIL_CHARS {
        detail.push_str("...");
    }
    ErrorInfo::new(kind, detail)
}
