//! Submission state machine

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

/// Where the current submit attempt stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Submitted,
    Error,
}

/// Inputs that drive `SubmissionState`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionEvent {
    /// A validated submit starts
    Begin,
    /// The collaborator accepted the payload
    Succeed,
    /// The collaborator failed or rejected the payload
    Fail,
    /// The user edited a field or retried after a failure
    Resume,
    /// The user asked to return to an empty form
    Reset,
}

impl SubmissionState {
    /// Next state for `event`, or `None` when the event does not apply
    pub fn transition(self, event: SubmissionEvent) -> Option<SubmissionState> {
        use SubmissionEvent as E;
        use SubmissionState as S;

        match (self, event) {
            (S::Idle, E::Begin) => Some(S::Submitting),
            (S::Submitting, E::Succeed) => Some(S::Submitted),
            (S::Submitting, E::Fail) => Some(S::Error),
            (S::Error, E::Resume) => Some(S::Idle),
            (S::Submitted, E::Reset) => Some(S::Idle),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Submitted => "submitted",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared handle to the session's submission state.
///
/// The controller and the pipeline hold clones of the same handle. Each
/// transition is a single check-and-set, so two submits racing for `Idle`
/// cannot both win.
#[derive(Debug, Clone)]
pub struct SubmissionStatus {
    tx: Arc<watch::Sender<SubmissionState>>,
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionStatus {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SubmissionState::Idle);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> SubmissionState {
        *self.tx.borrow()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.tx.subscribe()
    }

    /// Apply `event`. Returns the new state, or `None` if the event was
    /// ignored in the current state.
    pub fn apply(&self, event: SubmissionEvent) -> Option<SubmissionState> {
        let mut next = None;
        self.tx.send_if_modified(|state| {
            let from = *state;
            match from.transition(event) {
                Some(to) => {
                    tracing::info!(%from, %to, ?event, "submission state changed");
                    *state = to;
                    next = Some(to);
                    true
                }
                None => false,
            }
        });
        next
    }
}
