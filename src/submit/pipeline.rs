//! Submission pipeline
//!
//! Owns the submission state machine and the one external interaction. A
//! submit is split in two: `begin` runs the guard, validation and the
//! transition to `Submitting` synchronously; the returned
//! `InFlightSubmission` performs the collaborator call. The in-flight handle
//! does not borrow the form, so edits keep flowing while it is awaited. A
//! handle dropped before it settles fails the attempt, so the state never
//! stays at `Submitting` without an outstanding call.

use std::sync::Arc;

use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use super::notification::{NotificationKind, NotificationText};
use super::traits::{Notifier, ReasonSubmitter};
use crate::state::{
    FormValues, SubmissionEvent, SubmissionState, SubmissionStatus, ValidationErrors,
    ValidationSchema,
};

/// Why a submit never reached the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRejection {
    /// Another attempt is in flight, or the form was already submitted
    #[error("submit ignored while {0}")]
    Busy(SubmissionState),

    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
}

/// End result of `SubmissionPipeline::submit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Guard tripped; nothing happened
    Ignored(SubmissionState),
    /// Validation failed; the state stayed idle
    Invalid(ValidationErrors),
    Submitted,
    Failed,
}

impl From<SubmitRejection> for SubmitOutcome {
    fn from(rejection: SubmitRejection) -> Self {
        match rejection {
            SubmitRejection::Busy(state) => SubmitOutcome::Ignored(state),
            SubmitRejection::Invalid(errors) => SubmitOutcome::Invalid(errors),
        }
    }
}

#[derive(Clone)]
pub struct SubmissionPipeline {
    schema: ValidationSchema,
    status: SubmissionStatus,
    submitter: Arc<dyn ReasonSubmitter>,
    notifier: Arc<dyn Notifier>,
    text: Arc<NotificationText>,
}

impl std::fmt::Debug for SubmissionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionPipeline")
            .field("schema", &self.schema)
            .field("state", &self.status.current())
            .finish_non_exhaustive()
    }
}

impl SubmissionPipeline {
    pub fn new(
        schema: ValidationSchema,
        status: SubmissionStatus,
        submitter: Arc<dyn ReasonSubmitter>,
        notifier: Arc<dyn Notifier>,
        text: NotificationText,
    ) -> Self {
        Self {
            schema,
            status,
            submitter,
            notifier,
            text: Arc::new(text),
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.status.current()
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    /// Guard, validate and move to `Submitting`.
    ///
    /// `values` is the payload as captured at submit time; later edits do not
    /// reach the collaborator.
    pub fn begin(&self, values: FormValues) -> Result<InFlightSubmission, SubmitRejection> {
        let state = self.status.current();
        if !matches!(state, SubmissionState::Idle | SubmissionState::Error) {
            tracing::debug!(%state, "submit ignored");
            return Err(SubmitRejection::Busy(state));
        }

        // A retry leaves `Error` through `Idle`, even when validation fails
        self.status.apply(SubmissionEvent::Resume);
        if let Err(errors) = self.schema.validate(&values) {
            return Err(SubmitRejection::Invalid(errors));
        }

        if self.status.apply(SubmissionEvent::Begin).is_none() {
            let state = self.status.current();
            tracing::debug!(%state, "submit lost the race to another attempt");
            return Err(SubmitRejection::Busy(state));
        }

        let attempt = Uuid::new_v4();
        tracing::info!(%attempt, reason = ?values.reason, "submit started");
        Ok(InFlightSubmission {
            attempt,
            values,
            status: self.status.clone(),
            submitter: Arc::clone(&self.submitter),
            notifier: Arc::clone(&self.notifier),
            text: Arc::clone(&self.text),
            settled: false,
        })
    }

    /// Run a whole attempt and wait for its outcome
    pub async fn submit(&self, values: FormValues) -> SubmitOutcome {
        match self.begin(values) {
            Ok(in_flight) => in_flight.complete().await,
            Err(rejection) => rejection.into(),
        }
    }

    /// Move from `Submitted` back to `Idle`. Only the state changes; clearing
    /// the values is up to the owner of the form. Returns `false` in any other
    /// state.
    pub fn reset(&self) -> bool {
        self.status.apply(SubmissionEvent::Reset).is_some()
    }
}

/// A submit that has passed validation and awaits the collaborator
#[must_use = "the collaborator is only called when the submission is completed"]
pub struct InFlightSubmission {
    attempt: Uuid,
    values: FormValues,
    status: SubmissionStatus,
    submitter: Arc<dyn ReasonSubmitter>,
    notifier: Arc<dyn Notifier>,
    text: Arc<NotificationText>,
    settled: bool,
}

impl std::fmt::Debug for InFlightSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightSubmission")
            .field("attempt", &self.attempt)
            .field("values", &self.values)
            .finish_non_exhaustive()
    }
}

impl InFlightSubmission {
    pub fn attempt(&self) -> Uuid {
        self.attempt
    }

    pub fn payload(&self) -> &FormValues {
        &self.values
    }

    /// Call the collaborator once and settle the state. There is no timeout:
    /// a collaborator that never answers leaves the state at `Submitting` for
    /// as long as this future is kept alive.
    pub async fn complete(mut self) -> SubmitOutcome {
        let span = tracing::info_span!("submit_reason", attempt = %self.attempt);
        async move {
            let result = self.submitter.submit_reason(&self.values).await;
            let (event, kind, outcome) = match result {
                Ok(()) => (
                    SubmissionEvent::Succeed,
                    NotificationKind::Success,
                    SubmitOutcome::Submitted,
                ),
                Err(err) => {
                    tracing::warn!(error = %err, "submit failed");
                    (
                        SubmissionEvent::Fail,
                        NotificationKind::Error,
                        SubmitOutcome::Failed,
                    )
                }
            };
            self.settle(event, kind);
            outcome
        }
        .instrument(span)
        .await
    }

    fn settle(&mut self, event: SubmissionEvent, kind: NotificationKind) {
        self.settled = true;
        self.status.apply(event);
        self.notifier.notify(self.text.build(kind, self.attempt));
    }
}

impl Drop for InFlightSubmission {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::warn!(attempt = %self.attempt, "submit abandoned before it settled");
        self.settle(SubmissionEvent::Fail, NotificationKind::Error);
    }
}
