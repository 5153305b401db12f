//! Questionnaire session
//!
//! Ties one `FormStateController` and one `SubmissionPipeline` to a shared
//! submission state. This is the surface a front end drives.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::SurveyConfig;
use crate::error::FieldInputError;
use crate::state::{
    FieldName, FieldValue, FormStateController, SubmissionState, SubmissionStatus,
    ValidationSchema,
};
use crate::submit::{
    InFlightSubmission, Notifier, ReasonSubmitter, SubmissionPipeline, SubmitOutcome,
    SubmitRejection,
};

/// One active questionnaire
#[derive(Debug)]
pub struct FormSession {
    form: FormStateController,
    pipeline: SubmissionPipeline,
}

impl FormSession {
    pub fn new(
        config: &SurveyConfig,
        submitter: Arc<dyn ReasonSubmitter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let schema = ValidationSchema::new(config.limits);
        let status = SubmissionStatus::new();
        Self {
            form: FormStateController::new(schema, status.clone()),
            pipeline: SubmissionPipeline::new(
                schema,
                status,
                submitter,
                notifier,
                config.notifications.clone(),
            ),
        }
    }

    pub fn form(&self) -> &FormStateController {
        &self.form
    }

    /// Mutable access, e.g. to subscribe to form changes
    pub fn form_mut(&mut self) -> &mut FormStateController {
        &mut self.form
    }

    pub fn state(&self) -> SubmissionState {
        self.pipeline.state()
    }

    /// Observe submission state changes
    pub fn watch_state(&self) -> watch::Receiver<SubmissionState> {
        self.pipeline.status().subscribe()
    }

    pub fn set_field(
        &mut self,
        name: FieldName,
        value: impl Into<FieldValue>,
    ) -> Result<(), FieldInputError> {
        self.form.set_field(name, value)
    }

    /// Start a submit of the current values.
    ///
    /// Validation errors are surfaced on the form before being returned. The
    /// in-flight handle owns its payload, so the session stays editable while
    /// it is awaited.
    pub fn submit(&mut self) -> Result<InFlightSubmission, SubmitRejection> {
        let result = self.pipeline.begin(self.form.snapshot());
        if let Err(SubmitRejection::Invalid(errors)) = &result {
            self.form.surface_errors(errors.clone());
        }
        result
    }

    /// Submit and wait for the outcome
    pub async fn submit_and_wait(&mut self) -> SubmitOutcome {
        match self.submit() {
            Ok(in_flight) => in_flight.complete().await,
            Err(rejection) => rejection.into(),
        }
    }

    /// "Return to form" after a successful submit: clears every value.
    /// Does nothing unless the state is `Submitted`.
    pub fn return_to_form(&mut self) -> bool {
        if !self.pipeline.reset() {
            return false;
        }
        self.form.reset();
        tracing::info!("form reset after submission");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FormValues, Reason};
    use crate::submit::{MockReasonSubmitter, Notification, NotificationKind};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.seen.lock().unwrap().push(notification);
        }
    }

    fn session(submitter: MockReasonSubmitter) -> (FormSession, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let session = FormSession::new(
            &SurveyConfig::default(),
            Arc::new(submitter),
            notifier.clone(),
        );
        (session, notifier)
    }

    fn accepting() -> MockReasonSubmitter {
        let mut submitter = MockReasonSubmitter::new();
        submitter.expect_submit_reason().returning(|_| Ok(()));
        submitter
    }

    mod scenarios {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_family_reason_submits_successfully() {
            let (mut session, notifier) = session(accepting());
            session.set_field(FieldName::Reason, Reason::Family).unwrap();
            session.set_field(FieldName::FamilyDetails, "転居のため").unwrap();
            session.set_field(FieldName::Improvement, "").unwrap();
            session.set_field(FieldName::Comments, "").unwrap();
            assert!(session.form().is_valid());

            let in_flight = session.submit().unwrap();
            assert_eq!(session.state(), SubmissionState::Submitting);
            assert_eq!(in_flight.complete().await, SubmitOutcome::Submitted);
            assert_eq!(session.state(), SubmissionState::Submitted);

            let seen = notifier.seen.lock().unwrap();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].kind, NotificationKind::Success);
        }

        #[tokio::test]
        async fn test_other_reason_without_details_stays_idle() {
            let mut submitter = MockReasonSubmitter::new();
            submitter.expect_submit_reason().never();
            let (mut session, notifier) = session(submitter);
            session.set_field(FieldName::Reason, Reason::Other).unwrap();
            session.set_field(FieldName::OtherDetails, "").unwrap();

            let outcome = session.submit_and_wait().await;
            match outcome {
                SubmitOutcome::Invalid(errors) => {
                    assert!(errors.contains(FieldName::OtherDetails))
                }
                other => panic!("expected invalid, got {other:?}"),
            }
            assert_eq!(session.state(), SubmissionState::Idle);
            assert!(session
                .form()
                .displayed_errors()
                .contains_key(&FieldName::OtherDetails));
            assert!(notifier.seen.lock().unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_unset_reason_reports_reason() {
            let (mut session, _) = session(MockReasonSubmitter::new());
            let outcome = session.submit_and_wait().await;
            let SubmitOutcome::Invalid(errors) = outcome else {
                panic!("expected invalid outcome");
            };
            assert_eq!(
                errors.per_field().into_keys().collect::<Vec<_>>(),
                vec![FieldName::Reason]
            );
        }

        #[tokio::test]
        async fn test_rejection_then_edit_returns_to_idle_keeping_values() {
            let mut submitter = MockReasonSubmitter::new();
            submitter
                .expect_submit_reason()
                .times(1)
                .returning(|_| Err(anyhow::anyhow!("gateway timeout")));
            let (mut session, notifier) = session(submitter);
            session.set_field(FieldName::Reason, Reason::Other).unwrap();
            session.set_field(FieldName::OtherDetails, "too expensive").unwrap();

            assert_eq!(session.submit_and_wait().await, SubmitOutcome::Failed);
            assert_eq!(session.state(), SubmissionState::Error);
            assert_eq!(
                notifier.seen.lock().unwrap()[0].kind,
                NotificationKind::Error
            );

            session.set_field(FieldName::Comments, "please fix").unwrap();
            assert_eq!(session.state(), SubmissionState::Idle);
            assert_eq!(session.form().values().other_details, "too expensive");
            assert_eq!(session.form().values().reason, Some(Reason::Other));
        }
    }

    mod lifecycle {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_state_sequence_is_observable() {
            let (mut session, _) = session(accepting());
            let mut rx = session.watch_state();
            session.set_field(FieldName::Reason, Reason::Family).unwrap();
            session.set_field(FieldName::FamilyDetails, "介護").unwrap();
            assert!(!rx.has_changed().unwrap());

            let in_flight = session.submit().unwrap();
            assert!(rx.has_changed().unwrap());
            assert_eq!(*rx.borrow_and_update(), SubmissionState::Submitting);

            in_flight.complete().await;
            assert!(rx.has_changed().unwrap());
            assert_eq!(*rx.borrow_and_update(), SubmissionState::Submitted);
        }

        #[tokio::test]
        async fn test_edits_while_submitting_do_not_change_payload() {
            let mut submitter = MockReasonSubmitter::new();
            submitter
                .expect_submit_reason()
                .withf(|values| values.improvement.is_empty())
                .times(1)
                .returning(|_| Ok(()));
            let (mut session, _) = session(submitter);
            session.set_field(FieldName::Reason, Reason::Family).unwrap();
            session.set_field(FieldName::FamilyDetails, "介護").unwrap();

            let in_flight = session.submit().unwrap();
            session
                .set_field(FieldName::Improvement, "cheaper plans")
                .unwrap();
            assert_eq!(session.form().values().improvement, "cheaper plans");
            assert_eq!(session.state(), SubmissionState::Submitting);

            assert_eq!(in_flight.complete().await, SubmitOutcome::Submitted);
        }

        #[tokio::test]
        async fn test_double_submit_is_ignored() {
            let mut submitter = MockReasonSubmitter::new();
            submitter.expect_submit_reason().times(1).returning(|_| Ok(()));
            let (mut session, _) = session(submitter);
            session.set_field(FieldName::Reason, Reason::Family).unwrap();
            session.set_field(FieldName::FamilyDetails, "介護").unwrap();

            let first = session.submit().unwrap();
            assert!(matches!(
                session.submit(),
                Err(SubmitRejection::Busy(SubmissionState::Submitting))
            ));
            first.complete().await;
        }

        #[tokio::test]
        async fn test_dropped_submit_leaves_session_editable() {
            let mut submitter = MockReasonSubmitter::new();
            submitter.expect_submit_reason().times(1).returning(|_| Ok(()));
            let (mut session, notifier) = session(submitter);
            session.set_field(FieldName::Reason, Reason::Family).unwrap();
            session.set_field(FieldName::FamilyDetails, "介護").unwrap();

            drop(session.submit().unwrap());
            assert_eq!(session.state(), SubmissionState::Error);

            session.set_field(FieldName::Comments, "edit").unwrap();
            assert_eq!(session.state(), SubmissionState::Idle);
            assert_eq!(session.submit_and_wait().await, SubmitOutcome::Submitted);
            assert!(session.return_to_form());

            let kinds: Vec<_> = notifier
                .seen
                .lock()
                .unwrap()
                .iter()
                .map(|n| n.kind)
                .collect();
            assert_eq!(kinds, vec![NotificationKind::Error, NotificationKind::Success]);
        }

        #[tokio::test]
        async fn test_return_to_form_clears_after_success_only() {
            let (mut session, _) = session(accepting());
            assert!(!session.return_to_form());

            session.set_field(FieldName::Reason, Reason::Family).unwrap();
            session.set_field(FieldName::FamilyDetails, "介護").unwrap();
            session.submit_and_wait().await;

            assert!(matches!(
                session.submit(),
                Err(SubmitRejection::Busy(SubmissionState::Submitted))
            ));

            assert!(session.return_to_form());
            assert_eq!(session.state(), SubmissionState::Idle);
            assert_eq!(session.form().values(), &FormValues::default());
            assert!(session.form().displayed_errors().is_empty());
        }

        #[tokio::test]
        async fn test_stale_hidden_details_are_transmitted() {
            let mut submitter = MockReasonSubmitter::new();
            submitter
                .expect_submit_reason()
                .withf(|values| {
                    values.reason == Some(Reason::Other) && values.family_details == "引っ越し"
                })
                .times(1)
                .returning(|_| Ok(()));
            let (mut session, _) = session(submitter);
            session.set_field(FieldName::Reason, Reason::Family).unwrap();
            session.set_field(FieldName::FamilyDetails, "引っ越し").unwrap();
            session.set_field(FieldName::Reason, Reason::Other).unwrap();
            session.set_field(FieldName::OtherDetails, "price").unwrap();

            assert_eq!(session.submit_and_wait().await, SubmitOutcome::Submitted);
        }

        #[test]
        fn test_config_limits_reach_the_form() {
            let mut config = SurveyConfig::default();
            config.limits.family_details = 5;
            let session = FormSession::new(
                &config,
                Arc::new(MockReasonSubmitter::new()),
                Arc::new(RecordingNotifier::default()),
            );
            assert_eq!(session.form().input_cap(FieldName::FamilyDetails), Some(5));
        }
    }
}
