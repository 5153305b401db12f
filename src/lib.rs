//! Cancel Survey - validation and submission core for a service
//! cancellation questionnaire
//!
//! Collects why a user is cancelling, enforces the reason-dependent
//! required fields and character limits, and drives a single submit attempt
//! through `idle → submitting → submitted | error`. Rendering is left to
//! the caller, which feeds input into a `FormSession` and listens for form
//! changes, state changes and outcome notifications.

pub mod app;
pub mod config;
pub mod error;
pub mod state;
pub mod submit;

pub use app::FormSession;
pub use config::SurveyConfig;
pub use error::FieldInputError;
pub use state::{
    FieldName, FieldValue, FormStateController, FormValues, Reason, SubmissionState,
    ValidationErrors, ValidationSchema,
};
pub use submit::{
    Notification, NotificationKind, Notifier, ReasonSubmitter, SubmissionPipeline, SubmitOutcome,
};
