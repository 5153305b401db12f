//! Submission: the pipeline and the collaborators it talks to

mod client;
mod notification;
mod pipeline;
mod traits;

pub use client::{ChannelNotifier, DelayedSubmitter, TracingNotifier, DEFAULT_SUBMIT_DELAY};
pub use notification::{Notification, NotificationKind, NotificationText};
pub use pipeline::{InFlightSubmission, SubmissionPipeline, SubmitOutcome, SubmitRejection};
pub use traits::{Notifier, ReasonSubmitter};

#[cfg(test)]
pub use traits::{MockNotifier, MockReasonSubmitter};
