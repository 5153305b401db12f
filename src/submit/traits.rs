//! Trait abstraction for the submit and notification collaborators to enable
//! mocking in tests

use anyhow::Result;
use async_trait::async_trait;

use super::notification::Notification;
use crate::state::FormValues;

/// Receives validated answers. Latency and failure modes are opaque to the
/// pipeline, which calls it once per validated submit.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasonSubmitter: Send + Sync {
    /// Deliver the answers
    async fn submit_reason(&self, values: &FormValues) -> Result<()>;
}

/// Displays submission outcomes. Purely observational.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
