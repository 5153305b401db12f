//! Stand-in collaborators
//!
//! `DelayedSubmitter` takes the place of the real network call: it waits a
//! fixed delay and then resolves with a configured outcome. The notifiers
//! forward outcomes to the log or to a channel consumed by a front end.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::notification::{Notification, NotificationKind};
use super::traits::{Notifier, ReasonSubmitter};
use crate::state::FormValues;

/// Default latency of the stand-in submit call
pub const DEFAULT_SUBMIT_DELAY: Duration = Duration::from_millis(1000);

/// Submitter that sleeps for a fixed delay before resolving
#[derive(Debug)]
pub struct DelayedSubmitter {
    delay: Duration,
    fail: bool,
    calls: AtomicUsize,
}

impl DelayedSubmitter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Submitter whose calls are all rejected after the delay
    pub fn failing(delay: Duration) -> Self {
        Self {
            fail: true,
            ..Self::new(delay)
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of times `submit_reason` has been invoked
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for DelayedSubmitter {
    fn default() -> Self {
        Self::new(DEFAULT_SUBMIT_DELAY)
    }
}

#[async_trait]
impl ReasonSubmitter for DelayedSubmitter {
    async fn submit_reason(&self, values: &FormValues) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay_ms = self.delay.as_millis() as u64;
        tracing::debug!(call, delay_ms, "sending cancellation reason");
        tokio::time::sleep(self.delay).await;

        if self.fail {
            bail!("submission rejected for reason `{}`", reason_label(values));
        }
        tracing::info!(reason = reason_label(values), "cancellation reason accepted");
        Ok(())
    }
}

fn reason_label(values: &FormValues) -> &'static str {
    values.reason.map_or("unset", |r| r.as_str())
}

/// Notifier that writes outcomes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => tracing::info!(
                attempt = %notification.attempt,
                title = %notification.title,
                "{}",
                notification.description
            ),
            NotificationKind::Error => tracing::warn!(
                attempt = %notification.attempt,
                title = %notification.title,
                "{}",
                notification.description
            ),
        }
    }
}

/// Notifier that forwards outcomes over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("notification dropped, receiver is gone");
        }
    }
}
