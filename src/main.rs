//! Cancel Survey driver
//!
//! Reads a set of answers as JSON (from the file named by the first argument,
//! or from stdin), replays them into a form session field by field, submits
//! through the stand-in submitter and prints the outcome as JSON.

use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use cancel_survey::submit::{ChannelNotifier, DelayedSubmitter, TracingNotifier};
use cancel_survey::{
    FieldName, FormSession, FormValues, Notification, Notifier, SubmitOutcome, SurveyConfig,
};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Fans a notification out to the log and to the printed report
struct ReportNotifier {
    log: TracingNotifier,
    channel: ChannelNotifier,
}

impl Notifier for ReportNotifier {
    fn notify(&self, notification: Notification) {
        self.log.notify(notification.clone());
        self.channel.notify(notification);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cancel_survey=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = SurveyConfig::load()?;
    let answers = read_answers()?;

    let submitter = if config.fail_submissions() {
        DelayedSubmitter::failing(config.submit_delay())
    } else {
        DelayedSubmitter::new(config.submit_delay())
    };
    let (channel, mut notifications) = ChannelNotifier::channel();
    let notifier = ReportNotifier {
        log: TracingNotifier,
        channel,
    };
    let mut session = FormSession::new(&config, Arc::new(submitter), Arc::new(notifier));

    for field in FieldName::ALL {
        session.set_field(field, answers.get(field))?;
    }

    let outcome = session.submit_and_wait().await;
    let notification = notifications.try_recv().ok();

    let errors = match &outcome {
        SubmitOutcome::Invalid(errors) => errors
            .paths()
            .into_iter()
            .map(|(path, message)| (path.to_string(), json!(message)))
            .collect(),
        _ => serde_json::Map::new(),
    };
    let report = json!({
        "state": session.state(),
        "values": session.form().values(),
        "errors": errors,
        "notification": notification,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !matches!(outcome, SubmitOutcome::Submitted) {
        std::process::exit(1);
    }
    Ok(())
}

fn read_answers() -> Result<FormValues> {
    let content = match std::env::args().nth(1) {
        Some(path) => {
            std::fs::read_to_string(&path).with_context(|| format!("Failed to read {path}"))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read answers from stdin")?;
            buf
        }
    };
    serde_json::from_str(&content).context("Answers are not a valid questionnaire document")
}
