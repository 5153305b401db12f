//! Outcome notifications handed to the presentation layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// One-shot message describing how a submit attempt ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    /// Submit attempt this notification reports on
    pub attempt: Uuid,
    pub emitted_at: DateTime<Utc>,
}

/// Wording for the two notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationText {
    pub success_title: String,
    pub success_description: String,
    pub error_title: String,
    pub error_description: String,
}

impl Default for NotificationText {
    fn default() -> Self {
        Self {
            success_title: "Thank you for your feedback".to_string(),
            success_description: "Your cancellation reason has been sent.".to_string(),
            error_title: "Something went wrong".to_string(),
            error_description: "We could not send your answers. Please try again.".to_string(),
        }
    }
}

impl NotificationText {
    pub fn build(&self, kind: NotificationKind, attempt: Uuid) -> Notification {
        let (title, description) = match kind {
            NotificationKind::Success => (&self.success_title, &self.success_description),
            NotificationKind::Error => (&self.error_title, &self.error_description),
        };
        Notification {
            kind,
            title: title.clone(),
            description: description.clone(),
            attempt,
            emitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_picks_wording_by_kind() {
        let text = NotificationText::default();
        let attempt = Uuid::new_v4();

        let ok = text.build(NotificationKind::Success, attempt);
        assert_eq!(ok.title, text.success_title);
        assert_eq!(ok.description, text.success_description);
        assert_eq!(ok.attempt, attempt);

        let failed = text.build(NotificationKind::Error, attempt);
        assert_eq!(failed.kind, NotificationKind::Error);
        assert_eq!(failed.title, text.error_title);
    }

    #[test]
    fn test_partial_text_falls_back_to_defaults() {
        let json = r#"{"success_title": "ありがとうございました"}"#;
        let parsed: NotificationText = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.success_title, "ありがとうございました");
        assert_eq!(parsed.error_title, NotificationText::default().error_title);
    }
}
