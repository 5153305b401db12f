//! Configuration handling for the survey

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::state::FieldLimits;
use crate::submit::{NotificationText, DEFAULT_SUBMIT_DELAY};

/// Environment variable overriding the stand-in submit delay
pub const SUBMIT_DELAY_ENV: &str = "CANCEL_SURVEY_SUBMIT_DELAY_MS";

/// User configuration for the survey
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SurveyConfig {
    /// Per-field maximum character counts
    #[serde(default)]
    pub limits: FieldLimits,
    /// Notification wording
    #[serde(default)]
    pub notifications: NotificationText,
    /// Latency of the stand-in submitter in milliseconds
    pub submit_delay_ms: Option<u64>,
    /// Make the stand-in submitter reject every call
    pub fail_submissions: Option<bool>,
}

impl SurveyConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "cancel-survey", "cancel-survey")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: SurveyConfig = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(self)?;
            fs::write(&path, content)?;
        }
        Ok(())
    }

    /// Stand-in submit delay, honoring the environment override
    pub fn submit_delay(&self) -> Duration {
        let from_env = std::env::var(SUBMIT_DELAY_ENV)
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok());
        Self::resolve_delay(from_env, self.submit_delay_ms)
    }

    fn resolve_delay(from_env: Option<u64>, configured: Option<u64>) -> Duration {
        from_env
            .or(configured)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SUBMIT_DELAY)
    }

    pub fn fail_submissions(&self) -> bool {
        self.fail_submissions.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = SurveyConfig::default();
        assert_eq!(config.limits, FieldLimits::default());
        assert_eq!(config.limits.family_details, 50);
        assert_eq!(config.limits.other_details, 200);
        assert!(config.submit_delay_ms.is_none());
        assert!(!config.fail_submissions());
    }

    #[test]
    fn test_serialization() {
        let config = SurveyConfig {
            limits: FieldLimits {
                comments: 100,
                ..Default::default()
            },
            notifications: NotificationText {
                success_title: "送信しました".to_string(),
                ..Default::default()
            },
            submit_delay_ms: Some(250),
            fail_submissions: Some(true),
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: SurveyConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_deserialize_from_empty_json() {
        let parsed: SurveyConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, SurveyConfig::default());
    }

    #[test]
    fn test_partial_limits_keep_other_defaults() {
        let json = r#"{"limits": {"family_details": 30}}"#;
        let parsed: SurveyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.limits.family_details, 30);
        assert_eq!(parsed.limits.improvement, 200);
    }

    #[test]
    fn test_keys_are_snake_case_throughout() {
        let json = serde_json::to_value(SurveyConfig::default()).unwrap();
        assert!(json["limits"].get("family_details").is_some());
        assert!(json["limits"].get("familyDetails").is_none());
        assert!(json["notifications"].get("success_title").is_some());
        assert!(json.get("submit_delay_ms").is_some());
    }

    #[test]
    fn test_deserialize_with_extra_fields() {
        // Should ignore unknown fields
        let json = r#"{"submit_delay_ms": 5, "unknown_field": "value"}"#;
        let parsed: SurveyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.submit_delay_ms, Some(5));
    }

    #[test]
    fn test_resolve_delay_precedence() {
        assert_eq!(
            SurveyConfig::resolve_delay(Some(10), Some(20)),
            Duration::from_millis(10)
        );
        assert_eq!(
            SurveyConfig::resolve_delay(None, Some(20)),
            Duration::from_millis(20)
        );
        assert_eq!(SurveyConfig::resolve_delay(None, None), DEFAULT_SUBMIT_DELAY);
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("cancel-survey-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, r#"{"fail_submissions": true}"#).unwrap();

        let config = SurveyConfig::load_from(&path).unwrap();
        assert!(config.fail_submissions());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_from_missing_file_is_error() {
        let path = std::env::temp_dir().join("cancel-survey-does-not-exist.json");
        assert!(SurveyConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_load_returns_default_when_no_file() {
        // Load should return default config when file doesn't exist
        let result = SurveyConfig::load();
        assert!(result.is_ok());
    }
}
