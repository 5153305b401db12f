//! Validation rules for the cancellation questionnaire
//!
//! The schema is a pure judgment of a `FormValues` candidate. Field-level
//! checks (shape and length) run first, then the required-when rules. Both
//! required-when rules are evaluated on every pass; each one only fires when
//! its own reason is selected.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::field::{FieldName, FormValues, Reason};

const MSG_REASON_REQUIRED: &str = "Please select a reason for cancelling";
const MSG_DETAILS_REQUIRED: &str = "Please tell us a little more";

/// Maximum character counts per text field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLimits {
    pub family_details: usize,
    pub other_details: usize,
    pub improvement: usize,
    pub comments: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            family_details: 50,
            other_details: 200,
            improvement: 200,
            comments: 200,
        }
    }
}

impl FieldLimits {
    pub fn get(&self, field: FieldName) -> Option<usize> {
        match field {
            FieldName::Reason => None,
            FieldName::FamilyDetails => Some(self.family_details),
            FieldName::OtherDetails => Some(self.other_details),
            FieldName::Improvement => Some(self.improvement),
            FieldName::Comments => Some(self.comments),
        }
    }
}

/// A field that becomes mandatory while a given reason is selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredWhen {
    pub field: FieldName,
    pub reason: Reason,
}

/// Every required-when rule of the form. Both the visibility derivation and
/// the validator read this table.
pub const REQUIRED_WHEN: [RequiredWhen; 2] = [
    RequiredWhen {
        field: FieldName::FamilyDetails,
        reason: Reason::Family,
    },
    RequiredWhen {
        field: FieldName::OtherDetails,
        reason: Reason::Other,
    },
];

/// Fields that are shown and mandatory for the given reason
pub fn required_fields(reason: Option<Reason>) -> BTreeSet<FieldName> {
    REQUIRED_WHEN
        .iter()
        .filter(|rule| Some(rule.reason) == reason)
        .map(|rule| rule.field)
        .collect()
}

/// What went wrong with a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Value longer than the configured maximum
    TooLong { max: usize, actual: usize },
    /// Value missing while the field is mandatory
    Required,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FieldName,
    pub kind: ViolationKind,
    pub message: String,
}

impl FieldError {
    fn too_long(field: FieldName, max: usize, actual: usize) -> Self {
        Self {
            field,
            kind: ViolationKind::TooLong { max, actual },
            message: format!("Please use {max} characters or fewer"),
        }
    }

    fn required(field: FieldName, message: &str) -> Self {
        Self {
            field,
            kind: ViolationKind::Required,
            message: message.to_string(),
        }
    }

    pub fn path(&self) -> &'static str {
        self.field.path()
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Ordered list of violations from one validation pass.
///
/// Field-level violations precede required-when violations, so the first
/// entry recorded for a field is the one to show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// The violation surfaced for `field`, if any
    pub fn first_for(&self, field: FieldName) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    pub fn message_for(&self, field: FieldName) -> Option<&str> {
        self.first_for(field).map(|e| e.message.as_str())
    }

    pub fn contains(&self, field: FieldName) -> bool {
        self.first_for(field).is_some()
    }

    /// One entry per failing field, first violation wins
    pub fn per_field(&self) -> BTreeMap<FieldName, &FieldError> {
        let mut map = BTreeMap::new();
        for error in &self.errors {
            map.entry(error.field).or_insert(error);
        }
        map
    }

    /// `(path, message)` pairs, one per failing field
    pub fn paths(&self) -> Vec<(&'static str, &str)> {
        self.per_field()
            .into_iter()
            .map(|(field, error)| (field.path(), error.message.as_str()))
            .collect()
    }

    fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Rule set for the questionnaire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSchema {
    limits: FieldLimits,
}

impl ValidationSchema {
    pub fn new(limits: FieldLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &FieldLimits {
        &self.limits
    }

    /// Advisory input cap for the presentation layer
    pub fn max_chars(&self, field: FieldName) -> Option<usize> {
        self.limits.get(field)
    }

    /// Judge a candidate. Returns the candidate untouched when it is valid.
    pub fn validate<'a>(
        &self,
        candidate: &'a FormValues,
    ) -> Result<&'a FormValues, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if candidate.reason.is_none() {
            errors.push(FieldError::required(FieldName::Reason, MSG_REASON_REQUIRED));
        }

        for field in FieldName::ALL {
            if let (Some(text), Some(max)) = (candidate.text(field), self.limits.get(field)) {
                let actual = text.chars().count();
                if actual > max {
                    errors.push(FieldError::too_long(field, max, actual));
                }
            }
        }

        for rule in REQUIRED_WHEN {
            let empty = candidate.text(rule.field).map_or(true, str::is_empty);
            if candidate.reason == Some(rule.reason) && empty {
                errors.push(FieldError::required(rule.field, MSG_DETAILS_REQUIRED));
            }
        }

        if errors.is_empty() {
            tracing::debug!("form values passed validation");
            Ok(candidate)
        } else {
            tracing::debug!(
                fields = ?errors.per_field().keys().collect::<Vec<_>>(),
                "form values failed validation"
            );
            Err(errors)
        }
    }
}
