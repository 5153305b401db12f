//! Form field value objects

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FieldInputError;

/// Cancellation reason category, the discriminant that selects which
/// detail field is mandatory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reason {
    Family,
    Other,
}

impl Reason {
    pub const ALL: [Reason; 2] = [Reason::Family, Reason::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Family => "family",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reason {
    type Err = FieldInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "family" => Ok(Self::Family),
            "other" => Ok(Self::Other),
            other => Err(FieldInputError::UnknownReason(other.to_string())),
        }
    }
}

/// Addressable fields of the questionnaire.
///
/// Ordering follows the on-screen order and is relied upon when errors are
/// listed per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    Reason,
    FamilyDetails,
    OtherDetails,
    Improvement,
    Comments,
}

impl FieldName {
    pub const ALL: [FieldName; 5] = [
        FieldName::Reason,
        FieldName::FamilyDetails,
        FieldName::OtherDetails,
        FieldName::Improvement,
        FieldName::Comments,
    ];

    /// Path used in error maps and in the submitted payload
    pub fn path(&self) -> &'static str {
        match self {
            Self::Reason => "reason",
            Self::FamilyDetails => "familyDetails",
            Self::OtherDetails => "otherDetails",
            Self::Improvement => "improvement",
            Self::Comments => "comments",
        }
    }

    pub fn is_text(&self) -> bool {
        !matches!(self, Self::Reason)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for FieldName {
    type Err = FieldInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.path() == s)
            .ok_or_else(|| FieldInputError::UnknownField(s.to_string()))
    }
}

/// Type-safe field values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Reason(Option<Reason>),
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<Reason> for FieldValue {
    fn from(value: Reason) -> Self {
        FieldValue::Reason(Some(value))
    }
}

impl From<Option<Reason>> for FieldValue {
    fn from(value: Option<Reason>) -> Self {
        FieldValue::Reason(value)
    }
}

/// The single aggregate the user submits.
///
/// Hidden detail fields keep whatever was typed into them and are sent
/// along with the rest of the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormValues {
    pub reason: Option<Reason>,
    pub family_details: String,
    pub other_details: String,
    pub improvement: String,
    pub comments: String,
}

impl FormValues {
    /// Get the text of a text field (`None` for `reason`)
    pub fn text(&self, field: FieldName) -> Option<&str> {
        match field {
            FieldName::Reason => None,
            FieldName::FamilyDetails => Some(&self.family_details),
            FieldName::OtherDetails => Some(&self.other_details),
            FieldName::Improvement => Some(&self.improvement),
            FieldName::Comments => Some(&self.comments),
        }
    }

    fn text_mut(&mut self, field: FieldName) -> Option<&mut String> {
        match field {
            FieldName::Reason => None,
            FieldName::FamilyDetails => Some(&mut self.family_details),
            FieldName::OtherDetails => Some(&mut self.other_details),
            FieldName::Improvement => Some(&mut self.improvement),
            FieldName::Comments => Some(&mut self.comments),
        }
    }

    /// Store a value verbatim. Fails without touching anything when the
    /// value kind does not fit the field.
    pub fn set(&mut self, field: FieldName, value: FieldValue) -> Result<(), FieldInputError> {
        match (field, value) {
            (FieldName::Reason, FieldValue::Reason(reason)) => {
                self.reason = reason;
                Ok(())
            }
            (field, FieldValue::Text(text)) if field.is_text() => {
                if let Some(slot) = self.text_mut(field) {
                    *slot = text;
                }
                Ok(())
            }
            (field, _) => Err(FieldInputError::KindMismatch {
                field,
                expected: if field.is_text() { "text" } else { "reason" },
            }),
        }
    }

    /// Read a field back as a `FieldValue`
    pub fn get(&self, field: FieldName) -> FieldValue {
        match self.text(field) {
            Some(text) => FieldValue::Text(text.to_string()),
            None => FieldValue::Reason(self.reason),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
