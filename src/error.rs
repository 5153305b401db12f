//! Typed errors for field input

use thiserror::Error;

use crate::state::FieldName;

/// Raised when a presentation layer hands the controller something that can
/// never be stored. Validation failures are not errors of this kind; they are
/// returned as `ValidationErrors`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldInputError {
    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("unknown reason `{0}`, expected `family` or `other`")]
    UnknownReason(String),

    #[error("field `{field}` expects a {expected} value")]
    KindMismatch {
        field: FieldName,
        expected: &'static str,
    },
}
