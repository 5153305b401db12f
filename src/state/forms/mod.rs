//! Form domain layer
//!
//! Type-safe field values, the validation rules over them, and the
//! controller that owns the live values of a questionnaire session.

mod field;
mod form_state;
mod schema;

pub use field::{FieldName, FieldValue, FormValues, Reason};
pub use form_state::{FormChange, FormStateController, SubscriptionId};
pub use schema::{
    required_fields, FieldError, FieldLimits, RequiredWhen, ValidationErrors, ValidationSchema,
    ViolationKind, REQUIRED_WHEN,
};
