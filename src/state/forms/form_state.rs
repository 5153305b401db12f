//! Form state controller
//!
//! Single source of truth for the questionnaire's current values and the
//! state derived from them. Every mutation recomputes the derived state and
//! synchronously notifies each subscriber exactly once.

use std::collections::{BTreeMap, BTreeSet};

use super::field::{FieldName, FieldValue, FormValues, Reason};
use super::schema::{required_fields, FieldError, ValidationErrors, ValidationSchema};
use crate::error::FieldInputError;
use crate::state::submission::{SubmissionEvent, SubmissionState, SubmissionStatus};

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What subscribers receive after each mutation
#[derive(Debug)]
pub struct FormChange<'a> {
    /// Field that was edited, `None` for whole-form changes (reset, surfaced errors)
    pub field: Option<FieldName>,
    pub values: &'a FormValues,
    pub required: &'a BTreeSet<FieldName>,
    pub errors: &'a ValidationErrors,
    /// Whether errors should be rendered next to their fields
    pub errors_revealed: bool,
    pub state: SubmissionState,
}

type Listener = Box<dyn FnMut(&FormChange<'_>) + Send>;

pub struct FormStateController {
    schema: ValidationSchema,
    values: FormValues,
    required: BTreeSet<FieldName>,
    errors: ValidationErrors,
    errors_revealed: bool,
    status: SubmissionStatus,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for FormStateController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormStateController")
            .field("values", &self.values)
            .field("required", &self.required)
            .field("errors", &self.errors)
            .field("errors_revealed", &self.errors_revealed)
            .field("state", &self.status.current())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl FormStateController {
    /// Create a controller holding an empty form
    pub fn new(schema: ValidationSchema, status: SubmissionStatus) -> Self {
        let values = FormValues::default();
        let errors = Self::judge(&schema, &values);
        Self {
            schema,
            required: required_fields(values.reason),
            values,
            errors,
            errors_revealed: false,
            status,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Copy of the current values, used as a submit payload
    pub fn snapshot(&self) -> FormValues {
        self.values.clone()
    }

    pub fn field(&self, name: FieldName) -> FieldValue {
        self.values.get(name)
    }

    pub fn schema(&self) -> &ValidationSchema {
        &self.schema
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.status.current()
    }

    /// Store a value verbatim and recompute derived state.
    ///
    /// An edit made after a failed submit returns the submission state to
    /// idle. Values are accepted in every state, including while a submit is
    /// in flight.
    pub fn set_field(
        &mut self,
        name: FieldName,
        value: impl Into<FieldValue>,
    ) -> Result<(), FieldInputError> {
        self.values.set(name, value.into())?;
        tracing::debug!(field = %name, "field updated");
        self.status.apply(SubmissionEvent::Resume);
        self.recompute();
        self.notify(Some(name));
        Ok(())
    }

    /// String-addressed variant of `set_field` for presentation layers that
    /// only deal in paths and raw text. An empty reason clears the selection.
    pub fn set_field_by_path(&mut self, path: &str, raw: &str) -> Result<(), FieldInputError> {
        let name: FieldName = path.parse()?;
        let value = match name {
            FieldName::Reason if raw.is_empty() => FieldValue::Reason(None),
            FieldName::Reason => FieldValue::Reason(Some(raw.parse::<Reason>()?)),
            _ => FieldValue::Text(raw.to_string()),
        };
        self.set_field(name, value)
    }

    /// Fields that must be shown and filled for the current reason
    pub fn visible_required_fields(&self) -> &BTreeSet<FieldName> {
        &self.required
    }

    pub fn is_required(&self, name: FieldName) -> bool {
        name == FieldName::Reason || self.required.contains(&name)
    }

    /// Validation of the full current snapshot, one entry per failing field
    pub fn current_errors(&self) -> BTreeMap<FieldName, &FieldError> {
        self.errors.per_field()
    }

    pub fn validation(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Errors to render inline. Empty until a submit has been rejected.
    pub fn displayed_errors(&self) -> BTreeMap<FieldName, &FieldError> {
        if self.errors_revealed {
            self.errors.per_field()
        } else {
            BTreeMap::new()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Advisory cap for input widgets
    pub fn input_cap(&self, name: FieldName) -> Option<usize> {
        self.schema.max_chars(name)
    }

    /// Show the verdict of a rejected submit next to the fields
    pub fn surface_errors(&mut self, errors: ValidationErrors) {
        self.errors = errors;
        self.errors_revealed = true;
        self.notify(None);
    }

    /// Discard all values and hide errors again
    pub fn reset(&mut self) {
        self.values.clear();
        self.errors_revealed = false;
        self.recompute();
        self.notify(None);
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&FormChange<'_>) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn judge(schema: &ValidationSchema, values: &FormValues) -> ValidationErrors {
        match schema.validate(values) {
            Ok(_) => ValidationErrors::default(),
            Err(errors) => errors,
        }
    }

    fn recompute(&mut self) {
        self.required = required_fields(self.values.reason);
        self.errors = Self::judge(&self.schema, &self.values);
    }

    fn notify(&mut self, field: Option<FieldName>) {
        let change = FormChange {
            field,
            values: &self.values,
            required: &self.required,
            errors: &self.errors,
            errors_revealed: self.errors_revealed,
            state: self.status.current(),
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
    }
}
