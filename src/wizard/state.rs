/// Wizard state management
///
/// The single owned aggregate for everything the wizard mutates: the form
/// values, the per-field error map, and the active step cursor. All
/// consumers go through this API; nothing else writes.
use chrono::NaiveDate;

use crate::fields::{Field, FieldErrorMap, FormState, PrivacyLevel, SportType};
use crate::identity::IdentityDefaults;

use super::steps::WizardStep;

/// Wizard state
#[derive(Debug, Clone)]
pub struct WizardState {
    form: FormState,
    errors: FieldErrorMap,
    current_step: WizardStep,
}

impl WizardState {
    /// Create a fresh wizard state on the first step
    pub fn new() -> Self {
        Self {
            form: FormState::new(),
            errors: FieldErrorMap::new(),
            current_step: WizardStep::Identity,
        }
    }

    /// Create a state prefilled from the authenticated identity
    pub fn with_identity(defaults: &IdentityDefaults) -> Self {
        let mut state = Self::new();
        defaults.prefill(&mut state.form);
        state
    }

    /// Get current step
    pub fn current_step(&self) -> WizardStep {
        self.current_step
    }

    /// Set current step (crate-internal; only the flow moves the cursor)
    pub(crate) fn set_current_step(&mut self, step: WizardStep) {
        self.current_step = step;
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn errors(&self) -> &FieldErrorMap {
        &self.errors
    }

    pub(crate) fn errors_mut(&mut self) -> &mut FieldErrorMap {
        &mut self.errors
    }

    /// Set a text field. Clears the field's error so stale messages never
    /// outlive an edit.
    pub fn set_text(&mut self, field: Field, value: impl Into<String>) {
        self.form.set_text(field, value);
        self.errors.clear(field);
    }

    pub fn set_date(&mut self, field: Field, value: Option<NaiveDate>) {
        self.form.set_date(field, value);
        self.errors.clear(field);
    }

    pub fn set_sports(&mut self, sports: Vec<SportType>) {
        self.form.set_sports(sports);
        self.errors.clear(Field::SportTypes);
    }

    pub fn set_privacy(&mut self, field: Field, level: PrivacyLevel) {
        self.form.set_privacy(field, level);
        self.errors.clear(field);
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}
