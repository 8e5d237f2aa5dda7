/// Authenticated-identity defaults
///
/// The sign-in layer (out of scope here) knows the user's email and display
/// name before the wizard opens. Those defaults prefill the form so the
/// first step is not empty.
use serde::{Deserialize, Serialize};

use crate::fields::{Field, FormState};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityDefaults {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl IdentityDefaults {
    /// Prefill empty form fields. Values the user already typed are left
    /// alone.
    pub fn prefill(&self, form: &mut FormState) {
        if form.text(Field::Email).is_empty() && !self.email.trim().is_empty() {
            form.set_text(Field::Email, self.email.trim());
        }

        if let Some(display_name) = &self.display_name {
            let mut parts = display_name.split_whitespace();
            if let Some(first) = parts.next() {
                if form.text(Field::FirstName).is_empty() {
                    form.set_text(Field::FirstName, first);
                }
            }
            let rest = parts.collect::<Vec<_>>().join(" ");
            if !rest.is_empty() && form.text(Field::LastName).is_empty() {
                form.set_text(Field::LastName, rest);
            }
        }
    }
}
