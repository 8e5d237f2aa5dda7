/// Field validation engine
///
/// Rules are data: each field maps to an ordered rule list, evaluated by one
/// generic engine. The first failing rule wins, which keeps messages
/// deterministic. Evaluation is pure; "today" is passed in so the age rule
/// is testable.
use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::fields::{Field, FieldErrorMap, FormState, SocialProvider};

/// Nickname length bounds, shared with the availability checker's local
/// format gate.
pub const NICKNAME_MIN_LEN: usize = 3;
pub const NICKNAME_MAX_LEN: usize = 30;

/// Minimum age accepted at registration.
pub const MIN_AGE_YEARS: i32 = 13;

/// Message attached when the availability check reports a conflict.
/// Raised and retracted by the wizard flow, not by this engine.
pub const MSG_NICKNAME_TAKEN: &str = "This nickname is already taken";

/// Message attached while the availability check is still in flight on a
/// blocked step transition.
pub const MSG_NICKNAME_CHECKING: &str = "Checking nickname availability...";

/// Nickname character set, shared with the availability checker.
pub const NICKNAME_PATTERN: &str = r"^[a-zA-Z0-9_]+$";

/// A single validation rule. Order within a field's rule list matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Required,
    MinLen(usize),
    MaxLen(usize),
    NicknamePattern,
    EmailPattern,
    MinAge(i32),
    MinSelected(usize),
    OptionalUrl(SocialProvider),
}

/// Ordered rule table, keyed by field.
fn rules_for(field: Field) -> &'static [Rule] {
    match field {
        Field::FirstName | Field::LastName => &[Rule::Required, Rule::MaxLen(50)],
        Field::Email => &[Rule::Required, Rule::EmailPattern],
        Field::DateOfBirth => &[Rule::Required, Rule::MinAge(MIN_AGE_YEARS)],
        Field::Nickname => &[
            Rule::Required,
            Rule::MinLen(NICKNAME_MIN_LEN),
            Rule::MaxLen(NICKNAME_MAX_LEN),
            Rule::NicknamePattern,
        ],
        Field::SportTypes => &[Rule::MinSelected(1)],
        Field::InstagramUrl => &[Rule::OptionalUrl(SocialProvider::Instagram)],
        Field::TwitterUrl => &[Rule::OptionalUrl(SocialProvider::Twitter)],
        Field::YoutubeUrl => &[Rule::OptionalUrl(SocialProvider::Youtube)],
        // Enum-backed selections cannot hold an invalid value
        Field::ProfileVisibility | Field::ActivityVisibility => &[],
    }
}

/// Evaluates the rule table against form values.
pub struct ValidationEngine {
    nickname_re: Regex,
    email_re: Regex,
    instagram_re: Regex,
    twitter_re: Regex,
    youtube_re: Regex,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self {
            nickname_re: compile(NICKNAME_PATTERN),
            email_re: compile(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"),
            instagram_re: compile(r"^https://(www\.)?instagram\.com/[A-Za-z0-9_.]+/?$"),
            twitter_re: compile(r"^https://(www\.)?(twitter|x)\.com/[A-Za-z0-9_]+/?$"),
            youtube_re: compile(r"^https://(www\.)?youtube\.com/(@|c/|channel/)?[A-Za-z0-9_\-]+/?$"),
        }
    }

    /// Validate one field. Returns the first failing rule's message, or
    /// `None` when every rule passes. Deterministic for identical inputs.
    pub fn validate(&self, field: Field, form: &FormState, today: NaiveDate) -> Option<String> {
        for rule in rules_for(field) {
            if let Some(message) = self.apply(*rule, field, form, today) {
                return Some(message);
            }
        }
        None
    }

    /// Validate every field of a step in bulk (used on transition attempts).
    /// Passing fields are cleared from the map, failing fields overwritten.
    pub fn validate_step(
        &self,
        fields: &[Field],
        form: &FormState,
        today: NaiveDate,
        errors: &mut FieldErrorMap,
    ) -> bool {
        let mut all_valid = true;
        for field in fields {
            match self.validate(*field, form, today) {
                Some(message) => {
                    errors.set(*field, message);
                    all_valid = false;
                }
                None => errors.clear(*field),
            }
        }
        all_valid
    }

    fn apply(&self, rule: Rule, field: Field, form: &FormState, today: NaiveDate) -> Option<String> {
        match rule {
            Rule::Required => match field {
                Field::DateOfBirth => form
                    .date(field)
                    .is_none()
                    .then(|| format!("{} is required", field.label())),
                _ => form
                    .text(field)
                    .trim()
                    .is_empty()
                    .then(|| format!("{} is required", field.label())),
            },
            Rule::MinLen(min) => {
                let len = form.text(field).trim().chars().count();
                (len < min).then(|| format!("{} must be at least {} characters", field.label(), min))
            }
            Rule::MaxLen(max) => {
                let len = form.text(field).trim().chars().count();
                (len > max).then(|| format!("{} must be at most {} characters", field.label(), max))
            }
            Rule::NicknamePattern => {
                let value = form.text(field).trim();
                (!self.nickname_re.is_match(value)).then(|| {
                    format!(
                        "{} can only contain letters, numbers and underscores",
                        field.label()
                    )
                })
            }
            Rule::EmailPattern => {
                let value = form.text(field).trim();
                (!self.email_re.is_match(value)).then(|| "Enter a valid email address".to_string())
            }
            Rule::MinAge(min_years) => {
                let dob = form.date(field)?;
                (age_on(today, dob) < min_years)
                    .then(|| format!("You must be at least {} years old", min_years))
            }
            Rule::MinSelected(min) => (form.sports().len() < min)
                .then(|| "Select at least one sport".to_string()),
            Rule::OptionalUrl(provider) => {
                let value = form.text(field).trim();
                if value.is_empty() {
                    // Empty is always valid for optional fields
                    return None;
                }
                let re = match provider {
                    SocialProvider::Instagram => &self.instagram_re,
                    SocialProvider::Twitter => &self.twitter_re,
                    SocialProvider::Youtube => &self.youtube_re,
                };
                (!re.is_match(value))
                    .then(|| format!("Enter a valid {} URL", provider.display_name()))
            }
        }
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(pattern: &str) -> Regex {
    // Patterns are compile-time literals; failure here is a programming error.
    Regex::new(pattern).expect("hard-coded validation pattern compiles")
}

/// Full-date age computation: the year difference, minus one when the birth
/// month/day has not yet occurred this year. Calendar-year subtraction alone
/// would pass people a day too early.
pub fn age_on(today: NaiveDate, date_of_birth: NaiveDate) -> i32 {
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    years
}
