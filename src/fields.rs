/// Form field model
///
/// Defines the closed set of profile fields, their value shapes, the owned
/// form aggregate, and the per-field error map. All consumers read and
/// mutate form data through `FormState`; there is no other writer.
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Every field collected by the onboarding wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Email,
    DateOfBirth,
    Nickname,
    SportTypes,
    InstagramUrl,
    TwitterUrl,
    YoutubeUrl,
    ProfileVisibility,
    ActivityVisibility,
}

impl Field {
    /// All fields, in display order.
    pub fn all() -> [Field; 11] {
        [
            Field::FirstName,
            Field::LastName,
            Field::Email,
            Field::DateOfBirth,
            Field::Nickname,
            Field::SportTypes,
            Field::InstagramUrl,
            Field::TwitterUrl,
            Field::YoutubeUrl,
            Field::ProfileVisibility,
            Field::ActivityVisibility,
        ]
    }

    /// Human-readable label for error messages and prompts
    pub fn label(&self) -> &'static str {
        match self {
            Field::FirstName => "First name",
            Field::LastName => "Last name",
            Field::Email => "Email",
            Field::DateOfBirth => "Date of birth",
            Field::Nickname => "Nickname",
            Field::SportTypes => "Sports",
            Field::InstagramUrl => "Instagram link",
            Field::TwitterUrl => "Twitter link",
            Field::YoutubeUrl => "YouTube link",
            Field::ProfileVisibility => "Profile visibility",
            Field::ActivityVisibility => "Activity visibility",
        }
    }

    /// Map a field name from the profile service's payload contract
    /// back to the local field (used when the server reports per-field
    /// validation failures).
    pub fn from_api_name(name: &str) -> Option<Field> {
        match name {
            "name" => Some(Field::FirstName),
            "surname" => Some(Field::LastName),
            "email" => Some(Field::Email),
            "dateOfBirth" => Some(Field::DateOfBirth),
            "nickname" => Some(Field::Nickname),
            "sportTypes" => Some(Field::SportTypes),
            "instagramUrl" => Some(Field::InstagramUrl),
            "twitterUrl" => Some(Field::TwitterUrl),
            "youtubeUrl" => Some(Field::YoutubeUrl),
            "profileVisibility" => Some(Field::ProfileVisibility),
            "activityVisibility" => Some(Field::ActivityVisibility),
            _ => None,
        }
    }
}

/// Sports a profile can list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SportType {
    Running,
    Cycling,
    Swimming,
    Football,
    Basketball,
    Tennis,
    Climbing,
    Skiing,
}

impl SportType {
    pub fn all() -> [SportType; 8] {
        [
            SportType::Running,
            SportType::Cycling,
            SportType::Swimming,
            SportType::Football,
            SportType::Basketball,
            SportType::Tennis,
            SportType::Climbing,
            SportType::Skiing,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SportType::Running => "Running",
            SportType::Cycling => "Cycling",
            SportType::Swimming => "Swimming",
            SportType::Football => "Football",
            SportType::Basketball => "Basketball",
            SportType::Tennis => "Tennis",
            SportType::Climbing => "Climbing",
            SportType::Skiing => "Skiing",
        }
    }

    /// Parse a user-typed sport name (case-insensitive)
    pub fn from_name(name: &str) -> Option<SportType> {
        SportType::all()
            .into_iter()
            .find(|s| s.display_name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Visibility level for privacy settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    Public,
    Followers,
    Private,
}

impl PrivacyLevel {
    pub fn display_name(&self) -> &'static str {
        match self {
            PrivacyLevel::Public => "Public",
            PrivacyLevel::Followers => "Followers",
            PrivacyLevel::Private => "Private",
        }
    }

    pub fn from_name(name: &str) -> Option<PrivacyLevel> {
        match name.trim().to_ascii_lowercase().as_str() {
            "public" => Some(PrivacyLevel::Public),
            "followers" => Some(PrivacyLevel::Followers),
            "private" => Some(PrivacyLevel::Private),
            _ => None,
        }
    }
}

impl Default for PrivacyLevel {
    fn default() -> Self {
        PrivacyLevel::Public
    }
}

/// Social networks with an optional profile link field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialProvider {
    Instagram,
    Twitter,
    Youtube,
}

impl SocialProvider {
    pub fn display_name(&self) -> &'static str {
        match self {
            SocialProvider::Instagram => "Instagram",
            SocialProvider::Twitter => "Twitter",
            SocialProvider::Youtube => "YouTube",
        }
    }

    /// The form field carrying this provider's link
    pub fn field(&self) -> Field {
        match self {
            SocialProvider::Instagram => Field::InstagramUrl,
            SocialProvider::Twitter => Field::TwitterUrl,
            SocialProvider::Youtube => Field::YoutubeUrl,
        }
    }
}

/// Current value of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Date(Option<NaiveDate>),
    Sports(Vec<SportType>),
    Privacy(PrivacyLevel),
}

impl FieldValue {
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(s) => s.as_str(),
            _ => "",
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => *d,
            _ => None,
        }
    }

    pub fn as_sports(&self) -> &[SportType] {
        match self {
            FieldValue::Sports(s) => s.as_slice(),
            _ => &[],
        }
    }

    pub fn as_privacy(&self) -> PrivacyLevel {
        match self {
            FieldValue::Privacy(p) => *p,
            _ => PrivacyLevel::default(),
        }
    }
}

/// The owned form aggregate.
///
/// Holds the declared default for every field from creation, so a field the
/// user never visited still reads back a well-defined value.
#[derive(Debug, Clone)]
pub struct FormState {
    values: HashMap<Field, FieldValue>,
}

impl FormState {
    pub fn new() -> Self {
        let mut values = HashMap::new();
        for field in Field::all() {
            values.insert(field, Self::default_value(field));
        }
        Self { values }
    }

    /// Declared default per field
    fn default_value(field: Field) -> FieldValue {
        match field {
            Field::DateOfBirth => FieldValue::Date(None),
            Field::SportTypes => FieldValue::Sports(Vec::new()),
            Field::ProfileVisibility | Field::ActivityVisibility => {
                FieldValue::Privacy(PrivacyLevel::default())
            }
            _ => FieldValue::Text(String::new()),
        }
    }

    pub fn get(&self, field: Field) -> &FieldValue {
        // Every field is seeded in new(), so the lookup cannot miss.
        &self.values[&field]
    }

    pub fn text(&self, field: Field) -> &str {
        self.get(field).as_text()
    }

    pub fn date(&self, field: Field) -> Option<NaiveDate> {
        self.get(field).as_date()
    }

    pub fn sports(&self) -> &[SportType] {
        self.get(Field::SportTypes).as_sports()
    }

    pub fn privacy(&self, field: Field) -> PrivacyLevel {
        self.get(field).as_privacy()
    }

    pub fn set_text(&mut self, field: Field, value: impl Into<String>) {
        self.values.insert(field, FieldValue::Text(value.into()));
    }

    pub fn set_date(&mut self, field: Field, value: Option<NaiveDate>) {
        self.values.insert(field, FieldValue::Date(value));
    }

    pub fn set_sports(&mut self, sports: Vec<SportType>) {
        self.values.insert(Field::SportTypes, FieldValue::Sports(sports));
    }

    pub fn set_privacy(&mut self, field: Field, level: PrivacyLevel) {
        self.values.insert(field, FieldValue::Privacy(level));
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

/// Zero-or-one error message per field.
#[derive(Debug, Clone, Default)]
pub struct FieldErrorMap {
    errors: HashMap<Field, String>,
}

impl FieldErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: Field, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn clear(&mut self, field: Field) {
        self.errors.remove(&field);
    }

    /// Retract an error only if it is this exact message. Used to withdraw
    /// the "taken" verdict without touching unrelated errors on the field.
    pub fn clear_if(&mut self, field: Field, message: &str) {
        if self.errors.get(&field).map(String::as_str) == Some(message) {
            self.errors.remove(&field);
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }

    pub fn clear_all(&mut self) {
        self.errors.clear();
    }
}
