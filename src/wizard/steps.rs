/// Wizard step definitions
///
/// Defines the ordered steps of the profile-onboarding flow and which
/// fields belong to each. The step list is fixed at compile time; field
/// sets partition the full field set with no omission.
use crate::fields::Field;

/// Wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardStep {
    /// Who you are - name, email, date of birth
    Identity,

    /// Pick a unique nickname (availability-checked)
    Nickname,

    /// Sports you practice
    Sports,

    /// Social links and privacy settings - final step, offers submit
    Social,
}

impl WizardStep {
    /// Get step title
    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Identity => "About you",
            WizardStep::Nickname => "Pick a nickname",
            WizardStep::Sports => "Your sports",
            WizardStep::Social => "Links & privacy",
        }
    }

    /// Get step description
    pub fn description(&self) -> &'static str {
        match self {
            WizardStep::Identity => "Tell us who you are",
            WizardStep::Nickname => "Choose the unique name other athletes will see",
            WizardStep::Sports => "Select at least one sport you practice",
            WizardStep::Social => "Optionally link your accounts and tune visibility",
        }
    }

    /// Fields collected on this step
    pub fn fields(&self) -> &'static [Field] {
        match self {
            WizardStep::Identity => &[
                Field::FirstName,
                Field::LastName,
                Field::Email,
                Field::DateOfBirth,
            ],
            WizardStep::Nickname => &[Field::Nickname],
            WizardStep::Sports => &[Field::SportTypes],
            WizardStep::Social => &[
                Field::InstagramUrl,
                Field::TwitterUrl,
                Field::YoutubeUrl,
                Field::ProfileVisibility,
                Field::ActivityVisibility,
            ],
        }
    }

    /// The step a field belongs to (every field belongs to exactly one)
    pub fn containing(field: Field) -> WizardStep {
        for step in WizardStep::all_steps() {
            if step.fields().contains(&field) {
                return step;
            }
        }
        // Unreachable while the partition invariant holds; Identity is the
        // safe landing spot for navigation purposes.
        WizardStep::Identity
    }

    /// Get step number (1-indexed)
    pub fn number(&self) -> usize {
        match self {
            WizardStep::Identity => 1,
            WizardStep::Nickname => 2,
            WizardStep::Sports => 3,
            WizardStep::Social => 4,
        }
    }

    /// Get total number of steps
    pub fn total_steps() -> usize {
        4
    }

    /// Check if this is the first step
    pub fn is_first(&self) -> bool {
        matches!(self, WizardStep::Identity)
    }

    /// Check if this is the terminal step (offers submit instead of next)
    pub fn is_last(&self) -> bool {
        matches!(self, WizardStep::Social)
    }

    /// Get next step
    pub fn next(&self) -> Option<WizardStep> {
        match self {
            WizardStep::Identity => Some(WizardStep::Nickname),
            WizardStep::Nickname => Some(WizardStep::Sports),
            WizardStep::Sports => Some(WizardStep::Social),
            WizardStep::Social => None,
        }
    }

    /// Get previous step
    pub fn previous(&self) -> Option<WizardStep> {
        match self {
            WizardStep::Identity => None,
            WizardStep::Nickname => Some(WizardStep::Identity),
            WizardStep::Sports => Some(WizardStep::Nickname),
            WizardStep::Social => Some(WizardStep::Sports),
        }
    }

    /// Get all steps in order
    pub fn all_steps() -> [WizardStep; 4] {
        [
            WizardStep::Identity,
            WizardStep::Nickname,
            WizardStep::Sports,
            WizardStep::Social,
        ]
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        WizardStep::Identity
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}
