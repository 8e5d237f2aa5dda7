/// Profile-onboarding wizard module
///
/// A step state machine collecting a new user's profile across sequential
/// screens, gated on synchronous validation plus the asynchronous nickname
/// availability verdict.
///
/// ## Architecture
///
/// ```text
/// WizardFlow
///   ├── WizardState (form values, error map, step cursor)
///   ├── WizardStep (ordered enum; per-step field sets)
///   ├── ValidationEngine (declarative rule table, sync)
///   ├── AvailabilityChecker (debounced async nickname probe)
///   └── SubmissionCoordinator (final projection + server error mapping)
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// use sportlink_onboarding::wizard::{WizardFlow, NavigationResult};
///
/// let mut flow = WizardFlow::with_identity(checker, &identity);
///
/// // Keystrokes
/// flow.update_text(Field::Nickname, "ada_l");
///
/// // Step navigation
/// match flow.next(today) {
///     NavigationResult::Moved(step) => { /* render next step */ }
///     NavigationResult::Blocked { .. } => { /* errors are in the map */ }
///     NavigationResult::AtFinalStep => {
///         let outcome = coordinator.submit(&mut flow, token, today);
///     }
/// }
/// ```
///
/// ## Steps
///
/// 1. **Identity** - name, email, date of birth
/// 2. **Nickname** - unique handle, availability-checked live
/// 3. **Sports** - at least one sport
/// 4. **Social** - optional links and privacy settings, then submit

pub mod flow;
pub mod state;
pub mod steps;
pub mod submit;

// Re-export commonly used types
pub use flow::{NavigationResult, WizardFlow};
pub use state::WizardState;
pub use steps::WizardStep;
pub use submit::{build_request, SubmissionCoordinator, SubmissionOutcome};
