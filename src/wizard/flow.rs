/// Wizard flow management
///
/// Owns the step state machine and is the only component allowed to move
/// the cursor. `next` combines the synchronous rule engine with the
/// availability checker's verdict; `back` never re-validates.
use chrono::NaiveDate;
use tracing::debug;

use crate::availability::{AvailabilityChecker, NicknameStatus};
use crate::fields::{Field, PrivacyLevel, SportType};
use crate::identity::IdentityDefaults;
use crate::validation::{ValidationEngine, MSG_NICKNAME_CHECKING, MSG_NICKNAME_TAKEN};

use super::state::WizardState;
use super::steps::WizardStep;

/// Navigation result
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationResult {
    /// Navigation succeeded, now on new step
    Moved(WizardStep),

    /// Navigation blocked; the blocking messages are in the error map
    Blocked { reason: String },

    /// Already on the terminal step, which offers submit instead of next
    AtFinalStep,
}

/// Wizard flow manager
pub struct WizardFlow {
    state: WizardState,
    engine: ValidationEngine,
    checker: AvailabilityChecker,
}

impl WizardFlow {
    /// Create a new flow with a fresh form
    pub fn new(checker: AvailabilityChecker) -> Self {
        Self {
            state: WizardState::new(),
            engine: ValidationEngine::new(),
            checker,
        }
    }

    /// Create a flow prefilled from the authenticated identity
    pub fn with_identity(checker: AvailabilityChecker, defaults: &IdentityDefaults) -> Self {
        Self {
            state: WizardState::with_identity(defaults),
            engine: ValidationEngine::new(),
            checker,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut WizardState {
        &mut self.state
    }

    pub fn current_step(&self) -> WizardStep {
        self.state.current_step()
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    /// Keystroke entry point for text fields. Nickname edits additionally
    /// feed the availability checker, which debounces and probes.
    pub fn update_text(&mut self, field: Field, value: &str) {
        self.state.set_text(field, value);
        if field == Field::Nickname {
            self.checker.input(value);
        }
    }

    pub fn update_date(&mut self, field: Field, value: Option<NaiveDate>) {
        self.state.set_date(field, value);
    }

    pub fn update_sports(&mut self, sports: Vec<SportType>) {
        self.state.set_sports(sports);
    }

    pub fn update_privacy(&mut self, field: Field, level: PrivacyLevel) {
        self.state.set_privacy(field, level);
    }

    /// Blur handler: validate a single field and surface/clear its error.
    pub fn validate_field(&mut self, field: Field, today: NaiveDate) {
        match self.engine.validate(field, self.state.form(), today) {
            Some(message) => self.state.errors_mut().set(field, message),
            None => {
                if field == Field::Nickname {
                    // The availability verdict is owned by poll(); a passing
                    // sync rule must not retract it
                    self.state
                        .errors_mut()
                        .clear_if(field, MSG_NICKNAME_CHECKING);
                    self.poll();
                } else {
                    self.state.errors_mut().clear(field);
                }
            }
        }
    }

    /// Effective availability status for the live nickname input
    pub fn nickname_status(&self) -> NicknameStatus {
        self.checker
            .status_for(self.state.form().text(Field::Nickname))
    }

    /// Drive the checker's committed verdict into the error map: `taken`
    /// raises the conflict message, `available` retracts exactly that
    /// message and nothing else. Call whenever the check may have resolved.
    pub fn poll(&mut self) {
        match self.nickname_status() {
            NicknameStatus::Taken => {
                self.state
                    .errors_mut()
                    .set(Field::Nickname, MSG_NICKNAME_TAKEN);
            }
            NicknameStatus::Available => {
                self.state
                    .errors_mut()
                    .clear_if(Field::Nickname, MSG_NICKNAME_TAKEN);
                self.state
                    .errors_mut()
                    .clear_if(Field::Nickname, MSG_NICKNAME_CHECKING);
            }
            NicknameStatus::Errored => {
                // Fail open: a failed check never blocks the user
                self.state
                    .errors_mut()
                    .clear_if(Field::Nickname, MSG_NICKNAME_CHECKING);
            }
            NicknameStatus::Checking | NicknameStatus::Idle => {}
        }
    }

    /// Navigate to the next step. Only the current step's fields are
    /// re-validated; earlier steps were gated on their own transitions.
    pub fn next(&mut self, today: NaiveDate) -> NavigationResult {
        let step = self.state.current_step();

        if !self.gate(step, today) {
            debug!("next blocked on step {:?}", step);
            let reason = if self.nickname_blocking(step) == Some(NicknameStatus::Checking) {
                "Nickname availability check is still in progress".to_string()
            } else {
                "Fix the highlighted fields to continue".to_string()
            };
            return NavigationResult::Blocked { reason };
        }

        match step.next() {
            Some(next_step) => {
                self.state.set_current_step(next_step);
                NavigationResult::Moved(next_step)
            }
            None => NavigationResult::AtFinalStep,
        }
    }

    /// Navigate to previous step. Always permitted above the first step and
    /// never re-validates.
    pub fn back(&mut self) -> NavigationResult {
        match self.state.current_step().previous() {
            Some(prev_step) => {
                self.state.set_current_step(prev_step);
                NavigationResult::Moved(prev_step)
            }
            None => NavigationResult::Blocked {
                reason: "Already at the first step".to_string(),
            },
        }
    }

    /// Jump to a specific step (used for submit-failure redirect signals)
    pub fn go_to(&mut self, step: WizardStep) {
        self.state.set_current_step(step);
    }

    /// Whether the flow sits on the terminal step
    pub fn at_final_step(&self) -> bool {
        self.state.current_step().is_last()
    }

    /// Gate one step: every field passes the rule engine, and the nickname
    /// (when part of the step) is neither `Taken` nor still `Checking`.
    /// Blocking messages are written into the error map; the cursor is
    /// untouched. Returns true when the step may be left.
    pub(crate) fn gate(&mut self, step: WizardStep, today: NaiveDate) -> bool {
        self.poll();

        let mut outcomes = Vec::with_capacity(step.fields().len());
        for field in step.fields() {
            outcomes.push((*field, self.engine.validate(*field, self.state.form(), today)));
        }

        let mut all_valid = true;
        let mut nickname_sync_valid = false;
        for (field, outcome) in outcomes {
            match outcome {
                Some(message) => {
                    self.state.errors_mut().set(field, message);
                    all_valid = false;
                }
                None => {
                    if field == Field::Nickname {
                        nickname_sync_valid = true;
                        // The taken verdict is owned by poll(), not the engine
                        self.state
                            .errors_mut()
                            .clear_if(field, MSG_NICKNAME_CHECKING);
                    } else {
                        self.state.errors_mut().clear(field);
                    }
                }
            }
        }

        if nickname_sync_valid {
            match self.nickname_status() {
                NicknameStatus::Taken => {
                    self.state
                        .errors_mut()
                        .set(Field::Nickname, MSG_NICKNAME_TAKEN);
                    all_valid = false;
                }
                NicknameStatus::Checking => {
                    // Do not optimistically advance past an unresolved check
                    self.state
                        .errors_mut()
                        .set(Field::Nickname, MSG_NICKNAME_CHECKING);
                    all_valid = false;
                }
                // Errored fails open; Available and Idle pass
                _ => {}
            }
        }

        all_valid
    }

    fn nickname_blocking(&self, step: WizardStep) -> Option<NicknameStatus> {
        if step.fields().contains(&Field::Nickname) {
            Some(self.nickname_status())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::AvailabilityProbe;
    use crate::error::ApiError;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    struct FakeProbe {
        taken: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeProbe {
        fn new(taken: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                taken,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl AvailabilityProbe for FakeProbe {
        fn check(&self, nickname: &str) -> Result<bool, ApiError> {
            self.calls.lock().push(nickname.to_string());
            Ok(!self.taken.contains(&nickname))
        }
    }

    const DEBOUNCE: Duration = Duration::from_millis(30);

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    fn flow_with(taken: Vec<&'static str>) -> WizardFlow {
        let checker = AvailabilityChecker::new(FakeProbe::new(taken), DEBOUNCE);
        WizardFlow::new(checker)
    }

    fn fill_identity(flow: &mut WizardFlow) {
        flow.update_text(Field::FirstName, "Ada");
        flow.update_text(Field::LastName, "Lovelace");
        flow.update_text(Field::Email, "ada@example.com");
        flow.update_date(
            Field::DateOfBirth,
            Some(NaiveDate::from_ymd_opt(1999, 12, 10).unwrap()),
        );
    }

    fn settle() {
        thread::sleep(DEBOUNCE + Duration::from_millis(60));
    }

    #[test]
    fn test_next_blocked_on_empty_identity_step() {
        let mut flow = flow_with(vec![]);

        let result = flow.next(today());
        assert!(matches!(result, NavigationResult::Blocked { .. }));
        assert_eq!(flow.current_step(), WizardStep::Identity);
        // Every blocking field carries a visible message
        assert!(flow.state().errors().get(Field::FirstName).is_some());
        assert!(flow.state().errors().get(Field::DateOfBirth).is_some());
    }

    #[test]
    fn test_next_moves_when_step_is_valid() {
        let mut flow = flow_with(vec![]);
        fill_identity(&mut flow);

        let result = flow.next(today());
        assert_eq!(result, NavigationResult::Moved(WizardStep::Nickname));
        assert!(flow.state().errors().is_empty());
    }

    #[test]
    fn test_back_never_revalidates() {
        let mut flow = flow_with(vec![]);
        fill_identity(&mut flow);
        flow.next(today());

        // Break the identity step, then go back: allowed unconditionally
        flow.update_text(Field::FirstName, "");
        let result = flow.back();
        assert_eq!(result, NavigationResult::Moved(WizardStep::Identity));
    }

    #[test]
    fn test_back_blocked_at_first_step() {
        let mut flow = flow_with(vec![]);
        let result = flow.back();
        assert!(matches!(result, NavigationResult::Blocked { .. }));
    }

    #[test]
    fn test_next_blocked_while_nickname_checking() {
        let checker = AvailabilityChecker::new(FakeProbe::new(vec![]), Duration::from_secs(5));
        let mut flow = WizardFlow::new(checker);
        fill_identity(&mut flow);
        flow.next(today());

        flow.update_text(Field::Nickname, "johndoe");
        // The debounce window is far from over; the check is unresolved
        let result = flow.next(today());
        assert!(matches!(result, NavigationResult::Blocked { .. }));
        assert_eq!(
            flow.state().errors().get(Field::Nickname),
            Some(MSG_NICKNAME_CHECKING)
        );
        assert_eq!(flow.current_step(), WizardStep::Nickname);
    }

    #[test]
    fn test_next_permitted_after_available_verdict() {
        let mut flow = flow_with(vec![]);
        fill_identity(&mut flow);
        flow.next(today());

        flow.update_text(Field::Nickname, "johndoe");
        settle();

        let result = flow.next(today());
        assert_eq!(result, NavigationResult::Moved(WizardStep::Sports));
    }

    #[test]
    fn test_next_blocked_by_taken_nickname() {
        let mut flow = flow_with(vec!["takennick"]);
        fill_identity(&mut flow);
        flow.next(today());

        flow.update_text(Field::Nickname, "takennick");
        settle();

        let result = flow.next(today());
        assert!(matches!(result, NavigationResult::Blocked { .. }));
        assert_eq!(
            flow.state().errors().get(Field::Nickname),
            Some(MSG_NICKNAME_TAKEN)
        );
    }

    #[test]
    fn test_taken_error_retracted_when_user_picks_free_nickname() {
        let mut flow = flow_with(vec!["takennick"]);
        fill_identity(&mut flow);
        flow.next(today());

        flow.update_text(Field::Nickname, "takennick");
        settle();
        flow.poll();
        assert_eq!(
            flow.state().errors().get(Field::Nickname),
            Some(MSG_NICKNAME_TAKEN)
        );

        flow.update_text(Field::Nickname, "freenick");
        settle();
        flow.poll();
        assert!(flow.state().errors().get(Field::Nickname).is_none());
    }

    #[test]
    fn test_short_nickname_blocks_with_sync_error_only() {
        let mut flow = flow_with(vec![]);
        fill_identity(&mut flow);
        flow.next(today());

        flow.update_text(Field::Nickname, "ab");
        settle();

        let result = flow.next(today());
        assert!(matches!(result, NavigationResult::Blocked { .. }));
        assert_eq!(
            flow.state().errors().get(Field::Nickname),
            Some("Nickname must be at least 3 characters")
        );
    }

    #[test]
    fn test_errored_check_fails_open() {
        struct FailingProbe;
        impl AvailabilityProbe for FailingProbe {
            fn check(&self, _nickname: &str) -> Result<bool, ApiError> {
                Err(ApiError::UnexpectedStatus(500))
            }
        }

        let checker = AvailabilityChecker::new(Arc::new(FailingProbe), DEBOUNCE);
        let mut flow = WizardFlow::new(checker);
        fill_identity(&mut flow);
        flow.next(today());

        flow.update_text(Field::Nickname, "johndoe");
        settle();

        // The transient failure neither blocks nor surfaces an error
        let result = flow.next(today());
        assert_eq!(result, NavigationResult::Moved(WizardStep::Sports));
        assert!(flow.state().errors().get(Field::Nickname).is_none());
    }

    #[test]
    fn test_final_step_offers_submit_instead_of_next() {
        let mut flow = flow_with(vec![]);
        fill_identity(&mut flow);
        flow.next(today());
        flow.update_text(Field::Nickname, "johndoe");
        settle();
        flow.next(today());
        flow.update_sports(vec![SportType::Running]);
        flow.next(today());

        assert!(flow.at_final_step());
        assert_eq!(flow.next(today()), NavigationResult::AtFinalStep);
    }

    #[test]
    fn test_cursor_moves_one_step_per_action() {
        let mut flow = flow_with(vec![]);
        fill_identity(&mut flow);

        let before = flow.current_step().number();
        flow.next(today());
        assert_eq!(flow.current_step().number(), before + 1);

        flow.back();
        assert_eq!(flow.current_step().number(), before);
    }
}
