// Integration tests for the SportLink onboarding wizard
// These tests drive the full flow against scripted collaborators: a fake
// availability probe and a fake profile service.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use parking_lot::Mutex;

use sportlink_onboarding::api::{
    ApiErrorBody, ApiErrorCode, AvailabilityResponse, FieldFailure, ProfileCreateRequest,
    ProfileRecord, ProfileService,
};
use sportlink_onboarding::availability::{AvailabilityChecker, AvailabilityProbe, NicknameStatus};
use sportlink_onboarding::error::ApiError;
use sportlink_onboarding::fields::{Field, PrivacyLevel, SportType};
use sportlink_onboarding::wizard::{
    NavigationResult, SubmissionCoordinator, SubmissionOutcome, WizardFlow, WizardStep,
};

const DEBOUNCE: Duration = Duration::from_millis(30);

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
}

fn settle() {
    thread::sleep(DEBOUNCE + Duration::from_millis(60));
}

/// Probe answering from a fixed set of taken nicknames, recording calls.
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

/// Profile service that returns a scripted response and records requests.
struct FakeService {
    responses: Mutex<Vec<Result<ProfileRecord, ApiError>>>,
    requests: Mutex<Vec<ProfileCreateRequest>>,
}

impl FakeService {
    fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(vec![Ok(record())]),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn rejecting(code: ApiErrorCode, details: Vec<FieldFailure>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(vec![Err(ApiError::Rejected {
                status: 409,
                body: ApiErrorBody {
                    code,
                    message: "rejected".to_string(),
                    details,
                },
            })]),
            requests: Mutex::new(Vec::new()),
        })
    }
}

fn record() -> ProfileRecord {
    ProfileRecord {
        id: "p_1".to_string(),
        nickname: "johndoe".to_string(),
        name: "John".to_string(),
        surname: "Doe".to_string(),
        created_at: "2026-08-06T10:00:00Z".to_string(),
    }
}

impl ProfileService for FakeService {
    fn check_nickname_availability(
        &self,
        nickname: &str,
    ) -> Result<AvailabilityResponse, ApiError> {
        Ok(AvailabilityResponse {
            available: true,
            nickname: nickname.to_string(),
        })
    }

    fn create_profile(
        &self,
        _auth_token: &str,
        request: &ProfileCreateRequest,
    ) -> Result<ProfileRecord, ApiError> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop()
            .unwrap_or(Err(ApiError::UnexpectedStatus(500)))
    }
}

fn flow_with(taken: Vec<&'static str>) -> WizardFlow {
    let checker = AvailabilityChecker::new(FakeProbe::new(taken), DEBOUNCE);
    WizardFlow::new(checker)
}

/// Fill every step up to and including Sports, landing on the final step.
fn walk_to_final_step(flow: &mut WizardFlow) {
    flow.update_text(Field::FirstName, "John");
    flow.update_text(Field::LastName, "Doe");
    flow.update_text(Field::Email, "john@example.com");
    flow.update_date(
        Field::DateOfBirth,
        Some(NaiveDate::from_ymd_opt(2000, 1, 15).unwrap()),
    );
    assert_eq!(
        flow.next(today()),
        NavigationResult::Moved(WizardStep::Nickname)
    );

    flow.update_text(Field::Nickname, "JohnDoe");
    settle();
    assert_eq!(
        flow.next(today()),
        NavigationResult::Moved(WizardStep::Sports)
    );

    flow.update_sports(vec![SportType::Running, SportType::Climbing]);
    assert_eq!(
        flow.next(today()),
        NavigationResult::Moved(WizardStep::Social)
    );
    assert!(flow.at_final_step());
}

#[test]
fn test_full_flow_submits_projected_request() {
    let mut flow = flow_with(vec![]);
    walk_to_final_step(&mut flow);

    flow.update_text(Field::TwitterUrl, "https://x.com/johndoe");
    flow.update_privacy(Field::ProfileVisibility, PrivacyLevel::Followers);

    let service = FakeService::succeeding();
    let coordinator = SubmissionCoordinator::new(service.clone());

    let outcome = coordinator.submit(&mut flow, "token-123", today());
    let record = match outcome {
        SubmissionOutcome::Created(record) => record,
        other => panic!("expected Created, got {:?}", other),
    };
    assert_eq!(record.nickname, "johndoe");

    // No residual field errors after a successful submit
    assert!(flow.state().errors().is_empty());

    let requests = service.requests.lock();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.name, "John");
    assert_eq!(request.nickname, "johndoe"); // lowercased
    assert_eq!(request.date_of_birth, "2000-01-15");
    assert_eq!(request.instagram_url, None); // absent, not empty
    assert_eq!(request.twitter_url.as_deref(), Some("https://x.com/johndoe"));
}

#[test]
fn test_gate_monotonicity_across_the_wizard() {
    let mut flow = flow_with(vec![]);

    // Identity step: empty form never advances
    assert!(matches!(
        flow.next(today()),
        NavigationResult::Blocked { .. }
    ));
    assert_eq!(flow.current_step(), WizardStep::Identity);

    flow.update_text(Field::FirstName, "John");
    flow.update_text(Field::LastName, "Doe");
    flow.update_text(Field::Email, "john@example.com");
    flow.update_date(
        Field::DateOfBirth,
        Some(NaiveDate::from_ymd_opt(2000, 1, 15).unwrap()),
    );
    flow.next(today());

    // Nickname step: "ab" is too short, no probe traffic, next blocked
    flow.update_text(Field::Nickname, "ab");
    settle();
    assert!(matches!(
        flow.next(today()),
        NavigationResult::Blocked { .. }
    ));
    assert_eq!(
        flow.state().errors().get(Field::Nickname),
        Some("Nickname must be at least 3 characters")
    );

    // Sports step requires at least one selection
    flow.update_text(Field::Nickname, "johndoe");
    settle();
    flow.next(today());
    assert!(matches!(
        flow.next(today()),
        NavigationResult::Blocked { .. }
    ));
    assert_eq!(
        flow.state().errors().get(Field::SportTypes),
        Some("Select at least one sport")
    );
}

#[test]
fn test_taken_nickname_blocks_and_recovers() {
    let mut flow = flow_with(vec!["takennick"]);
    flow.update_text(Field::FirstName, "John");
    flow.update_text(Field::LastName, "Doe");
    flow.update_text(Field::Email, "john@example.com");
    flow.update_date(
        Field::DateOfBirth,
        Some(NaiveDate::from_ymd_opt(2000, 1, 15).unwrap()),
    );
    flow.next(today());

    flow.update_text(Field::Nickname, "takennick");
    settle();

    // Sync rules all pass, yet the taken verdict blocks progression
    assert!(matches!(
        flow.next(today()),
        NavigationResult::Blocked { .. }
    ));
    assert_eq!(
        flow.state().errors().get(Field::Nickname),
        Some("This nickname is already taken")
    );

    // A different, free nickname resolves the conflict automatically
    flow.update_text(Field::Nickname, "freenick");
    settle();
    assert_eq!(
        flow.next(today()),
        NavigationResult::Moved(WizardStep::Sports)
    );
    assert!(flow.state().errors().get(Field::Nickname).is_none());
}

#[test]
fn test_checking_status_blocks_next_until_resolution() {
    // A wide debounce window keeps the check unresolved on purpose
    let checker = AvailabilityChecker::new(FakeProbe::new(vec![]), Duration::from_secs(10));
    let mut flow = WizardFlow::new(checker);
    flow.update_text(Field::FirstName, "John");
    flow.update_text(Field::LastName, "Doe");
    flow.update_text(Field::Email, "john@example.com");
    flow.update_date(
        Field::DateOfBirth,
        Some(NaiveDate::from_ymd_opt(2000, 1, 15).unwrap()),
    );
    flow.next(today());

    flow.update_text(Field::Nickname, "johndoe");
    assert_eq!(flow.nickname_status(), NicknameStatus::Checking);

    let result = flow.next(today());
    assert!(matches!(result, NavigationResult::Blocked { .. }));
    assert_eq!(flow.current_step(), WizardStep::Nickname);
}

#[test]
fn test_submit_age_rejection_lands_on_earlier_step_field() {
    let mut flow = flow_with(vec![]);
    walk_to_final_step(&mut flow);

    let service = FakeService::rejecting(ApiErrorCode::AgeRequirementNotMet, vec![]);
    let coordinator = SubmissionCoordinator::new(service);

    let outcome = coordinator.submit(&mut flow, "token-123", today());
    match outcome {
        SubmissionOutcome::FieldRejections { redirect } => {
            assert_eq!(redirect, Some(WizardStep::Identity));
        }
        other => panic!("expected FieldRejections, got {:?}", other),
    }

    // The error targets the date-of-birth field on the already-passed step
    assert_eq!(
        flow.state().errors().get(Field::DateOfBirth),
        Some("You must be at least 13 years old")
    );
}

#[test]
fn test_submit_nickname_taken_redirects_to_nickname_step() {
    let mut flow = flow_with(vec![]);
    walk_to_final_step(&mut flow);

    let service = FakeService::rejecting(ApiErrorCode::NicknameTaken, vec![]);
    let coordinator = SubmissionCoordinator::new(service);

    let outcome = coordinator.submit(&mut flow, "token-123", today());
    match outcome {
        SubmissionOutcome::FieldRejections { redirect } => {
            assert_eq!(redirect, Some(WizardStep::Nickname));
        }
        other => panic!("expected FieldRejections, got {:?}", other),
    }
    assert_eq!(
        flow.state().errors().get(Field::Nickname),
        Some("This nickname is already taken")
    );
}

#[test]
fn test_submit_profile_already_exists_is_a_redirect_signal() {
    let mut flow = flow_with(vec![]);
    walk_to_final_step(&mut flow);

    let service = FakeService::rejecting(ApiErrorCode::ProfileAlreadyExists, vec![]);
    let coordinator = SubmissionCoordinator::new(service);

    let outcome = coordinator.submit(&mut flow, "token-123", today());
    assert!(matches!(outcome, SubmissionOutcome::AlreadyHasProfile));
    // Not a field error
    assert!(flow.state().errors().is_empty());
}

#[test]
fn test_submit_validation_details_map_to_fields() {
    let mut flow = flow_with(vec![]);
    walk_to_final_step(&mut flow);

    let service = FakeService::rejecting(
        ApiErrorCode::ValidationError,
        vec![
            FieldFailure {
                field: "surname".to_string(),
                message: "Surname is too long".to_string(),
            },
            FieldFailure {
                field: "sportTypes".to_string(),
                message: "Unknown sport".to_string(),
            },
        ],
    );
    let coordinator = SubmissionCoordinator::new(service);

    let outcome = coordinator.submit(&mut flow, "token-123", today());
    match outcome {
        SubmissionOutcome::FieldRejections { redirect } => {
            // Earliest step owning a rejected field
            assert_eq!(redirect, Some(WizardStep::Identity));
        }
        other => panic!("expected FieldRejections, got {:?}", other),
    }
    assert_eq!(
        flow.state().errors().get(Field::LastName),
        Some("Surname is too long")
    );
    assert_eq!(
        flow.state().errors().get(Field::SportTypes),
        Some("Unknown sport")
    );
}

#[test]
fn test_submit_unknown_error_shape_falls_back_to_generic_message() {
    let mut flow = flow_with(vec![]);
    walk_to_final_step(&mut flow);

    let service = FakeService::rejecting(ApiErrorCode::Unknown, vec![]);
    let coordinator = SubmissionCoordinator::new(service);

    let outcome = coordinator.submit(&mut flow, "token-123", today());
    match outcome {
        SubmissionOutcome::Failed { message } => {
            assert!(!message.is_empty());
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[test]
fn test_submit_blocked_away_from_final_step() {
    let mut flow = flow_with(vec![]);

    let service = FakeService::succeeding();
    let coordinator = SubmissionCoordinator::new(service.clone());

    let outcome = coordinator.submit(&mut flow, "token-123", today());
    assert!(matches!(outcome, SubmissionOutcome::BlockedByValidation));
    // The creation call never went out
    assert!(service.requests.lock().is_empty());
}

#[test]
fn test_submit_blocked_when_final_step_invalid() {
    let mut flow = flow_with(vec![]);
    walk_to_final_step(&mut flow);

    flow.update_text(Field::InstagramUrl, "not a url");

    let service = FakeService::succeeding();
    let coordinator = SubmissionCoordinator::new(service.clone());

    let outcome = coordinator.submit(&mut flow, "token-123", today());
    assert!(matches!(outcome, SubmissionOutcome::BlockedByValidation));
    assert_eq!(
        flow.state().errors().get(Field::InstagramUrl),
        Some("Enter a valid Instagram URL")
    );
    assert!(service.requests.lock().is_empty());
}

#[test]
fn test_probe_sees_exactly_one_call_for_rapid_typing() {
    let probe = FakeProbe::new(vec![]);
    let checker = AvailabilityChecker::new(probe.clone(), DEBOUNCE);
    let mut flow = WizardFlow::new(checker);

    for value in ["j", "jo", "joh", "john", "johnd", "johndo", "johndoe"] {
        flow.update_text(Field::Nickname, value);
        thread::sleep(Duration::from_millis(3));
    }
    settle();

    // Values below the length floor never reach the probe; the survivors
    // coalesce into a single call for the last value
    assert_eq!(probe.calls.lock().clone(), vec!["johndoe".to_string()]);
    assert_eq!(flow.nickname_status(), NicknameStatus::Available);
}
