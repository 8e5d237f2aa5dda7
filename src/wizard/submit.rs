/// Submission coordinator
///
/// At the terminal step, projects the accumulated form into the profile
/// service's request shape, performs the creation call exactly once per
/// submit action, and maps rejection codes back onto fields and steps.
/// Every path resolves to a `SubmissionOutcome`; nothing escapes uncaught.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::api::{ApiErrorCode, ProfileCreateRequest, ProfileRecord, ProfileService};
use crate::error::ApiError;
use crate::fields::{Field, FormState};
use crate::validation::{MIN_AGE_YEARS, MSG_NICKNAME_TAKEN};

use super::flow::WizardFlow;
use super::steps::WizardStep;

/// Outcome of a submit action.
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Profile created; hand it to the caller for downstream navigation
    Created(ProfileRecord),

    /// The terminal step failed its gate; messages are in the error map
    BlockedByValidation,

    /// A submit is already in flight; this call did nothing
    AlreadyInFlight,

    /// The server rejected specific fields; messages were written into the
    /// error map, and `redirect` names the earliest step that owns one of
    /// the offending fields (even if that step was already passed)
    FieldRejections { redirect: Option<WizardStep> },

    /// The account already has a profile - a redirect signal, not an error
    AlreadyHasProfile,

    /// Network failure or an unrecognized error shape
    Failed { message: String },
}

/// Coordinates profile submission against the remote service.
pub struct SubmissionCoordinator {
    service: Arc<dyn ProfileService>,
    in_flight: AtomicBool,
}

impl SubmissionCoordinator {
    pub fn new(service: Arc<dyn ProfileService>) -> Self {
        Self {
            service,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Submit the accumulated form. Preconditions: the flow sits on the
    /// terminal step and that step passes the same gate `next` applies.
    pub fn submit(
        &self,
        flow: &mut WizardFlow,
        auth_token: &str,
        today: NaiveDate,
    ) -> SubmissionOutcome {
        if !flow.at_final_step() {
            warn!("submit requested away from the terminal step");
            return SubmissionOutcome::BlockedByValidation;
        }
        if !flow.gate(WizardStep::Social, today) {
            return SubmissionOutcome::BlockedByValidation;
        }

        // Re-entrancy guard: one creation call per submit action
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return SubmissionOutcome::AlreadyInFlight;
        }

        let request = build_request(flow.state().form());
        let result = self.service.create_profile(auth_token, &request);
        self.in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(record) => {
                info!("profile created: {}", record.nickname);
                flow.state_mut().errors_mut().clear_all();
                SubmissionOutcome::Created(record)
            }
            Err(ApiError::Rejected { body, .. }) => match body.code {
                ApiErrorCode::NicknameTaken => {
                    flow.state_mut()
                        .errors_mut()
                        .set(Field::Nickname, MSG_NICKNAME_TAKEN);
                    SubmissionOutcome::FieldRejections {
                        redirect: Some(WizardStep::containing(Field::Nickname)),
                    }
                }
                ApiErrorCode::EmailTaken => {
                    flow.state_mut()
                        .errors_mut()
                        .set(Field::Email, "This email is already in use");
                    SubmissionOutcome::FieldRejections {
                        redirect: Some(WizardStep::containing(Field::Email)),
                    }
                }
                ApiErrorCode::AgeRequirementNotMet => {
                    flow.state_mut().errors_mut().set(
                        Field::DateOfBirth,
                        format!("You must be at least {} years old", MIN_AGE_YEARS),
                    );
                    SubmissionOutcome::FieldRejections {
                        redirect: Some(WizardStep::containing(Field::DateOfBirth)),
                    }
                }
                ApiErrorCode::ProfileAlreadyExists => SubmissionOutcome::AlreadyHasProfile,
                ApiErrorCode::ValidationError => {
                    let mut redirect: Option<WizardStep> = None;
                    let mut unmapped = Vec::new();
                    for detail in &body.details {
                        match Field::from_api_name(&detail.field) {
                            Some(field) => {
                                flow.state_mut()
                                    .errors_mut()
                                    .set(field, detail.message.clone());
                                let step = WizardStep::containing(field);
                                redirect = Some(match redirect {
                                    Some(current) if current.number() <= step.number() => current,
                                    _ => step,
                                });
                            }
                            None => unmapped.push(detail.message.clone()),
                        }
                    }
                    if redirect.is_none() {
                        // Nothing mapped to a field; fall back to a generic message
                        let message = if unmapped.is_empty() {
                            body.message.clone()
                        } else {
                            unmapped.join("; ")
                        };
                        return SubmissionOutcome::Failed { message };
                    }
                    SubmissionOutcome::FieldRejections { redirect }
                }
                ApiErrorCode::Unknown => {
                    warn!("profile service returned unknown error code: {}", body.message);
                    SubmissionOutcome::Failed {
                        message: "Could not create your profile. Please try again.".to_string(),
                    }
                }
            },
            Err(err) => {
                warn!("profile creation failed: {err}");
                SubmissionOutcome::Failed {
                    message: "Could not reach the profile service. Please try again.".to_string(),
                }
            }
        }
    }
}

/// Project the form into the wire shape: trimmed strings, absent (not
/// empty) optionals, lowercased nickname, ISO date of birth.
pub fn build_request(form: &FormState) -> ProfileCreateRequest {
    ProfileCreateRequest {
        name: form.text(Field::FirstName).trim().to_string(),
        surname: form.text(Field::LastName).trim().to_string(),
        nickname: form.text(Field::Nickname).trim().to_lowercase(),
        email: form.text(Field::Email).trim().to_string(),
        date_of_birth: form
            .date(Field::DateOfBirth)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        sport_types: form.sports().to_vec(),
        instagram_url: optional_text(form, Field::InstagramUrl),
        twitter_url: optional_text(form, Field::TwitterUrl),
        youtube_url: optional_text(form, Field::YoutubeUrl),
        profile_visibility: Some(form.privacy(Field::ProfileVisibility)),
        activity_visibility: Some(form.privacy(Field::ActivityVisibility)),
    }
}

fn optional_text(form: &FormState, field: Field) -> Option<String> {
    let value = form.text(field).trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{PrivacyLevel, SportType};
    use chrono::NaiveDate;

    fn filled_form() -> FormState {
        let mut form = FormState::new();
        form.set_text(Field::FirstName, "  Ada ");
        form.set_text(Field::LastName, "Lovelace");
        form.set_text(Field::Email, " ada@example.com ");
        form.set_date(
            Field::DateOfBirth,
            Some(NaiveDate::from_ymd_opt(1999, 12, 10).unwrap()),
        );
        form.set_text(Field::Nickname, "Ada_L");
        form.set_sports(vec![SportType::Cycling, SportType::Running]);
        form.set_text(Field::TwitterUrl, "https://x.com/ada_l");
        form.set_privacy(Field::ProfileVisibility, PrivacyLevel::Followers);
        form
    }

    #[test]
    fn test_build_request_trims_and_normalizes() {
        let request = build_request(&filled_form());

        assert_eq!(request.name, "Ada");
        assert_eq!(request.email, "ada@example.com");
        // Nickname casing is normalized on the way out
        assert_eq!(request.nickname, "ada_l");
        assert_eq!(request.date_of_birth, "1999-12-10");
        assert_eq!(request.sport_types.len(), 2);
    }

    #[test]
    fn test_build_request_omits_empty_optionals() {
        let request = build_request(&filled_form());

        assert_eq!(request.instagram_url, None);
        assert_eq!(request.twitter_url.as_deref(), Some("https://x.com/ada_l"));
        assert_eq!(request.youtube_url, None);
        assert_eq!(request.profile_visibility, Some(PrivacyLevel::Followers));
    }

    #[test]
    fn test_build_request_whitespace_only_optional_is_absent() {
        let mut form = filled_form();
        form.set_text(Field::InstagramUrl, "   ");
        let request = build_request(&form);
        assert_eq!(request.instagram_url, None);
    }
}
