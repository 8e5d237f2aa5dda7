/// Remote profile service client
///
/// Two operations: an idempotent nickname-availability lookup and the
/// profile-creation call. Failures are decoded into machine-readable codes
/// so the submission coordinator can map them back onto fields and steps.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::availability::AvailabilityProbe;
use crate::error::ApiError;
use crate::fields::{PrivacyLevel, SportType};

/// Response of the availability lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub nickname: String,
}

/// Payload of the profile-creation call. Built once, at submission, from the
/// full form; optional fields are absent rather than empty strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCreateRequest {
    pub name: String,
    pub surname: String,
    pub nickname: String,
    pub email: String,
    /// ISO date, e.g. "2001-05-20"
    pub date_of_birth: String,
    pub sport_types: Vec<SportType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_visibility: Option<PrivacyLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_visibility: Option<PrivacyLevel>,
}

/// The created profile as returned by the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: String,
    pub nickname: String,
    pub name: String,
    pub surname: String,
    pub created_at: String,
}

/// Machine-readable failure codes the service is documented to return.
/// Unknown codes are tolerated and fall back to a generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ApiErrorCode {
    #[serde(rename = "NICKNAME_TAKEN")]
    NicknameTaken,
    #[serde(rename = "EMAIL_TAKEN")]
    EmailTaken,
    #[serde(rename = "PROFILE_ALREADY_EXISTS")]
    ProfileAlreadyExists,
    #[serde(rename = "AGE_REQUIREMENT_NOT_MET")]
    AgeRequirementNotMet,
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
    #[serde(other)]
    Unknown,
}

/// One per-field detail inside a VALIDATION_ERROR body. Field names use the
/// payload contract ("surname", "dateOfBirth", ...).
#[derive(Debug, Clone, Deserialize)]
pub struct FieldFailure {
    pub field: String,
    pub message: String,
}

/// Error body shape: `{ code, message, details? }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: ApiErrorCode,
    pub message: String,
    #[serde(default)]
    pub details: Vec<FieldFailure>,
}

/// The two remote operations, behind a trait so the wizard is testable
/// without a server.
pub trait ProfileService: Send + Sync {
    fn check_nickname_availability(&self, nickname: &str)
        -> Result<AvailabilityResponse, ApiError>;

    fn create_profile(
        &self,
        auth_token: &str,
        request: &ProfileCreateRequest,
    ) -> Result<ProfileRecord, ApiError>;
}

/// HTTP client for the profile service.
pub struct ProfileApiClient {
    base_url: String,
    timeout: Duration,
}

impl ProfileApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, timeout }
    }

    fn user_agent() -> String {
        format!("SportLinkOnboarding/{}", env!("CARGO_PKG_VERSION"))
    }
}

impl ProfileService for ProfileApiClient {
    fn check_nickname_availability(
        &self,
        nickname: &str,
    ) -> Result<AvailabilityResponse, ApiError> {
        let url = format!("{}/profiles/nickname-availability", self.base_url);
        debug!("checking nickname availability: {nickname}");

        let response = ureq::get(&url)
            .query("nickname", nickname)
            .set("User-Agent", &Self::user_agent())
            .set("Accept", "application/json")
            .timeout(self.timeout)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => ApiError::UnexpectedStatus(code),
                other => ApiError::Network(Box::new(other)),
            })?;

        response
            .into_json::<AvailabilityResponse>()
            .map_err(|e| ApiError::Decode(Box::new(e)))
    }

    fn create_profile(
        &self,
        auth_token: &str,
        request: &ProfileCreateRequest,
    ) -> Result<ProfileRecord, ApiError> {
        let url = format!("{}/profiles", self.base_url);
        debug!("creating profile for nickname '{}'", request.nickname);

        let result = ureq::post(&url)
            .set("User-Agent", &Self::user_agent())
            .set("Accept", "application/json")
            .set("Authorization", &format!("Bearer {auth_token}"))
            .timeout(self.timeout)
            .send_json(request);

        match result {
            Ok(response) => response
                .into_json::<ProfileRecord>()
                .map_err(|e| ApiError::Decode(Box::new(e))),
            Err(ureq::Error::Status(status, response)) => {
                // Rejections carry a machine-readable body
                match response.into_json::<ApiErrorBody>() {
                    Ok(body) => Err(ApiError::Rejected { status, body }),
                    Err(e) => {
                        warn!("profile service returned {status} with an undecodable body: {e}");
                        Err(ApiError::UnexpectedStatus(status))
                    }
                }
            }
            Err(other) => Err(ApiError::Network(Box::new(other))),
        }
    }
}

impl AvailabilityProbe for ProfileApiClient {
    fn check(&self, nickname: &str) -> Result<bool, ApiError> {
        self.check_nickname_availability(nickname)
            .map(|response| response.available)
    }
}
