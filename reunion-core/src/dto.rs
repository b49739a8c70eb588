//! Request and response payloads of the reunion API.
//!
//! Field names follow the server's JSON. Unknown fields are ignored, so the
//! server may send more than is modelled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when parsing a [`Course`] or [`FoodPreference`] fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} {value:?}; expected one of: {expected}")]
pub struct ParseChoiceError {
    kind: &'static str,
    value: String,
    expected: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Course {
    #[serde(rename = "SOFTWARESYSTEMS")]
    SoftwareSystems,
    #[serde(rename = "CYBERSECURITY")]
    CyberSecurity,
    #[serde(rename = "DATASCIENCE")]
    DataScience,
    #[serde(rename = "THEORETICALCOMPUTERSCIENCE")]
    TheoreticalComputerScience,
    #[serde(rename = "APPLIEDMATHEMATICS")]
    AppliedMathematics,
}

impl Course {
    pub const ALL: [Course; 5] = [
        Course::SoftwareSystems,
        Course::CyberSecurity,
        Course::DataScience,
        Course::TheoreticalComputerScience,
        Course::AppliedMathematics,
    ];

    /// Wire name of the course.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoftwareSystems => "SOFTWARESYSTEMS",
            Self::CyberSecurity => "CYBERSECURITY",
            Self::DataScience => "DATASCIENCE",
            Self::TheoreticalComputerScience => "THEORETICALCOMPUTERSCIENCE",
            Self::AppliedMathematics => "APPLIEDMATHEMATICS",
        }
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Course {
    type Err = ParseChoiceError;

    /// Accepts the wire name in any case, with or without `-`/`_` separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_' && !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        Self::ALL
            .into_iter()
            .find(|course| course.as_str() == normalized)
            .ok_or_else(|| ParseChoiceError {
                kind: "course",
                value: s.to_string(),
                expected: Self::ALL.map(|c| c.as_str()).join(", "),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoodPreference {
    Veg,
    NonVeg,
}

impl FoodPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Veg => "Veg",
            Self::NonVeg => "NonVeg",
        }
    }
}

impl fmt::Display for FoodPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FoodPreference {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "veg" => Ok(Self::Veg),
            "nonveg" => Ok(Self::NonVeg),
            _ => Err(ParseChoiceError {
                kind: "food preference",
                value: s.to_string(),
                expected: "Veg, NonVeg".to_string(),
            }),
        }
    }
}

// Authentication

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupProfile {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    #[serde(default)]
    pub profile: Option<SignupProfile>,
    #[serde(default)]
    pub is_profile_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifyOtpResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInResponse {
    pub message: String,
    pub access_token: String,
    /// Absent for accounts that never needed profile completion.
    #[serde(default, rename = "isProfileCompleted")]
    pub is_profile_completed: Option<bool>,
}

impl SignInResponse {
    /// Whether the user still has to complete their profile.
    pub fn needs_profile(&self) -> bool {
        self.is_profile_completed == Some(false)
    }
}

/// Token claims of the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaims {
    pub sub: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub rollno: Option<String>,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default)]
    pub is_profile_completed: bool,
}

impl UserClaims {
    /// When the token expires.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfileResponse {
    pub user: UserClaims,
}

// Profile

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub food_preference: FoodPreference,
    pub addr: String,
    pub course: Course,
    pub designation: String,
    pub gender: String,
    pub gradyear: i32,
    pub rollno: String,
    pub phonenumber: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateResponse {
    pub message: String,
    #[serde(default)]
    pub is_profile_complete: bool,
}

// Events

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub event_name: String,
    pub about: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEventResponse {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedActivity {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingingRequest {
    pub event: String,
    pub song_details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Spelled as the server expects it.
    pub need_karoke: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingingResponse {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub event: String,
    pub song_details: String,
    #[serde(default)]
    pub topic: Option<String>,
    pub need_karoke: bool,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivities {
    #[serde(default)]
    pub joined_activities: Vec<JoinedActivity>,
    #[serde(default)]
    pub added_activities: Vec<SingingResponse>,
}

// Admin analytics

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodPreferenceCount {
    pub veg_food_count: u64,
    pub nonveg_food_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderCount {
    pub male_count: u64,
    pub female_count: u64,
    pub pref_not_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraduationYearTally {
    pub graduation_year: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraduationYearBucket {
    #[serde(rename = "_count")]
    pub count: GraduationYearTally,
    /// `None` groups users who have not filled in a year.
    pub graduation_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradYearCount {
    pub grad_year_count: Vec<GraduationYearBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileRecord {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub roll_number: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<i32>,
    #[serde(default)]
    pub course: Option<Course>,
}

/// One row of the admin user list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub role: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, rename = "isOTPVerified")]
    pub is_otp_verified: bool,
    #[serde(default)]
    pub food_preference: Option<FoodPreference>,
    #[serde(default)]
    pub profile: Option<UserProfileRecord>,
}
