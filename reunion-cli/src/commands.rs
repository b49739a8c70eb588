//! Command handlers.
//!
//! Each handler drives one or more accessors of a [`ReunionApi`] and writes
//! its feedback to `out`. API failures are reported as notices and give
//! [`Status::Failed`]; only I/O errors on `out` are returned as `Err`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use reunion_core::dto::{
    Event, ProfileUpdateRequest, SignInRequest, SignupRequest, SingingRequest, VerifyOtpRequest,
};
use reunion_core::{ApiError, Callbacks, ReadState, ReunionApi, Secret, WriteState};
use std::io::Write;
use tracing::debug;

use crate::messages::{Action, Notice, describe_failure};

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Done,
    Failed,
}

fn read_result<T>(state: ReadState<T>) -> Result<T, ApiError> {
    state.into_result().unwrap_or_else(|| {
        Err(ApiError::Network {
            message: "read did not settle".to_string(),
        })
    })
}

fn write_result<T>(state: WriteState<T>) -> Result<T, ApiError> {
    state.into_result().unwrap_or_else(|| {
        Err(ApiError::Network {
            message: "write did not settle".to_string(),
        })
    })
}

/// Print the notices for a failure.
fn report(out: &mut impl Write, action: Action, err: &ApiError) -> Result<Status> {
    debug!(?action, error = %err, "Command failed");
    let notices = describe_failure(action, err);
    for notice in &notices {
        writeln!(out, "{}", notice)?;
    }
    if notices.iter().any(Notice::is_error) {
        Ok(Status::Failed)
    } else {
        Ok(Status::Done)
    }
}

fn fail(out: &mut impl Write, text: &str) -> Result<Status> {
    writeln!(out, "{}", Notice::error(text))?;
    Ok(Status::Failed)
}

fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%d %b %Y").to_string()
}

/// Whether `otp` is exactly four ASCII digits.
pub fn is_valid_otp(otp: &str) -> bool {
    otp.len() == 4 && otp.bytes().all(|b| b.is_ascii_digit())
}

pub async fn signup(api: &ReunionApi, out: &mut impl Write, request: SignupRequest) -> Result<Status> {
    let email = request.email.clone();
    let state = api.signup().trigger(request, Callbacks::default()).await;

    match write_result(state) {
        Ok(response) => {
            writeln!(out, "{}", response.message)?;
            api.session().stage_email(&email).await;
            writeln!(out, "Check your inbox, then run `reunion verify-otp <OTP>`.")?;
            Ok(Status::Done)
        }
        Err(err) => report(out, Action::Signup, &err),
    }
}

pub async fn verify_otp(
    api: &ReunionApi,
    out: &mut impl Write,
    otp: &str,
    email: Option<String>,
) -> Result<Status> {
    let session = api.session();
    let email = match email {
        Some(email) => email,
        None => match session.staged_email().await {
            Some(email) => email,
            None => return fail(out, "No email found! Run `reunion signup` first."),
        },
    };

    if !is_valid_otp(otp) {
        return fail(out, "OTP must be a 4-digit number.");
    }

    let request = VerifyOtpRequest {
        email,
        otp: otp.to_string(),
    };
    let state = api.verify_otp().trigger(request, Callbacks::default()).await;

    match write_result(state) {
        Ok(response) => {
            session.clear_staged_email().await;
            let message = response
                .message
                .unwrap_or_else(|| "OTP Verified.".to_string());
            writeln!(out, "{} You can now run `reunion signin`.", message)?;
            Ok(Status::Done)
        }
        Err(err) => report(out, Action::VerifyOtp, &err),
    }
}

pub async fn signin(api: &ReunionApi, out: &mut impl Write, request: SignInRequest) -> Result<Status> {
    let state = api.signin().trigger(request, Callbacks::default()).await;

    match write_result(state) {
        Ok(response) => {
            writeln!(out, "{}", response.message)?;
            api.session()
                .set_access_token(&Secret::new(response.access_token.as_str()))
                .await;
            if response.needs_profile() {
                writeln!(out, "Your profile is incomplete. Run `reunion profile update` to finish it.")?;
            }
            Ok(Status::Done)
        }
        Err(err) => report(out, Action::SignIn, &err),
    }
}

pub async fn signout(api: &ReunionApi, out: &mut impl Write) -> Result<Status> {
    api.session().sign_out().await;
    writeln!(out, "Signed out.")?;
    Ok(Status::Done)
}

pub async fn show_profile(api: &ReunionApi, out: &mut impl Write) -> Result<Status> {
    let user = match read_result(api.me().observe().await) {
        Ok(profile) => profile.user,
        Err(err) => return report(out, Action::ShowProfile, &err),
    };

    writeln!(out, "Name:    {}", user.name)?;
    writeln!(out, "Email:   {}", user.email)?;
    if let Some(rollno) = &user.rollno {
        writeln!(out, "Roll no: {}", rollno)?;
    }
    writeln!(out, "Role:    {}", user.role)?;
    writeln!(
        out,
        "Profile: {}",
        if user.is_profile_completed { "complete" } else { "incomplete" }
    )?;
    if let Some(expires) = user.expires_at() {
        writeln!(out, "Session expires {}", expires.format("%Y-%m-%d %H:%M UTC"))?;
    }
    Ok(Status::Done)
}

pub async fn update_profile(
    api: &ReunionApi,
    out: &mut impl Write,
    request: ProfileUpdateRequest,
) -> Result<Status> {
    let state = api.update_profile().trigger(request, Callbacks::default()).await;

    match write_result(state) {
        Ok(_) => {
            writeln!(out, "Profile updated successfully!")?;
            Ok(Status::Done)
        }
        Err(err) => report(out, Action::UpdateProfile, &err),
    }
}

fn write_events(out: &mut impl Write, events: &[Event]) -> Result<()> {
    if events.is_empty() {
        writeln!(out, "  No events yet.")?;
    }
    for event in events {
        writeln!(
            out,
            "  {:<24}  {}  ({})",
            event.id,
            event.event_name,
            format_date(&event.created_at)
        )?;
    }
    Ok(())
}

pub async fn list_events(api: &ReunionApi, out: &mut impl Write) -> Result<Status> {
    match read_result(api.events().observe().await) {
        Ok(events) => {
            writeln!(out, "Events:")?;
            write_events(out, &events)?;
            Ok(Status::Done)
        }
        Err(err) => report(out, Action::LoadEvents, &err),
    }
}

pub async fn show_event(api: &ReunionApi, out: &mut impl Write, event_id: &str) -> Result<Status> {
    match read_result(api.event(event_id).observe().await) {
        Ok(event) => {
            writeln!(out, "{}", event.event_name)?;
            writeln!(out, "  Posted {}", format_date(&event.created_at))?;
            writeln!(out)?;
            writeln!(out, "{}", event.about)?;
            Ok(Status::Done)
        }
        Err(err) => report(out, Action::LoadEvent, &err),
    }
}

pub async fn join_event(api: &ReunionApi, out: &mut impl Write, event_id: &str) -> Result<Status> {
    let state = api.join_event(event_id).trigger((), Callbacks::default()).await;

    match write_result(state) {
        Ok(_) => {
            writeln!(out, "Successfully registered for the event!")?;
            Ok(Status::Done)
        }
        Err(err) => report(out, Action::JoinEvent, &err),
    }
}

pub async fn add_singing(api: &ReunionApi, out: &mut impl Write, request: SingingRequest) -> Result<Status> {
    let state = api.add_singing().trigger(request, Callbacks::default()).await;

    match write_result(state) {
        Ok(singing) => {
            writeln!(out, "Song \"{}\" added successfully!", singing.song_details)?;
            Ok(Status::Done)
        }
        Err(err) => report(out, Action::AddSinging, &err),
    }
}

/// Events, joined activities and added songs in one view.
pub async fn dashboard(api: &ReunionApi, out: &mut impl Write) -> Result<Status> {
    let events = api.events();
    let activities = api.user_activities();
    let (events, activities) = tokio::join!(events.observe(), activities.observe());

    let (events, activities) = match (read_result(events), read_result(activities)) {
        (Ok(events), Ok(activities)) => (events, activities),
        (Err(err), _) | (_, Err(err)) => return report(out, Action::Dashboard, &err),
    };

    writeln!(out, "Events:")?;
    write_events(out, &events)?;

    writeln!(out, "Joined:")?;
    if activities.joined_activities.is_empty() {
        writeln!(out, "  Nothing joined yet.")?;
    }
    for joined in &activities.joined_activities {
        writeln!(
            out,
            "  {}  (joined {})",
            joined.event.event_name,
            format_date(&joined.created_at)
        )?;
    }

    writeln!(out, "Performances:")?;
    if activities.added_activities.is_empty() {
        writeln!(out, "  No songs added yet.")?;
    }
    for singing in &activities.added_activities {
        let karaoke = if singing.need_karoke { ", karaoke" } else { "" };
        writeln!(out, "  {}: {}{}", singing.event, singing.song_details, karaoke)?;
    }
    Ok(Status::Done)
}

/// Attendance analytics for administrators.
pub async fn admin(api: &ReunionApi, out: &mut impl Write) -> Result<Status> {
    let food = api.food_preference_count();
    let gender = api.gender_count();
    let years = api.grad_year_count();
    let users = api.all_users();
    let (food, gender, years, users) = tokio::join!(
        food.observe(),
        gender.observe(),
        years.observe(),
        users.observe(),
    );

    let loaded = read_result(food).and_then(|food| {
        Ok((
            food,
            read_result(gender)?,
            read_result(years)?,
            read_result(users)?,
        ))
    });
    let (food, gender, years, users) = match loaded {
        Ok(loaded) => loaded,
        Err(err) => return report(out, Action::Admin, &err),
    };

    writeln!(out, "Food preference:")?;
    writeln!(out, "  Veg      {}", food.veg_food_count)?;
    writeln!(out, "  Non-veg  {}", food.nonveg_food_count)?;

    writeln!(out, "Gender:")?;
    writeln!(out, "  Male               {}", gender.male_count)?;
    writeln!(out, "  Female             {}", gender.female_count)?;
    writeln!(out, "  Prefer not to say  {}", gender.pref_not_count)?;

    writeln!(out, "Graduation year:")?;
    for bucket in &years.grad_year_count {
        let year = bucket
            .graduation_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        writeln!(out, "  {:<8} {}", year, bucket.count.graduation_year)?;
    }

    writeln!(out, "Users ({}):", users.len())?;
    for user in &users {
        let name = user
            .profile
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("-");
        writeln!(
            out,
            "  {:<32} {:<20} {:<6} verified={} profile={}",
            user.email, name, user.role, user.is_otp_verified, user.is_completed
        )?;
    }
    Ok(Status::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reunion_core::{ApiClient, DataAccess, Endpoints, MemoryStore, StoreAdapter};
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path},
    };

    fn api_for(server: &MockServer) -> ReunionApi {
        let store = StoreAdapter::new(MemoryStore::new());
        ReunionApi::new(
            DataAccess::new(ApiClient::new(store)),
            Endpoints::parse(&server.uri()).unwrap(),
        )
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_otp_validation() {
        assert!(is_valid_otp("0421"));
        assert!(!is_valid_otp("421"));
        assert!(!is_valid_otp("04211"));
        assert!(!is_valid_otp("04a1"));
    }

    #[tokio::test]
    async fn test_signup_stages_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/signup"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "message": "OTP sent to your email"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let mut out = Vec::new();
        let status = signup(
            &api,
            &mut out,
            SignupRequest {
                email: "a@b.com".to_string(),
                password: "secret".to_string(),
                name: "Asha".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(status, Status::Done);
        assert!(output(out).starts_with("OTP sent to your email\n"));
        assert_eq!(api.session().staged_email().await.as_deref(), Some("a@b.com"));
    }

    #[tokio::test]
    async fn test_signup_existing_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/signup"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "message": "User already exists" })),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        let mut out = Vec::new();
        let status = signup(
            &api,
            &mut out,
            SignupRequest {
                email: "a@b.com".to_string(),
                password: "secret".to_string(),
                name: "Asha".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(status, Status::Failed);
        assert_eq!(
            output(out),
            "error: This email is already registered. Try logging in.\n"
        );
        assert!(api.session().staged_email().await.is_none());
    }

    #[tokio::test]
    async fn test_verify_otp_rejects_short_code_without_calling() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let mut out = Vec::new();
        let status = verify_otp(&api, &mut out, "123", Some("a@b.com".to_string()))
            .await
            .unwrap();

        assert_eq!(status, Status::Failed);
        assert_eq!(output(out), "error: OTP must be a 4-digit number.\n");
    }

    #[tokio::test]
    async fn test_verify_otp_requires_email() {
        let server = MockServer::start().await;
        let api = api_for(&server);
        let mut out = Vec::new();

        let status = verify_otp(&api, &mut out, "1234", None).await.unwrap();
        assert_eq!(status, Status::Failed);
        assert!(output(out).contains("No email found!"));
    }

    #[tokio::test]
    async fn test_verify_otp_uses_staged_email_and_clears_it() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/auth/verifyotp"))
            .and(body_json(json!({ "email": "a@b.com", "otp": "1234" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Verified." })))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        api.session().stage_email("a@b.com").await;

        let mut out = Vec::new();
        let status = verify_otp(&api, &mut out, "1234", None).await.unwrap();

        assert_eq!(status, Status::Done);
        assert!(api.session().staged_email().await.is_none());
    }

    #[tokio::test]
    async fn test_signin_stores_token_for_later_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/signin"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "message": "Signed in successfully",
                "access_token": "tok-9",
                "isProfileCompleted": false
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/events/ev-1/join"))
            .and(header("Authorization", "Bearer tok-9"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let mut out = Vec::new();
        let status = signin(
            &api,
            &mut out,
            SignInRequest {
                email: "a@b.com".to_string(),
                password: "secret".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(status, Status::Done);
        assert!(output(out).contains("reunion profile update"));

        let mut out = Vec::new();
        let status = join_event(&api, &mut out, "ev-1").await.unwrap();
        assert_eq!(status, Status::Done);
        assert_eq!(output(out), "Successfully registered for the event!\n");
    }

    #[tokio::test]
    async fn test_join_event_already_joined_is_not_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/events/ev-1/join"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "message": "User already joined the activity"
            })))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let mut out = Vec::new();
        let status = join_event(&api, &mut out, "ev-1").await.unwrap();

        assert_eq!(status, Status::Done);
        assert_eq!(output(out), "You are already registered for this event.\n");
    }

    #[tokio::test]
    async fn test_profile_signed_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthorized" })))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let mut out = Vec::new();
        let status = show_profile(&api, &mut out).await.unwrap();

        assert_eq!(status, Status::Failed);
        assert_eq!(
            output(out),
            "error: You've been signed out. Please sign in again.\n"
        );
    }

    #[tokio::test]
    async fn test_dashboard_lists_events_and_activities() {
        let server = MockServer::start().await;
        let event = json!({
            "id": "ev-1",
            "createdAt": "2024-11-02T10:00:00.000Z",
            "updatedAt": "2024-11-02T10:00:00.000Z",
            "eventName": "Gala Dinner",
            "about": "Dinner in the main hall"
        });
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([event.clone()])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/events/user/activities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "joinedActivities": [{
                    "id": "j1",
                    "eventId": "ev-1",
                    "userId": "u1",
                    "createdAt": "2024-11-03T10:00:00.000Z",
                    "event": event
                }],
                "addedActivities": []
            })))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let mut out = Vec::new();
        let status = dashboard(&api, &mut out).await.unwrap();
        let text = output(out);

        assert_eq!(status, Status::Done);
        assert!(text.contains("Gala Dinner  (02 Nov 2024)"));
        assert!(text.contains("Gala Dinner  (joined 03 Nov 2024)"));
        assert!(text.contains("No songs added yet."));
    }

    #[tokio::test]
    async fn test_admin_failure_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "Forbidden" })))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let mut out = Vec::new();
        let status = admin(&api, &mut out).await.unwrap();

        assert_eq!(status, Status::Failed);
        assert_eq!(
            output(out),
            "error: Unauthorized or failed to load data. Please sign in again.\n"
        );
    }
}
