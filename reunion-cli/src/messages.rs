//! User-facing messages for failed API calls.
//!
//! Each command maps an [`ApiError`] to one or more notices. The wording
//! matches what the web client shows for the same failure.

use reunion_core::ApiError;
use serde_json::Value;
use std::fmt;

pub const NETWORK_ERROR: &str = "Network error. Please check your connection.";
pub const SERVER_ERROR: &str = "Server error! Please try again later.";
pub const INVALID_REQUEST: &str = "Invalid request. Please check your input.";
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong.";
pub const SIGNED_OUT: &str = "You've been signed out. Please sign in again.";

/// The command a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Signup,
    SignIn,
    VerifyOtp,
    UpdateProfile,
    ShowProfile,
    LoadEvents,
    LoadEvent,
    JoinEvent,
    AddSinging,
    Dashboard,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// One line of feedback for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Level::Info => write!(f, "{}", self.text),
            Level::Error => write!(f, "error: {}", self.text),
        }
    }
}

/// The `message` field of an error body.
enum ServerMessage<'a> {
    List(Vec<&'a str>),
    Text(&'a str),
    Missing,
}

fn server_message(err: &ApiError) -> ServerMessage<'_> {
    match err.body().and_then(|body| body.get("message")) {
        Some(Value::Array(items)) => {
            ServerMessage::List(items.iter().filter_map(Value::as_str).collect())
        }
        Some(Value::String(text)) => ServerMessage::Text(text),
        _ => ServerMessage::Missing,
    }
}

fn errors<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<Notice> {
    texts.into_iter().map(Notice::error).collect()
}

/// Notices for `err` raised while running `action`.
pub fn describe_failure(action: Action, err: &ApiError) -> Vec<Notice> {
    match action {
        Action::Signup => auth_failure(
            err,
            "User already exists",
            "This email is already registered. Try logging in.",
        ),
        Action::SignIn => auth_failure(
            err,
            "User is not OTP verified",
            "Please verify your OTP first.",
        ),
        Action::VerifyOtp => match err.status() {
            Some(401) => errors(["Invalid OTP. Please try again."]),
            _ => errors(["Something went wrong. Try again."]),
        },
        Action::UpdateProfile => match (err.status(), server_message(err)) {
            (None, _) if err.is_network() => errors([NETWORK_ERROR]),
            (Some(401), _) => errors(["Unauthorized! Please login again."]),
            (Some(400), ServerMessage::List(list)) => errors(list),
            (Some(400), ServerMessage::Text(text)) => errors([text]),
            _ => errors(["An error occurred. Please try again later."]),
        },
        Action::JoinEvent => match server_message(err) {
            ServerMessage::Text("User already joined the activity") => {
                vec![Notice::info("You are already registered for this event.")]
            }
            _ => errors(["Failed to register for the event."]),
        },
        Action::AddSinging => match (err.status(), server_message(err)) {
            (Some(401), _) => errors(["Unauthorized. Please log in again."]),
            (_, ServerMessage::Text(text)) => errors([text]),
            _ => errors(["Failed to add song."]),
        },
        Action::ShowProfile => errors([SIGNED_OUT]),
        Action::LoadEvents | Action::Dashboard => errors(["Failed to load events or activities."]),
        Action::LoadEvent => errors(["Failed to load event details."]),
        Action::Admin => errors(["Unauthorized or failed to load data. Please sign in again."]),
    }
}

/// Shared handling of signup and sign-in failures.
fn auth_failure(err: &ApiError, known: &str, friendly: &str) -> Vec<Notice> {
    let Some(status) = err.status() else {
        return match err {
            ApiError::Network { .. } => errors([NETWORK_ERROR]),
            _ => errors([SOMETHING_WENT_WRONG]),
        };
    };

    match (status, server_message(err)) {
        (400, ServerMessage::List(list)) => errors(list),
        (400, ServerMessage::Text(text)) if text == known => errors([friendly]),
        (400, _) => errors([INVALID_REQUEST]),
        (500, _) => errors([SERVER_ERROR]),
        (_, ServerMessage::Text(text)) => errors([text]),
        _ => errors([SOMETHING_WENT_WRONG]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(code: u16, body: Value) -> ApiError {
        ApiError::Status {
            status: code,
            url: "http://api.test/auth".to_string(),
            body: Some(body),
        }
    }

    fn network() -> ApiError {
        ApiError::Network {
            message: "connection refused".to_string(),
        }
    }

    fn texts(notices: Vec<Notice>) -> Vec<String> {
        notices.into_iter().map(|n| n.text).collect()
    }

    #[test]
    fn test_signup_lists_each_validation_message() {
        let err = status(400, json!({ "message": ["email must be an email", "password is too short"] }));
        assert_eq!(
            texts(describe_failure(Action::Signup, &err)),
            vec!["email must be an email", "password is too short"]
        );
    }

    #[test]
    fn test_signup_known_messages() {
        let err = status(400, json!({ "message": "User already exists" }));
        assert_eq!(
            texts(describe_failure(Action::Signup, &err)),
            vec!["This email is already registered. Try logging in."]
        );

        let err = status(400, json!({ "message": "Bad payload" }));
        assert_eq!(texts(describe_failure(Action::Signup, &err)), vec![INVALID_REQUEST]);

        let err = status(500, json!({ "message": "boom" }));
        assert_eq!(texts(describe_failure(Action::Signup, &err)), vec![SERVER_ERROR]);
    }

    #[test]
    fn test_signin_known_messages() {
        let err = status(400, json!({ "message": "User is not OTP verified" }));
        assert_eq!(
            texts(describe_failure(Action::SignIn, &err)),
            vec!["Please verify your OTP first."]
        );

        let err = status(404, json!({ "message": "User not found" }));
        assert_eq!(texts(describe_failure(Action::SignIn, &err)), vec!["User not found"]);

        let err = status(403, json!({}));
        assert_eq!(texts(describe_failure(Action::SignIn, &err)), vec![SOMETHING_WENT_WRONG]);

        assert_eq!(texts(describe_failure(Action::SignIn, &network())), vec![NETWORK_ERROR]);
    }

    #[test]
    fn test_verify_otp_messages() {
        let err = status(401, json!({ "message": "Invalid OTP" }));
        assert_eq!(
            texts(describe_failure(Action::VerifyOtp, &err)),
            vec!["Invalid OTP. Please try again."]
        );
        assert_eq!(
            texts(describe_failure(Action::VerifyOtp, &network())),
            vec!["Something went wrong. Try again."]
        );
    }

    #[test]
    fn test_update_profile_messages() {
        let err = status(401, json!({ "message": "Unauthorized" }));
        assert_eq!(
            texts(describe_failure(Action::UpdateProfile, &err)),
            vec!["Unauthorized! Please login again."]
        );

        let err = status(400, json!({ "message": "rollno is required" }));
        assert_eq!(
            texts(describe_failure(Action::UpdateProfile, &err)),
            vec!["rollno is required"]
        );

        assert_eq!(
            texts(describe_failure(Action::UpdateProfile, &network())),
            vec![NETWORK_ERROR]
        );
    }

    #[test]
    fn test_join_event_already_joined_is_info() {
        let err = status(400, json!({ "message": "User already joined the activity" }));
        let notices = describe_failure(Action::JoinEvent, &err);
        assert_eq!(notices, vec![Notice::info("You are already registered for this event.")]);
        assert!(!notices[0].is_error());

        let err = status(500, json!({ "message": "boom" }));
        assert_eq!(
            texts(describe_failure(Action::JoinEvent, &err)),
            vec!["Failed to register for the event."]
        );
    }

    #[test]
    fn test_add_singing_messages() {
        let err = status(401, json!({}));
        assert_eq!(
            texts(describe_failure(Action::AddSinging, &err)),
            vec!["Unauthorized. Please log in again."]
        );
        assert_eq!(
            texts(describe_failure(Action::AddSinging, &network())),
            vec!["Failed to add song."]
        );
    }

    #[test]
    fn test_read_failures_use_page_messages() {
        let err = status(401, json!({ "message": "Unauthorized" }));
        assert_eq!(texts(describe_failure(Action::ShowProfile, &err)), vec![SIGNED_OUT]);
        assert_eq!(
            texts(describe_failure(Action::Admin, &err)),
            vec!["Unauthorized or failed to load data. Please sign in again."]
        );
        assert_eq!(
            texts(describe_failure(Action::LoadEvent, &err)),
            vec!["Failed to load event details."]
        );
    }

    #[test]
    fn test_notice_display() {
        assert_eq!(Notice::error("nope").to_string(), "error: nope");
        assert_eq!(Notice::info("fine").to_string(), "fine");
    }
}
