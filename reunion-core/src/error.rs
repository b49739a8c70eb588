//! Error types for the reunion client.
//!
//! [`ApiError`] is the failure carried by accessor result envelopes. It is
//! `Clone` because a single outcome is shared between every observer of a
//! cached read.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Failure of a call made through [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("request to {url} failed with status {status}")]
    Status {
        status: u16,
        url: String,
        /// Decoded error body, when the server sent one.
        body: Option<Value>,
    },

    /// The request never produced a response.
    #[error("network error: {message}")]
    Network { message: String },

    /// A successful response could not be decoded into the expected type.
    #[error("failed to decode response: {message}")]
    Decode { message: String },

    /// The request payload could not be serialized.
    #[error("failed to encode request body: {message}")]
    Encode { message: String },
}

impl ApiError {
    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decoded error body of the failed response, if there was one.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// The server's `message` field, normalized to a list.
    ///
    /// Validation failures carry `{"message": ["..", ".."]}` while most other
    /// errors carry a single string. Returns an empty list when the body has
    /// no usable `message`.
    pub fn messages(&self) -> Vec<String> {
        self.body()
            .and_then(|body| ErrorBody::deserialize(body).ok())
            .map(|body| body.message.into_vec())
            .unwrap_or_default()
    }

    /// Whether the server rejected the call as unauthenticated.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Whether the failure happened before any response arrived.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode {
                message: err.to_string(),
            }
        } else {
            Self::Network {
                message: err.to_string(),
            }
        }
    }
}

/// The `message` field of an error body: one string or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorMessage {
    /// Flatten into a list of messages.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(message) => vec![message],
            Self::Many(messages) => messages,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: ErrorMessage,
}

/// Failure to assemble a client, as returned by
/// [`ReunionApi::from_config`](crate::ReunionApi::from_config).
#[derive(Debug, Error)]
pub enum ReunionError {
    /// Error from a storage backend.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Error from an API call.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
