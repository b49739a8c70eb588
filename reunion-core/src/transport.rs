//! The underlying call function shared by every accessor.
//!
//! [`ApiClient::call`] turns a [`RequestDescriptor`] into one HTTP exchange:
//! it attaches the stored bearer token when the call is authenticated, sends
//! the JSON body, and decodes the JSON response. It never retries.

use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::model::RequestDescriptor;
use crate::session::Session;
use crate::store::StoreAdapter;

/// HTTP client bound to a store.
///
/// Cloning is cheap; clones share the connection pool and the store.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    store: StoreAdapter,
}

impl ApiClient {
    /// Create a client with a default HTTP client.
    pub fn new(store: StoreAdapter) -> Self {
        Self::with_http_client(reqwest::Client::new(), store)
    }

    /// Create a client around an existing HTTP client.
    pub fn with_http_client(http: reqwest::Client, store: StoreAdapter) -> Self {
        Self { http, store }
    }

    /// Create a client honouring the configured request timeout.
    pub fn from_config(config: &ClientConfig, store: StoreAdapter) -> Result<Self, ApiError> {
        Self::with_timeout(config.timeout(), store)
    }

    /// Create a client whose requests time out after `timeout`.
    pub fn with_timeout(timeout: Duration, store: StoreAdapter) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(http, store))
    }

    /// The store this client reads the bearer token from.
    pub fn store(&self) -> &StoreAdapter {
        &self.store
    }

    /// Session view over this client's store.
    pub fn session(&self) -> Session {
        Session::new(self.store.clone())
    }

    /// Perform the call described by `descriptor`.
    ///
    /// `body` overrides `descriptor.body` when present. Returns the decoded
    /// payload on a 2xx status; an empty payload decodes to `Value::Null`.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] for any non-2xx response, carrying the decoded
    ///   error body (or its raw text when it is not JSON)
    /// - [`ApiError::Network`] when no response arrives
    /// - [`ApiError::Decode`] when a 2xx payload is not JSON
    pub async fn call(
        &self,
        descriptor: &RequestDescriptor,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let mut request = self
            .http
            .request(descriptor.verb.method(), descriptor.target.clone());

        if !descriptor.query_params.is_empty() {
            request = request.query(&descriptor.query_pairs());
        }

        if descriptor.requires_auth {
            match self.session().access_token().await {
                Some(token) => request = request.bearer_auth(token.expose()),
                None => debug!(
                    url = %descriptor.target,
                    "No stored access token; sending request without authorization"
                ),
            }
        }

        if let Some(body) = body.or(descriptor.body.as_ref()) {
            request = request.json(body);
        }

        debug!(verb = %descriptor.verb, url = %descriptor.target, "Sending request");

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
                message: e.to_string(),
            });
        }

        warn!(
            verb = %descriptor.verb,
            url = %descriptor.target,
            status = status.as_u16(),
            "Request failed"
        );

        Err(ApiError::Status {
            status: status.as_u16(),
            url: descriptor.target.to_string(),
            body: decode_error_body(&bytes),
        })
    }
}

/// Decode an error payload: JSON when possible, raw text otherwise.
fn decode_error_body(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}
