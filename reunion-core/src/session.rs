//! Typed access to the credentials kept in the store.
//!
//! Two values survive between runs:
//! - the bearer token under [`ACCESS_TOKEN_KEY`], written on sign-in
//! - the staged sign-up email under [`EMAIL_KEY`], written on signup and
//!   removed once the OTP is verified
//!
//! No expiry is tracked. An expired token is only noticed when the server
//! rejects a call with 401.

use crate::store::{Secret, StoreAdapter};

/// Storage key of the bearer token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key of the email awaiting OTP verification.
pub const EMAIL_KEY: &str = "email";

/// View over the session values in a [`StoreAdapter`].
#[derive(Debug, Clone)]
pub struct Session {
    store: StoreAdapter,
}

impl Session {
    pub fn new(store: StoreAdapter) -> Self {
        Self { store }
    }

    /// The stored bearer token, if any.
    pub async fn access_token(&self) -> Option<Secret> {
        self.store
            .get_item::<String>(ACCESS_TOKEN_KEY)
            .await
            .map(Secret::new)
    }

    /// Store the bearer token returned by sign-in.
    pub async fn set_access_token(&self, token: &Secret) {
        self.store.set_item(ACCESS_TOKEN_KEY, token.expose()).await;
    }

    /// Whether a bearer token is stored.
    pub async fn is_authenticated(&self) -> bool {
        self.access_token().await.is_some()
    }

    /// Remove the bearer token.
    pub async fn sign_out(&self) {
        self.store.remove_item(ACCESS_TOKEN_KEY).await;
    }

    /// The email waiting for OTP verification, if any.
    pub async fn staged_email(&self) -> Option<String> {
        self.store.get_item(EMAIL_KEY).await
    }

    /// Remember the email used for signup until the OTP is verified.
    pub async fn stage_email(&self, email: &str) {
        self.store.set_item(EMAIL_KEY, email).await;
    }

    /// Forget the staged email.
    pub async fn clear_staged_email(&self) {
        self.store.remove_item(EMAIL_KEY).await;
    }
}
