//! Typed accessors for every reunion endpoint.
//!
//! Each method builds a fresh accessor; reads share results through the
//! [`DataAccess`] cache, keyed by the names below.

use crate::accessor::{DataAccess, ReadAccessor, WriteAccessor};
use crate::config::ClientConfig;
use crate::dto::{
    Event, FoodPreferenceCount, GenderCount, GradYearCount, ProfileUpdateRequest,
    ProfileUpdateResponse, RegisterEventResponse, SignInRequest, SignInResponse, SignupRequest,
    SignupResponse, SingingRequest, SingingResponse, UserActivities, UserProfileResponse,
    UserRecord, VerifyOtpRequest, VerifyOtpResponse,
};
use crate::endpoints::Endpoints;
use crate::error::ReunionError;
use crate::model::{RequestConfig, WriteVerb};
use crate::session::Session;
use crate::store::{StoreAdapter, create_store};
use crate::transport::ApiClient;

/// The reunion API as typed accessors.
#[derive(Debug, Clone)]
pub struct ReunionApi {
    access: DataAccess,
    endpoints: Endpoints,
}

impl ReunionApi {
    pub fn new(access: DataAccess, endpoints: Endpoints) -> Self {
        Self { access, endpoints }
    }

    /// Build the API from a client config.
    ///
    /// Opens the configured store backend under `data_dir` and roots every
    /// endpoint at the configured base URL.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ReunionError> {
        let endpoints = config.endpoints()?;
        let store = StoreAdapter::from_shared(create_store(config.store, &config.data_dir));
        let client = ApiClient::from_config(config, store)?;
        Ok(Self::new(DataAccess::new(client), endpoints))
    }

    pub fn access(&self) -> &DataAccess {
        &self.access
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Session values in the client's store.
    pub fn session(&self) -> Session {
        self.access.client().session()
    }

    // Authentication

    pub fn signup(&self) -> WriteAccessor<SignupRequest, SignupResponse> {
        self.access.write(
            WriteVerb::Create,
            false,
            RequestConfig::new(self.endpoints.signup()),
        )
    }

    pub fn verify_otp(&self) -> WriteAccessor<VerifyOtpRequest, VerifyOtpResponse> {
        self.access.write(
            WriteVerb::Replace,
            false,
            RequestConfig::new(self.endpoints.verify_otp()),
        )
    }

    pub fn signin(&self) -> WriteAccessor<SignInRequest, SignInResponse> {
        self.access.write(
            WriteVerb::Create,
            false,
            RequestConfig::new(self.endpoints.signin()),
        )
    }

    pub fn me(&self) -> ReadAccessor<UserProfileResponse> {
        self.access
            .read(true, "userProfile", RequestConfig::new(self.endpoints.me()))
    }

    // Profile

    pub fn update_profile(&self) -> WriteAccessor<ProfileUpdateRequest, ProfileUpdateResponse> {
        self.access.write(
            WriteVerb::Replace,
            true,
            RequestConfig::new(self.endpoints.update_profile()),
        )
    }

    // Events

    pub fn events(&self) -> ReadAccessor<Vec<Event>> {
        self.access
            .read(true, "events", RequestConfig::new(self.endpoints.events()))
    }

    pub fn event(&self, event_id: &str) -> ReadAccessor<Event> {
        self.access.read(
            true,
            "eventDetails",
            RequestConfig::new(self.endpoints.event(event_id)),
        )
    }

    /// Join an event. Triggered with `()`; the server takes no body.
    pub fn join_event(&self, event_id: &str) -> WriteAccessor<(), Option<RegisterEventResponse>> {
        self.access.write(
            WriteVerb::Create,
            true,
            RequestConfig::new(self.endpoints.join_event(event_id)),
        )
    }

    pub fn user_activities(&self) -> ReadAccessor<UserActivities> {
        self.access.read(
            true,
            "userActivities",
            RequestConfig::new(self.endpoints.user_activities()),
        )
    }

    pub fn add_singing(&self) -> WriteAccessor<SingingRequest, SingingResponse> {
        self.access.write(
            WriteVerb::Create,
            true,
            RequestConfig::new(self.endpoints.add_singing()),
        )
    }

    pub fn user_singings(&self) -> ReadAccessor<Vec<SingingResponse>> {
        self.access.read(
            true,
            "userSingings",
            RequestConfig::new(self.endpoints.user_singings()),
        )
    }

    // Admin analytics

    pub fn food_preference_count(&self) -> ReadAccessor<FoodPreferenceCount> {
        self.access.read(
            true,
            "foodPreferenceCount",
            RequestConfig::new(self.endpoints.food_preference_count()),
        )
    }

    pub fn gender_count(&self) -> ReadAccessor<GenderCount> {
        self.access.read(
            true,
            "genderCount",
            RequestConfig::new(self.endpoints.gender_count()),
        )
    }

    pub fn grad_year_count(&self) -> ReadAccessor<GradYearCount> {
        self.access.read(
            true,
            "gradYearCount",
            RequestConfig::new(self.endpoints.grad_year_count()),
        )
    }

    /// All registered users. The server does not require a token here.
    pub fn all_users(&self) -> ReadAccessor<Vec<UserRecord>> {
        self.access
            .read(false, "allUsers", RequestConfig::new(self.endpoints.all_users()))
    }
}
