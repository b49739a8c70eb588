//! URLs of the reunion REST API.

use std::fmt;
use url::Url;

use crate::config::ConfigError;

/// Builds endpoint URLs from a validated base URL.
///
/// The base may carry a path prefix (`https://host/api`); endpoint paths are
/// appended to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// Use `base` as the API root.
    ///
    /// Fails for URLs that cannot carry a path, such as `mailto:` links.
    pub fn new(base: Url) -> Result<Self, ConfigError> {
        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: base.to_string(),
                message: "URL cannot be used as a base".to_string(),
            });
        }
        Ok(Self { base })
    }

    /// Parse `base` and use it as the API root.
    pub fn parse(base: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(base).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base.to_string(),
            message: e.to_string(),
        })?;
        Self::new(url)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn at(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Always Ok: cannot-be-a-base URLs are rejected in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn signup(&self) -> Url {
        self.at(&["auth", "signup"])
    }

    pub fn verify_otp(&self) -> Url {
        self.at(&["auth", "verifyotp"])
    }

    pub fn signin(&self) -> Url {
        self.at(&["auth", "signin"])
    }

    /// The signed-in user's token claims.
    pub fn me(&self) -> Url {
        self.at(&["auth", "me"])
    }

    pub fn all_users(&self) -> Url {
        self.at(&["auth", "allusers"])
    }

    pub fn update_profile(&self) -> Url {
        self.at(&["completeprofiledetails"])
    }

    pub fn food_preference_count(&self) -> Url {
        self.at(&["completeprofiledetails", "foodPreferenceCount"])
    }

    pub fn gender_count(&self) -> Url {
        self.at(&["completeprofiledetails", "genderCount"])
    }

    pub fn grad_year_count(&self) -> Url {
        self.at(&["completeprofiledetails", "gradYearCount"])
    }

    pub fn events(&self) -> Url {
        self.at(&["events"])
    }

    pub fn event(&self, event_id: &str) -> Url {
        self.at(&["events", event_id])
    }

    pub fn join_event(&self, event_id: &str) -> Url {
        self.at(&["events", event_id, "join"])
    }

    /// Events joined and singing slots added by the signed-in user.
    pub fn user_activities(&self) -> Url {
        self.at(&["events", "user", "activities"])
    }

    pub fn add_singing(&self) -> Url {
        self.at(&["events", "user", "getActivitydetails"])
    }

    pub fn user_singings(&self) -> Url {
        self.at(&["events", "user", "singings"])
    }
}

impl fmt::Display for Endpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_from_bare_host() {
        let endpoints = Endpoints::parse("http://localhost:3000").unwrap();
        assert_eq!(endpoints.signup().as_str(), "http://localhost:3000/auth/signup");
        assert_eq!(endpoints.verify_otp().as_str(), "http://localhost:3000/auth/verifyotp");
        assert_eq!(
            endpoints.grad_year_count().as_str(),
            "http://localhost:3000/completeprofiledetails/gradYearCount"
        );
        assert_eq!(
            endpoints.add_singing().as_str(),
            "http://localhost:3000/events/user/getActivitydetails"
        );
    }

    #[test]
    fn test_paths_keep_base_prefix() {
        for base in ["https://example.com/api", "https://example.com/api/"] {
            let endpoints = Endpoints::parse(base).unwrap();
            assert_eq!(endpoints.events().as_str(), "https://example.com/api/events");
            assert_eq!(
                endpoints.join_event("ev-1").as_str(),
                "https://example.com/api/events/ev-1/join"
            );
        }
    }

    #[test]
    fn test_event_id_is_escaped() {
        let endpoints = Endpoints::parse("https://example.com").unwrap();
        assert_eq!(
            endpoints.event("a/b").as_str(),
            "https://example.com/events/a%2Fb"
        );
    }

    #[test]
    fn test_rejects_unusable_base() {
        assert!(matches!(
            Endpoints::parse("mailto:admin@example.com"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(Endpoints::parse("::").is_err());
    }
}
