//! Request model types.
//!
//! This module defines the values that describe one server interaction:
//! - [`Verb`] / [`WriteVerb`] - HTTP verb of a call site
//! - [`Scalar`] - Query parameter value
//! - [`RequestConfig`] - Target, default body and query of a call
//! - [`RequestDescriptor`] - A fully resolved call, fixed for an accessor's lifetime
//! - [`CacheKey`] - Identifier the query cache uses to share read results

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// HTTP verb of a call site.
///
/// [`Verb::Read`] produces a read accessor; every other verb produces a write
/// accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Read,
    Create,
    PartialUpdate,
    Replace,
    Delete,
}

impl Verb {
    /// The HTTP method this verb is sent as.
    pub fn method(&self) -> Method {
        match self {
            Self::Read => Method::GET,
            Self::Create => Method::POST,
            Self::PartialUpdate => Method::PATCH,
            Self::Replace => Method::PUT,
            Self::Delete => Method::DELETE,
        }
    }

    /// Whether this verb produces a read accessor.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read)
    }

    /// The write verb, or `None` for [`Verb::Read`].
    pub fn as_write(&self) -> Option<WriteVerb> {
        match self {
            Self::Read => None,
            Self::Create => Some(WriteVerb::Create),
            Self::PartialUpdate => Some(WriteVerb::PartialUpdate),
            Self::Replace => Some(WriteVerb::Replace),
            Self::Delete => Some(WriteVerb::Delete),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.method())
    }
}

/// The verbs that produce write accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteVerb {
    Create,
    PartialUpdate,
    Replace,
    Delete,
}

impl From<WriteVerb> for Verb {
    fn from(verb: WriteVerb) -> Self {
        match verb {
            WriteVerb::Create => Self::Create,
            WriteVerb::PartialUpdate => Self::PartialUpdate,
            WriteVerb::Replace => Self::Replace,
            WriteVerb::Delete => Self::Delete,
        }
    }
}

/// A query parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Everything about a call except its verb and auth flag.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    /// Absolute URL of the resource.
    pub target: Url,

    /// Default request body, used by write accessors when the trigger
    /// payload serializes to `null`.
    pub body: Option<Value>,

    /// Query string parameters.
    pub query: BTreeMap<String, Scalar>,
}

impl RequestConfig {
    /// Create a config targeting `target` with no body and no query.
    pub fn new(target: Url) -> Self {
        Self {
            target,
            body: None,
            query: BTreeMap::new(),
        }
    }

    /// Set the default request body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// A stable string identifying the target and query of this config.
    ///
    /// Used to scope cache keys so one key name can front several targets.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.target, &self.query)
    }
}

fn fingerprint(target: &Url, query: &BTreeMap<String, Scalar>) -> String {
    if query.is_empty() {
        return target.to_string();
    }
    let query: Vec<String> = query
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    format!("{}?{}", target, query.join("&"))
}

/// A fully resolved call.
///
/// Built once per accessor and never mutated, so the verb of a call site
/// cannot change between invocations.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub verb: Verb,
    pub target: Url,
    pub requires_auth: bool,
    pub body: Option<Value>,
    pub query_params: BTreeMap<String, Scalar>,
}

impl RequestDescriptor {
    /// Create a descriptor with no body and no query.
    pub fn new(verb: Verb, target: Url) -> Self {
        Self {
            verb,
            target,
            requires_auth: false,
            body: None,
            query_params: BTreeMap::new(),
        }
    }

    /// Combine a verb and auth flag with the rest of a call's config.
    pub fn from_config(verb: Verb, requires_auth: bool, config: RequestConfig) -> Self {
        Self {
            verb,
            target: config.target,
            requires_auth,
            body: config.body,
            query_params: config.query,
        }
    }

    /// Mark the call as authenticated.
    pub fn with_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    /// Set the request body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    /// Target and query as a string, matching [`RequestConfig::fingerprint`].
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.target, &self.query_params)
    }

    /// Query parameters rendered as string pairs for the transport.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query_params
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect()
    }
}

/// Identifier for a cached read.
///
/// A key is an ordered list of parts. Accessors built through
/// [`DataAccess`](crate::DataAccess) scope the caller's key with the request
/// fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    /// Create a key with a single part.
    pub fn new(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Append a part to the key.
    pub fn with_part(mut self, part: impl Into<String>) -> Self {
        self.0.push(part.into());
        self
    }

    /// The parts of this key.
    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
