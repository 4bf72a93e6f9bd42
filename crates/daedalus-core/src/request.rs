//! The simulated request.

use crate::condition::ConditionSubject;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A request to simulate a pipeline against.
///
/// Header names are stored as given; lookups through [`Self::header`] are
/// case-insensitive, matching HTTP semantics.
///
/// # Example
///
/// ```
/// use daedalus_core::SimulationRequest;
///
/// let request = SimulationRequest::get("/api/users")
///     .with_header("Authorization", "Bearer a.b.c")
///     .with_claim("role", "admin");
///
/// assert_eq!(request.header("authorization"), Some("Bearer a.b.c"));
/// assert!(!request.is_authenticated);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    /// HTTP method.
    #[serde(default = "default_method")]
    pub method: String,

    /// Request path, without query string.
    #[serde(default = "default_path")]
    pub path: String,

    /// Request headers.
    #[serde(default)]
    pub headers: IndexMap<String, String>,

    /// Query string parameters.
    #[serde(default)]
    pub query: IndexMap<String, String>,

    /// Optional request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,

    /// Whether the caller is already authenticated.
    #[serde(default)]
    pub is_authenticated: bool,

    /// Caller claims.
    #[serde(default)]
    pub claims: IndexMap<String, String>,

    /// Request cookies.
    #[serde(default)]
    pub cookies: IndexMap<String, String>,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_path() -> String {
    "/".to_string()
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self::new(default_method(), default_path())
    }
}

impl SimulationRequest {
    /// Creates a request with the given method and path.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: IndexMap::new(),
            query: IndexMap::new(),
            body: None,
            is_authenticated: false,
            claims: IndexMap::new(),
            cookies: IndexMap::new(),
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Adds a claim.
    #[must_use]
    pub fn with_claim(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.insert(key.into(), value.into());
        self
    }

    /// Adds a cookie.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Marks the caller as authenticated (or not).
    #[must_use]
    pub fn authenticated(mut self, is_authenticated: bool) -> Self {
        self.is_authenticated = is_authenticated;
        self
    }

    /// Looks up a header, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_lookup(&self.headers, name)
    }
}

/// Case-insensitive header lookup; an exact match wins.
#[must_use]
pub fn header_lookup<'a>(headers: &'a IndexMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .or_else(|| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
        .map(String::as_str)
}

impl ConditionSubject for SimulationRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn header(&self, name: &str) -> Option<&str> {
        header_lookup(&self.headers, name)
    }

    fn claim(&self, key: &str) -> Option<&str> {
        self.claims.get(key).map(String::as_str)
    }

    fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }
}
