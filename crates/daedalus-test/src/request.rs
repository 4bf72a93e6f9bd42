//! Simulated request building.

use crate::error::TestError;
use daedalus_core::SimulationRequest;
use serde::Serialize;

/// Fluent builder for [`SimulationRequest`]s.
///
/// # Example
///
/// ```
/// use daedalus_test::RequestFixture;
///
/// let request = RequestFixture::get("/api/users")
///     .bearer_token("header.payload.signature")
///     .claim("role", "admin")
///     .build();
///
/// assert_eq!(request.method, "GET");
/// assert_eq!(request.header("authorization"), Some("Bearer header.payload.signature"));
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct RequestFixture {
    request: SimulationRequest,
}

impl RequestFixture {
    /// Creates a request builder for any method.
    pub fn new(method: impl AsRef<str>, path: impl Into<String>) -> Self {
        Self {
            request: SimulationRequest::new(method.as_ref().to_ascii_uppercase(), path),
        }
    }

    /// Creates a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// Creates a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    /// Creates a PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new("PUT", path)
    }

    /// Creates a PATCH request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new("PATCH", path)
    }

    /// Creates a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new("DELETE", path)
    }

    /// Creates an OPTIONS request.
    pub fn options(path: impl Into<String>) -> Self {
        Self::new("OPTIONS", path)
    }

    /// Sets a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.with_header(name, value);
        self
    }

    /// Sets `Authorization: Bearer <token>`.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.as_ref()))
    }

    /// Sets the `Origin` header.
    pub fn origin(self, origin: impl Into<String>) -> Self {
        self.header("Origin", origin)
    }

    /// Sets the `Accept-Encoding` header.
    pub fn accept_encoding(self, encodings: impl Into<String>) -> Self {
        self.header("Accept-Encoding", encodings)
    }

    /// Adds a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.with_query(name, value);
        self
    }

    /// Adds a claim.
    pub fn claim(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.with_claim(key, value);
        self
    }

    /// Adds a cookie.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.with_cookie(name, value);
        self
    }

    /// Marks the caller as already authenticated.
    pub fn authenticated(mut self) -> Self {
        self.request = self.request.authenticated(true);
        self
    }

    /// Sets a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be serialized.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, TestError> {
        self.request = self.request.with_body(serde_json::to_value(value)?);
        Ok(self)
    }

    /// Builds the request.
    pub fn build(self) -> SimulationRequest {
        self.request
    }
}

impl From<RequestFixture> for SimulationRequest {
    fn from(fixture: RequestFixture) -> Self {
        fixture.build()
    }
}
