//! Simulation context types.
//!
//! The [`SimulationContext`] carries request-scoped state through one
//! simulation run. Handlers read the request views from it and the
//! engine folds handler results into its [`SimulatedResponse`].
//!
//! Rate-limit counters are the one piece of state that outlives a single
//! simulated request: [`SimulationContext::begin_request`] resets the
//! request views and the response, but keeps every policy counter, so
//! repeated requests within one simulation share a fixed window.

use daedalus_core::{header_lookup, ConditionSubject, MiddlewareKind, SimulationRequest};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The response being built by a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedResponse {
    /// HTTP status code.
    pub status_code: u16,

    /// Reason phrase.
    pub status_text: String,

    /// Response headers accumulated by handlers.
    pub headers: IndexMap<String, String>,

    /// Response body, if a terminal handler produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// Whether a handler short-circuited the pipeline.
    pub terminated: bool,

    /// Kind of the node that short-circuited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminated_by: Option<MiddlewareKind>,

    /// Id of the node that short-circuited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminated_by_id: Option<String>,
}

impl SimulatedResponse {
    /// Creates a non-terminal 200 response.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status_code: 200,
            status_text: "OK".to_string(),
            headers: IndexMap::new(),
            body: None,
            terminated: false,
            terminated_by: None,
            terminated_by_id: None,
        }
    }
}

impl Default for SimulatedResponse {
    fn default() -> Self {
        Self::ok()
    }
}

/// Counter for one named rate-limit policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitCounter {
    /// Requests seen so far.
    pub count: u64,

    /// Permitted requests.
    pub limit: u64,
}

impl RateLimitCounter {
    /// Returns true once the count is past the limit.
    #[must_use]
    pub const fn is_exceeded(&self) -> bool {
        self.count > self.limit
    }

    /// Requests left before the limit is hit.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.count)
    }
}

/// Mutable state threaded through one simulation run.
///
/// # Example
///
/// ```
/// use daedalus_core::SimulationRequest;
/// use daedalus_middleware::SimulationContext;
///
/// let request = SimulationRequest::get("/api").with_header("Origin", "https://a.test");
/// let mut ctx = SimulationContext::new(&request);
///
/// assert_eq!(ctx.header("origin"), Some("https://a.test"));
///
/// let counter = ctx.hit_rate_limit("api", 1);
/// assert!(!counter.is_exceeded());
///
/// ctx.begin_request(&request);
/// assert!(ctx.hit_rate_limit("api", 1).is_exceeded());
/// ```
#[derive(Debug, Clone)]
pub struct SimulationContext {
    method: String,
    path: String,
    headers: IndexMap<String, String>,
    query: IndexMap<String, String>,
    body: Option<Value>,
    claims: IndexMap<String, String>,
    cookies: IndexMap<String, String>,
    is_authenticated: bool,

    /// Response accumulated for the current request.
    response: SimulatedResponse,

    /// Per-policy counters; survive `begin_request`.
    rate_limit_state: IndexMap<String, RateLimitCounter>,

    /// 1-based number of the current simulated request.
    request_number: u32,
}

impl SimulationContext {
    /// Creates a context for the first simulated request.
    #[must_use]
    pub fn new(request: &SimulationRequest) -> Self {
        Self {
            method: request.method.clone(),
            path: request.path.clone(),
            headers: request.headers.clone(),
            query: request.query.clone(),
            body: request.body.clone(),
            claims: request.claims.clone(),
            cookies: request.cookies.clone(),
            is_authenticated: request.is_authenticated,
            response: SimulatedResponse::ok(),
            rate_limit_state: IndexMap::new(),
            request_number: 1,
        }
    }

    /// Starts the next simulated request.
    ///
    /// Request views and the response are reset from `request`; rate-limit
    /// counters are kept.
    pub fn begin_request(&mut self, request: &SimulationRequest) {
        let rate_limit_state = std::mem::take(&mut self.rate_limit_state);
        let request_number = self.request_number + 1;
        *self = Self::new(request);
        self.rate_limit_state = rate_limit_state;
        self.request_number = request_number;
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Looks up a request header, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_lookup(&self.headers, name)
    }

    /// Returns all request headers.
    #[must_use]
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Returns the request headers for modification.
    pub fn headers_mut(&mut self) -> &mut IndexMap<String, String> {
        &mut self.headers
    }

    /// Returns the query parameters.
    #[must_use]
    pub fn query(&self) -> &IndexMap<String, String> {
        &self.query
    }

    /// Returns the request body.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns the caller claims.
    #[must_use]
    pub fn claims(&self) -> &IndexMap<String, String> {
        &self.claims
    }

    /// Returns the caller claims for modification.
    pub fn claims_mut(&mut self) -> &mut IndexMap<String, String> {
        &mut self.claims
    }

    /// Returns the request cookies.
    #[must_use]
    pub fn cookies(&self) -> &IndexMap<String, String> {
        &self.cookies
    }

    /// Returns whether the caller is authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// Sets the authentication state.
    ///
    /// Called by the Authentication handler once credentials check out.
    pub fn set_authenticated(&mut self, is_authenticated: bool) {
        self.is_authenticated = is_authenticated;
    }

    /// Returns the response built so far.
    #[must_use]
    pub fn response(&self) -> &SimulatedResponse {
        &self.response
    }

    /// Returns the response for modification.
    pub fn response_mut(&mut self) -> &mut SimulatedResponse {
        &mut self.response
    }

    /// Returns the counter of a policy, if it has been hit.
    #[must_use]
    pub fn rate_limit(&self, policy: &str) -> Option<&RateLimitCounter> {
        self.rate_limit_state.get(policy)
    }

    /// Returns every policy counter.
    #[must_use]
    pub fn rate_limit_state(&self) -> &IndexMap<String, RateLimitCounter> {
        &self.rate_limit_state
    }

    /// Counts one request against `policy`, returning the updated counter.
    ///
    /// The limit is refreshed on every hit, so the last configured value
    /// wins when two nodes share a policy name.
    pub fn hit_rate_limit(&mut self, policy: &str, limit: u64) -> RateLimitCounter {
        let counter = self
            .rate_limit_state
            .entry(policy.to_string())
            .or_insert(RateLimitCounter { count: 0, limit });
        counter.count += 1;
        counter.limit = limit;
        *counter
    }

    /// Returns the 1-based number of the current simulated request.
    #[must_use]
    pub fn request_number(&self) -> u32 {
        self.request_number
    }
}

impl ConditionSubject for SimulationContext {
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
