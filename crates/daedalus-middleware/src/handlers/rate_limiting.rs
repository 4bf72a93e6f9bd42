//! Rate limiting handler.
//!
//! Each invocation counts one request against the node's `policyName`
//! (default `"default"`) in the context's rate-limit state. Once the
//! post-increment count exceeds `permitLimit` the request is rejected with
//! `429` and a `Retry-After` of `window` seconds.
//!
//! Counters persist across the repeated requests of one simulation and
//! never decay: the simulation is a naive fixed window with no clock.

use crate::context::SimulationContext;
use crate::handler::{CodeTarget, HandlerOutcome, MiddlewareHandler, ValidationScope};
use crate::trace::{SimulationTrace, StepDecision};
use crate::validation::ValidationIssue;
use daedalus_core::condition::csharp_string;
use daedalus_core::{MiddlewareConfig, MiddlewareKind};
use serde_json::json;

/// Rate limit header names.
pub mod headers {
    /// Maximum requests allowed in the window.
    pub const LIMIT: &str = "X-RateLimit-Limit";
    /// Remaining requests in the current window.
    pub const REMAINING: &str = "X-RateLimit-Remaining";
    /// Seconds to wait before retrying (on 429).
    pub const RETRY_AFTER: &str = "Retry-After";
}

/// Limiter algorithms understood by the code generator.
pub const LIMITER_TYPES: [&str; 4] = ["fixed", "sliding", "tokenBucket", "concurrency"];

const DEFAULT_POLICY: &str = "default";
const DEFAULT_PERMIT_LIMIT: u64 = 100;
const DEFAULT_WINDOW: u64 = 60;

/// Rate limiting handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitingHandler;

impl MiddlewareHandler for RateLimitingHandler {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::RateLimiting
    }

    fn default_config(&self) -> MiddlewareConfig {
        MiddlewareConfig::new()
            .with("policyName", DEFAULT_POLICY)
            .with("limiterType", "fixed")
            .with("permitLimit", DEFAULT_PERMIT_LIMIT)
            .with("window", DEFAULT_WINDOW)
            .with("queueLimit", 0)
    }

    fn simulate(
        &self,
        config: &MiddlewareConfig,
        ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> HandlerOutcome {
        let policy = config.str_or("policyName", DEFAULT_POLICY);
        let limit = config.u64_or("permitLimit", DEFAULT_PERMIT_LIMIT);
        let window = config.u64_or("window", DEFAULT_WINDOW);

        let counter = ctx.hit_rate_limit(policy, limit);
        let context = json!({
            "policy": policy,
            "count": counter.count,
            "limit": counter.limit,
            "requestNumber": ctx.request_number(),
        });

        if counter.is_exceeded() {
            trace.record_with(
                format!(
                    "Policy '{policy}' exceeded: request {} of {limit} permitted",
                    counter.count
                ),
                StepDecision::Terminate,
                context,
            );
            return HandlerOutcome::terminate(429, "Too Many Requests")
                .with_header(headers::RETRY_AFTER, window.to_string())
                .with_header(headers::LIMIT, limit.to_string())
                .with_header(headers::REMAINING, "0")
                .with_body(json!({
                    "error": "rate_limited",
                    "policy": policy,
                    "retryAfter": window,
                }));
        }

        trace.record_with(
            format!(
                "Policy '{policy}': {} of {limit} permits used",
                counter.count
            ),
            StepDecision::Continue,
            context,
        );
        HandlerOutcome::proceed()
            .with_header(headers::LIMIT, limit.to_string())
            .with_header(headers::REMAINING, counter.remaining().to_string())
    }

    fn validate(
        &self,
        config: &MiddlewareConfig,
        _scope: &ValidationScope<'_>,
        node_id: &str,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if config.u64_or("permitLimit", DEFAULT_PERMIT_LIMIT) == 0 {
            issues.push(ValidationIssue::error(
                node_id,
                "permitLimit must be at least 1; a zero limit rejects every request",
            ));
        }
        if config.u64_or("window", DEFAULT_WINDOW) == 0 {
            issues.push(ValidationIssue::error(node_id, "window must be at least 1 second"));
        }
        let limiter = config.str_or("limiterType", "fixed");
        if !LIMITER_TYPES.contains(&limiter) {
            issues.push(ValidationIssue::error(
                node_id,
                format!(
                    "Unknown limiterType '{limiter}' (expected one of {})",
                    LIMITER_TYPES.join(", ")
                ),
            ));
        }

        issues
    }

    fn generate_code(&self, _config: &MiddlewareConfig, target: &CodeTarget) -> String {
        target.call("UseRateLimiter()")
    }

    fn generate_service_registration(&self, config: &MiddlewareConfig, builder: &str) -> String {
        let policy = csharp_string(config.str_or("policyName", DEFAULT_POLICY));
        let limit = config.u64_or("permitLimit", DEFAULT_PERMIT_LIMIT);
        let window = config.u64_or("window", DEFAULT_WINDOW);
        let queue = config.u64_or("queueLimit", 0);

        let limiter = match config.str_or("limiterType", "fixed") {
            "sliding" => format!(
                "options.AddSlidingWindowLimiter({policy}, o => {{ o.PermitLimit = {limit}; o.Window = TimeSpan.FromSeconds({window}); o.SegmentsPerWindow = 4; o.QueueLimit = {queue}; }});"
            ),
            "tokenBucket" => format!(
                "options.AddTokenBucketLimiter({policy}, o => {{ o.TokenLimit = {limit}; o.TokensPerPeriod = {limit}; o.ReplenishmentPeriod = TimeSpan.FromSeconds({window}); o.QueueLimit = {queue}; }});"
            ),
            "concurrency" => format!(
                "options.AddConcurrencyLimiter({policy}, o => {{ o.PermitLimit = {limit}; o.QueueLimit = {queue}; }});"
            ),
            _ => format!(
                "options.AddFixedWindowLimiter({policy}, o => {{ o.PermitLimit = {limit}; o.Window = TimeSpan.FromSeconds({window}); o.QueueLimit = {queue}; }});"
            ),
        };

        [
            format!("{builder}.Services.AddRateLimiter(options =>"),
            "{".to_string(),
            "    options.RejectionStatusCode = StatusCodes.Status429TooManyRequests;".to_string(),
            format!("    {limiter}"),
            "});".to_string(),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_core::{Pipeline, SimulationRequest};

    #[test]
    fn test_counter_accumulates_across_requests() {
        let config = MiddlewareConfig::new()
            .with("permitLimit", 3)
            .with("policyName", "p");
        let request = SimulationRequest::get("/");
        let mut ctx = SimulationContext::new(&request);
        let mut statuses = Vec::new();

        for n in 0..5 {
            if n > 0 {
                ctx.begin_request(&request);
            }
            let mut trace = SimulationTrace::new();
            let outcome = RateLimitingHandler.simulate(&config, &mut ctx, &mut trace);
            statuses.push((outcome.terminated, outcome.status_code));
        }

        assert_eq!(
            statuses,
            vec![(false, 200), (false, 200), (false, 200), (true, 429), (true, 429)]
        );
    }

    #[test]
    fn test_headers() {
        let config = MiddlewareConfig::new().with("permitLimit", 1).with("window", 30);
        let mut ctx = SimulationContext::new(&SimulationRequest::get("/"));
        let mut trace = SimulationTrace::new();

        let first = RateLimitingHandler.simulate(&config, &mut ctx, &mut trace);
        assert_eq!(first.headers.get(headers::REMAINING).map(String::as_str), Some("0"));

        let second = RateLimitingHandler.simulate(&config, &mut ctx, &mut trace);
        assert_eq!(second.headers.get(headers::RETRY_AFTER).map(String::as_str), Some("30"));
        assert_eq!(trace.steps()[1].decision, StepDecision::Terminate);
        assert_eq!(ctx.rate_limit("default").map(|c| c.count), Some(2));
    }

    #[test]
    fn test_validate_limits() {
        let pipeline = Pipeline::new("p", "P");
        let scope = ValidationScope::top_level(&pipeline);
        let config = MiddlewareConfig::new()
            .with("permitLimit", 0)
            .with("window", 0)
            .with("limiterType", "leaky");
        let issues = RateLimitingHandler.validate(&config, &scope, "rl");
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(ValidationIssue::is_error));

        let defaults = RateLimitingHandler.default_config();
        assert!(RateLimitingHandler.validate(&defaults, &scope, "rl").is_empty());
    }

    #[test]
    fn test_registration_per_limiter() {
        let config = RateLimitingHandler
            .default_config()
            .with("limiterType", "sliding")
            .with("policyName", "api");
        let code = RateLimitingHandler.generate_service_registration(&config, "builder");
        assert!(code.contains("options.AddSlidingWindowLimiter(\"api\""));
    }
}
