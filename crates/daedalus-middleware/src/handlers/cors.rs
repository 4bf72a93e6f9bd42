//! CORS (Cross-Origin Resource Sharing) handler.
//!
//! Requests without an `Origin` header are not cross-origin and pass
//! untouched. A present origin must be listed in `allowedOrigins` (or the
//! list must contain `*`), otherwise the request is rejected with `403`.
//! Allowed origins are mirrored into `Access-Control-Allow-Origin`.
//!
//! Preflight requests (`OPTIONS` with `Access-Control-Request-Method`)
//! additionally receive the allowed methods and headers.

use crate::context::SimulationContext;
use crate::handler::{CodeTarget, HandlerOutcome, MiddlewareHandler, ValidationScope};
use crate::trace::{SimulationTrace, StepDecision};
use crate::validation::ValidationIssue;
use daedalus_core::condition::csharp_string;
use daedalus_core::{MiddlewareConfig, MiddlewareKind};
use serde_json::json;

/// CORS header names.
pub mod headers {
    /// `Origin` request header.
    pub const ORIGIN: &str = "Origin";
    /// `Access-Control-Request-Method` preflight header.
    pub const REQUEST_METHOD: &str = "Access-Control-Request-Method";
    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
    /// `Access-Control-Allow-Credentials` header.
    pub const ALLOW_CREDENTIALS: &str = "Access-Control-Allow-Credentials";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
    /// `Vary` header.
    pub const VARY: &str = "Vary";
}

const DEFAULT_POLICY: &str = "DefaultPolicy";

/// CORS handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorsHandler;

impl CorsHandler {
    fn is_allowed(allowed: &[String], origin: &str) -> bool {
        allowed.iter().any(|candidate| candidate == "*" || candidate == origin)
    }
}

impl MiddlewareHandler for CorsHandler {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::Cors
    }

    fn default_config(&self) -> MiddlewareConfig {
        MiddlewareConfig::new()
            .with("policyName", DEFAULT_POLICY)
            .with("allowedOrigins", vec!["*"])
            .with("allowedMethods", vec!["GET", "POST", "PUT", "DELETE"])
            .with("allowedHeaders", vec!["Content-Type", "Authorization"])
            .with("allowCredentials", false)
    }

    fn simulate(
        &self,
        config: &MiddlewareConfig,
        ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> HandlerOutcome {
        let allowed = config.string_list("allowedOrigins");

        let Some(origin) = ctx.header(headers::ORIGIN).map(str::to_string) else {
            trace.record("No Origin header; not a cross-origin request", StepDecision::Continue);
            return HandlerOutcome::proceed();
        };

        if !Self::is_allowed(&allowed, &origin) {
            trace.record_with(
                format!("Origin {origin} is not allowed"),
                StepDecision::Terminate,
                json!({ "origin": origin, "allowedOrigins": allowed, "statusCode": 403 }),
            );
            return HandlerOutcome::terminate(403, "Forbidden")
                .with_body(json!({ "error": "cors_origin_rejected", "origin": origin }));
        }

        let mut outcome = HandlerOutcome::proceed()
            .with_header(headers::ALLOW_ORIGIN, origin.clone())
            .with_header(headers::VARY, headers::ORIGIN);
        if config.bool_or("allowCredentials", false) {
            outcome = outcome.with_header(headers::ALLOW_CREDENTIALS, "true");
        }

        let preflight = ctx.method().eq_ignore_ascii_case("OPTIONS")
            && ctx.header(headers::REQUEST_METHOD).is_some();
        if preflight {
            outcome = outcome
                .with_header(
                    headers::ALLOW_METHODS,
                    config.string_list("allowedMethods").join(", "),
                )
                .with_header(
                    headers::ALLOW_HEADERS,
                    config.string_list("allowedHeaders").join(", "),
                );
        }

        trace.record_with(
            format!(
                "Origin {origin} allowed{}",
                if preflight { " (preflight)" } else { "" }
            ),
            StepDecision::Continue,
            json!({ "origin": origin, "preflight": preflight }),
        );
        outcome
    }

    fn validate(
        &self,
        config: &MiddlewareConfig,
        _scope: &ValidationScope<'_>,
        node_id: &str,
    ) -> Vec<ValidationIssue> {
        let allowed = config.string_list("allowedOrigins");
        let mut issues = Vec::new();

        if allowed.is_empty() {
            issues.push(ValidationIssue::warning(
                node_id,
                "No allowed origins configured; every cross-origin request will be rejected",
            ));
        }
        if config.bool_or("allowCredentials", false) && allowed.iter().any(|o| o == "*") {
            issues.push(ValidationIssue::warning(
                node_id,
                "Credentials cannot be combined with a wildcard origin; browsers reject such responses",
            ));
        }

        issues
    }

    fn generate_code(&self, config: &MiddlewareConfig, target: &CodeTarget) -> String {
        let policy = csharp_string(config.str_or("policyName", DEFAULT_POLICY));
        target.call(format!("UseCors({policy})"))
    }

    fn generate_service_registration(&self, config: &MiddlewareConfig, builder: &str) -> String {
        let policy = csharp_string(config.str_or("policyName", DEFAULT_POLICY));
        let origins = config.string_list("allowedOrigins");

        let mut chain = Vec::new();
        if origins.iter().any(|o| o == "*") {
            chain.push("AllowAnyOrigin()".to_string());
        } else {
            let list: Vec<String> = origins.iter().map(|o| csharp_string(o)).collect();
            chain.push(format!("WithOrigins({})", list.join(", ")));
        }
        let methods: Vec<String> = config
            .string_list("allowedMethods")
            .iter()
            .map(|m| csharp_string(m))
            .collect();
        if !methods.is_empty() {
            chain.push(format!("WithMethods({})", methods.join(", ")));
        }
        let allowed_headers: Vec<String> = config
            .string_list("allowedHeaders")
            .iter()
            .map(|h| csharp_string(h))
            .collect();
        if !allowed_headers.is_empty() {
            chain.push(format!("WithHeaders({})", allowed_headers.join(", ")));
        }
        if config.bool_or("allowCredentials", false) {
            chain.push("AllowCredentials()".to_string());
        }

        [
            format!("{builder}.Services.AddCors(options =>"),
            "{".to_string(),
            format!(
                "    options.AddPolicy({policy}, policy => policy.{});",
                chain.join(".")
            ),
            "});".to_string(),
        ]
        .join("\n")
    }
}
