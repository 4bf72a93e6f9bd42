//! Authentication handler.
//!
//! Models `UseAuthentication` for three schemes:
//!
//! - **JwtBearer**: an `Authorization: Bearer <header>.<payload>.<signature>`
//!   header with exactly three dot-separated segments
//! - **OpenIdConnect** and **Cookie**: any request cookie
//!
//! A caller that is already authenticated passes regardless of scheme.
//! Anything else is rejected with `401` and a scheme-specific
//! `WWW-Authenticate` challenge.

use crate::context::SimulationContext;
use crate::handler::{CodeTarget, HandlerOutcome, MiddlewareHandler, ValidationScope};
use crate::trace::{SimulationTrace, StepDecision};
use crate::validation::ValidationIssue;
use daedalus_core::{MiddlewareConfig, MiddlewareKind};
use serde_json::json;

/// Supported authentication schemes.
pub const SCHEMES: [&str; 3] = ["JwtBearer", "OpenIdConnect", "Cookie"];

const DEFAULT_SCHEME: &str = "JwtBearer";

/// Authentication handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticationHandler;

impl AuthenticationHandler {
    /// Challenge sent with a 401 for `scheme`.
    fn challenge(scheme: &str) -> &'static str {
        match scheme {
            "OpenIdConnect" => "OpenIdConnect",
            "Cookie" => "Cookie",
            _ => "Bearer",
        }
    }

    /// Checks the bearer token shape; returns the rejection reason.
    fn check_bearer(ctx: &SimulationContext) -> Result<(), &'static str> {
        let Some(value) = ctx.header("Authorization") else {
            return Err("No Authorization header present");
        };
        let Some(token) = value
            .get(..7)
            .filter(|prefix| prefix.eq_ignore_ascii_case("bearer "))
            .map(|_| value[7..].trim())
        else {
            return Err("Authorization header is not a Bearer token");
        };
        if token.is_empty() || token.split('.').count() != 3 {
            return Err("Bearer token is not a JWT (expected header.payload.signature)");
        }
        Ok(())
    }
}

impl MiddlewareHandler for AuthenticationHandler {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::Authentication
    }

    fn default_config(&self) -> MiddlewareConfig {
        MiddlewareConfig::new()
            .with("authScheme", DEFAULT_SCHEME)
            .with("authority", "")
            .with("audience", "")
            .with("loginPath", "/login")
    }

    fn simulate(
        &self,
        config: &MiddlewareConfig,
        ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> HandlerOutcome {
        let scheme = config.str_or("authScheme", DEFAULT_SCHEME);

        if ctx.is_authenticated() {
            trace.record_with(
                format!("Caller already authenticated ({scheme})"),
                StepDecision::Continue,
                json!({ "scheme": scheme }),
            );
            return HandlerOutcome::proceed();
        }

        let verdict = match scheme {
            "JwtBearer" => Self::check_bearer(ctx),
            "OpenIdConnect" | "Cookie" if ctx.cookies().is_empty() => {
                Err("No authentication cookie present")
            }
            "OpenIdConnect" | "Cookie" => Ok(()),
            _ => Err("Unsupported authentication scheme"),
        };

        match verdict {
            Ok(()) => {
                ctx.set_authenticated(true);
                trace.record_with(
                    format!("Authenticated with {scheme}"),
                    StepDecision::Continue,
                    json!({ "scheme": scheme }),
                );
                HandlerOutcome::proceed()
            }
            Err(reason) => {
                trace.record_with(
                    format!("Authentication failed: {reason}"),
                    StepDecision::Terminate,
                    json!({ "scheme": scheme, "statusCode": 401 }),
                );
                HandlerOutcome::terminate(401, "Unauthorized")
                    .with_header("WWW-Authenticate", Self::challenge(scheme))
                    .with_body(json!({ "error": "unauthorized", "reason": reason }))
            }
        }
    }

    fn validate(
        &self,
        config: &MiddlewareConfig,
        _scope: &ValidationScope<'_>,
        node_id: &str,
    ) -> Vec<ValidationIssue> {
        let scheme = config.str_or("authScheme", DEFAULT_SCHEME);
        if SCHEMES.contains(&scheme) {
            Vec::new()
        } else {
            vec![ValidationIssue::error(
                node_id,
                format!(
                    "Unknown authentication scheme '{scheme}' (expected one of {})",
                    SCHEMES.join(", ")
                ),
            )]
        }
    }

    fn generate_code(&self, _config: &MiddlewareConfig, target: &CodeTarget) -> String {
        target.call("UseAuthentication()")
    }

    fn generate_service_registration(&self, config: &MiddlewareConfig, builder: &str) -> String {
        let services = format!("{builder}.Services");
        match config.str_or("authScheme", DEFAULT_SCHEME) {
            "OpenIdConnect" => [
                format!("{services}.AddAuthentication(options =>"),
                "{".to_string(),
                "    options.DefaultScheme = CookieAuthenticationDefaults.AuthenticationScheme;"
                    .to_string(),
                "    options.DefaultChallengeScheme = OpenIdConnectDefaults.AuthenticationScheme;"
                    .to_string(),
                "})".to_string(),
                ".AddCookie()".to_string(),
                format!(
                    ".AddOpenIdConnect(options => options.Authority = \"{}\");",
                    config.str_or("authority", "")
                ),
            ]
            .join("\n"),
            "Cookie" => format!(
                "{services}.AddAuthentication(CookieAuthenticationDefaults.AuthenticationScheme)\n    .AddCookie(options => options.LoginPath = \"{}\");",
                config.str_or("loginPath", "/login")
            ),
            _ => format!(
                "{services}.AddAuthentication(JwtBearerDefaults.AuthenticationScheme)\n    .AddJwtBearer(options =>\n    {{\n        options.Authority = \"{}\";\n        options.Audience = \"{}\";\n    }});",
                config.str_or("authority", ""),
                config.str_or("audience", "")
            ),
        }
    }
}
