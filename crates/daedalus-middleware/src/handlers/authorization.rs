//! Authorization handler.
//!
//! A request is authorized when no policies are configured, or when at
//! least one configured policy name is present as a claim *key*. Claim
//! values are not inspected.

use crate::context::SimulationContext;
use crate::handler::{CodeTarget, HandlerOutcome, MiddlewareHandler, ValidationScope};
use crate::trace::{SimulationTrace, StepDecision};
use crate::validation::ValidationIssue;
use daedalus_core::condition::csharp_string;
use daedalus_core::{MiddlewareConfig, MiddlewareKind};
use serde_json::json;

/// Authorization handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationHandler;

impl MiddlewareHandler for AuthorizationHandler {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::Authorization
    }

    fn default_config(&self) -> MiddlewareConfig {
        MiddlewareConfig::new()
            .with("policies", Vec::<String>::new())
            .with("requireAuthenticatedUser", false)
    }

    fn simulate(
        &self,
        config: &MiddlewareConfig,
        ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> HandlerOutcome {
        let policies = config.string_list("policies");

        if policies.is_empty() {
            trace.record("No policies configured; request allowed", StepDecision::Continue);
            return HandlerOutcome::proceed();
        }

        if let Some(policy) = policies.iter().find(|p| ctx.claims().contains_key(p.as_str())) {
            trace.record_with(
                format!("Policy '{policy}' satisfied"),
                StepDecision::Continue,
                json!({ "policies": policies, "matched": policy }),
            );
            return HandlerOutcome::proceed();
        }

        let claims: Vec<&String> = ctx.claims().keys().collect();
        trace.record_with(
            format!("None of the policies [{}] is satisfied", policies.join(", ")),
            StepDecision::Terminate,
            json!({ "policies": policies, "claims": claims, "statusCode": 403 }),
        );
        HandlerOutcome::terminate(403, "Forbidden").with_body(json!({
            "error": "forbidden",
            "requiredPolicies": policies,
        }))
    }

    fn validate(
        &self,
        config: &MiddlewareConfig,
        scope: &ValidationScope<'_>,
        node_id: &str,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        let authenticates_later = scope
            .following(node_id)
            .iter()
            .any(|node| node.kind == MiddlewareKind::Authentication);
        // One ordering warning per list, on the earliest Authorization.
        let reported_earlier = scope
            .preceding(node_id)
            .iter()
            .any(|node| node.kind == MiddlewareKind::Authorization);
        if authenticates_later {
            if !reported_earlier {
                issues.push(ValidationIssue::warning(
                    node_id,
                    "Authorization runs before Authentication; policies are evaluated against an anonymous caller",
                ));
            }
        } else if !config.string_list("policies").is_empty()
            && !scope.pipeline_contains(MiddlewareKind::Authentication)
        {
            issues.push(ValidationIssue::warning(
                node_id,
                "Policies are configured but the pipeline never authenticates the caller",
            ));
        }

        issues
    }

    fn generate_code(&self, _config: &MiddlewareConfig, target: &CodeTarget) -> String {
        target.call("UseAuthorization()")
    }

    fn generate_service_registration(&self, config: &MiddlewareConfig, builder: &str) -> String {
        let policies = config.string_list("policies");
        if policies.is_empty() {
            return format!("{builder}.Services.AddAuthorization();");
        }

        let mut lines = vec![
            format!("{builder}.Services.AddAuthorization(options =>"),
            "{".to_string(),
        ];
        for policy in &policies {
            let name = csharp_string(policy);
            lines.push(format!(
                "    options.AddPolicy({name}, policy => policy.RequireClaim({name}));"
            ));
        }
        lines.push("});".to_string());
        lines.join("\n")
    }
}
