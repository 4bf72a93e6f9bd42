//! Minimal API endpoint handler.
//!
//! An endpoint matches when `httpMethod` and `path` both equal the
//! request's. A match terminates with `200` and a synthetic handler result;
//! a mismatch continues, so later endpoints still get their turn.
//!
//! `Map*` registers a route, it is not a pipeline step. `Use*` statements
//! written after an endpoint therefore still wrap it at runtime. The
//! simulation engine models this by hoisting such nodes ahead of endpoint
//! matching, and validation flags every displaced node.

use crate::context::SimulationContext;
use crate::handler::{CodeTarget, HandlerOutcome, MiddlewareHandler, ValidationScope};
use crate::trace::{SimulationTrace, StepDecision};
use crate::validation::ValidationIssue;
use daedalus_core::condition::csharp_string;
use daedalus_core::{MiddlewareConfig, MiddlewareKind};
use serde_json::json;

/// Methods an endpoint can be mapped to.
pub const HTTP_METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

const DEFAULT_METHOD: &str = "GET";
const DEFAULT_PATH: &str = "/api/resource";
const DEFAULT_HANDLER: &str = "Handler";

/// Minimal API endpoint handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointHandler;

impl EndpointHandler {
    fn map_call(method: &str, path: &str, handler: &str) -> String {
        let path = csharp_string(path);
        let result = format!("() => Results.Ok(new {{ handler = {} }})", csharp_string(handler));
        match method {
            "GET" => format!("MapGet({path}, {result})"),
            "POST" => format!("MapPost({path}, {result})"),
            "PUT" => format!("MapPut({path}, {result})"),
            "DELETE" => format!("MapDelete({path}, {result})"),
            "PATCH" => format!("MapPatch({path}, {result})"),
            other => format!(
                "MapMethods({path}, new[] {{ {} }}, {result})",
                csharp_string(other)
            ),
        }
    }
}

impl MiddlewareHandler for EndpointHandler {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::MinimalApiEndpoint
    }

    fn default_config(&self) -> MiddlewareConfig {
        MiddlewareConfig::new()
            .with("httpMethod", DEFAULT_METHOD)
            .with("path", DEFAULT_PATH)
            .with("handlerName", DEFAULT_HANDLER)
    }

    fn simulate(
        &self,
        config: &MiddlewareConfig,
        ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> HandlerOutcome {
        let method = config.str_or("httpMethod", DEFAULT_METHOD);
        let path = config.str_or("path", DEFAULT_PATH);
        let handler = config.str_or("handlerName", DEFAULT_HANDLER);

        if method != ctx.method() || path != ctx.path() {
            trace.record_with(
                format!(
                    "{method} {path} does not match {} {}",
                    ctx.method(),
                    ctx.path()
                ),
                StepDecision::Continue,
                json!({ "endpoint": { "method": method, "path": path } }),
            );
            return HandlerOutcome::proceed();
        }

        trace.record_with(
            format!("Matched endpoint {method} {path}; {handler} executed"),
            StepDecision::Terminate,
            json!({ "endpoint": { "method": method, "path": path }, "statusCode": 200 }),
        );
        trace.record(
            format!(
                "Map{} only registers the route; Use* middleware written after it in source still runs before the endpoint at runtime",
                capitalize(method)
            ),
            StepDecision::Info,
        );

        HandlerOutcome::terminate(200, "OK")
            .with_header("Content-Type", "application/json")
            .with_body(json!({
                "handler": handler,
                "method": method,
                "path": path,
            }))
    }

    /// The first endpoint of a list also reports every non-endpoint node
    /// positioned after it.
    fn validate(
        &self,
        config: &MiddlewareConfig,
        scope: &ValidationScope<'_>,
        node_id: &str,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        let method = config.str_or("httpMethod", DEFAULT_METHOD);
        if !HTTP_METHODS.contains(&method) {
            issues.push(ValidationIssue::error(
                node_id,
                format!("Unknown httpMethod '{method}'"),
            ));
        }
        let path = config.str_or("path", DEFAULT_PATH);
        if !path.starts_with('/') {
            issues.push(ValidationIssue::error(
                node_id,
                format!("Endpoint path '{path}' must start with '/'"),
            ));
        }

        let first_endpoint = scope
            .preceding(node_id)
            .iter()
            .all(|node| !node.kind.is_endpoint());
        if first_endpoint {
            for displaced in scope
                .following(node_id)
                .iter()
                .filter(|node| !node.kind.is_endpoint())
            {
                issues.push(ValidationIssue::warning(
                    displaced.id.clone(),
                    format!(
                        "Code order places '{}' after endpoint '{node_id}', but Execution order runs it before endpoint matching",
                        displaced.id
                    ),
                ));
            }
        }

        issues
    }

    fn generate_code(&self, config: &MiddlewareConfig, target: &CodeTarget) -> String {
        let call = Self::map_call(
            config.str_or("httpMethod", DEFAULT_METHOD),
            config.str_or("path", DEFAULT_PATH),
            config.str_or("handlerName", DEFAULT_HANDLER),
        );
        if target.nested {
            target.call(format!("UseEndpoints(endpoints => endpoints.{call})"))
        } else {
            target.call(call)
        }
    }
}

fn capitalize(method: &str) -> String {
    let lower = method.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::run;
    use daedalus_core::{MiddlewareNode, Pipeline, SimulationRequest};

    fn users() -> MiddlewareConfig {
        MiddlewareConfig::new()
            .with("httpMethod", "GET")
            .with("path", "/api/users")
    }

    #[test]
    fn test_match_terminates_with_info_step() {
        let (outcome, trace, _) = run(&EndpointHandler, &users(), &SimulationRequest::get("/api/users"));
        assert!(outcome.terminated);
        assert_eq!(outcome.status_code, 200);

        let decisions: Vec<StepDecision> = trace.steps().iter().map(|s| s.decision).collect();
        assert_eq!(decisions, vec![StepDecision::Terminate, StepDecision::Info]);
        assert!(trace.steps()[1].action.starts_with("MapGet only registers"));
    }

    #[test]
    fn test_mismatch_continues() {
        let (outcome, trace, _) = run(&EndpointHandler, &users(), &SimulationRequest::post("/api/users"));
        assert!(!outcome.terminated);
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.steps()[0].decision, StepDecision::Continue);
    }

    #[test]
    fn test_displaced_nodes_warned_once() {
        let mut pipeline = Pipeline::new("p", "P");
        pipeline.middlewares = vec![
            MiddlewareNode::new("e1", MiddlewareKind::MinimalApiEndpoint, 0),
            MiddlewareNode::new("custom", MiddlewareKind::Custom, 1),
            MiddlewareNode::new("e2", MiddlewareKind::MinimalApiEndpoint, 2),
        ];
        let scope = ValidationScope::top_level(&pipeline);

        let first = EndpointHandler.validate(&users(), &scope, "e1");
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].middleware_id, "custom");
        assert!(first[0].message.contains("Code order"));
        assert!(first[0].message.contains("Execution order"));

        assert!(EndpointHandler.validate(&users(), &scope, "e2").is_empty());
    }

    #[test]
    fn test_invalid_method_and_path() {
        let pipeline = Pipeline::new("p", "P");
        let scope = ValidationScope::top_level(&pipeline);
        let config = MiddlewareConfig::new()
            .with("httpMethod", "FETCH")
            .with("path", "api");
        let issues = EndpointHandler.validate(&config, &scope, "e");
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(ValidationIssue::is_error));
    }

    #[test]
    fn test_generate_code() {
        let top = CodeTarget::top_level("app");
        assert_eq!(
            EndpointHandler.generate_code(&users(), &top),
            "app.MapGet(\"/api/users\", () => Results.Ok(new { handler = \"Handler\" }));"
        );

        let nested = CodeTarget {
            app: "branch".to_string(),
            indent: "    ".to_string(),
            nested: true,
        };
        assert!(EndpointHandler
            .generate_code(&users(), &nested)
            .starts_with("    branch.UseEndpoints(endpoints => endpoints.MapGet("));
    }
}
