//! Routing handler.
//!
//! A route matches when it is `*`, equals the request path, or ends in
//! `*` and the path starts with what precedes it. An empty route list
//! matches everything.

use crate::context::SimulationContext;
use crate::handler::{CodeTarget, HandlerOutcome, MiddlewareHandler, ValidationScope};
use crate::trace::{SimulationTrace, StepDecision};
use crate::validation::ValidationIssue;
use daedalus_core::{MiddlewareConfig, MiddlewareKind};
use serde_json::json;
use std::collections::HashSet;

/// Routing handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingHandler;

/// Returns true if `route` matches `path`.
#[must_use]
pub fn route_matches(route: &str, path: &str) -> bool {
    if route == "*" || route == path {
        return true;
    }
    route
        .strip_suffix('*')
        .is_some_and(|prefix| path.starts_with(prefix))
}

impl MiddlewareHandler for RoutingHandler {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::Routing
    }

    fn default_config(&self) -> MiddlewareConfig {
        MiddlewareConfig::new().with("routes", Vec::<String>::new())
    }

    fn simulate(
        &self,
        config: &MiddlewareConfig,
        ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> HandlerOutcome {
        let routes = config.string_list("routes");
        let path = ctx.path().to_string();

        if routes.is_empty() {
            trace.record(format!("No routes configured; {path} passes"), StepDecision::Continue);
            return HandlerOutcome::proceed();
        }

        if let Some(route) = routes.iter().find(|route| route_matches(route, &path)) {
            trace.record_with(
                format!("Matched route {route}"),
                StepDecision::Continue,
                json!({ "path": path, "route": route }),
            );
            return HandlerOutcome::proceed();
        }

        trace.record_with(
            format!("No route matches {path}"),
            StepDecision::Terminate,
            json!({ "path": path, "routes": routes, "statusCode": 404 }),
        );
        HandlerOutcome::terminate(404, "Not Found")
            .with_body(json!({ "error": "not_found", "path": path }))
    }

    fn validate(
        &self,
        config: &MiddlewareConfig,
        _scope: &ValidationScope<'_>,
        node_id: &str,
    ) -> Vec<ValidationIssue> {
        let mut seen = HashSet::new();
        config
            .string_list("routes")
            .into_iter()
            .filter(|route| !seen.insert(route.clone()))
            .map(|route| {
                ValidationIssue::warning(node_id, format!("Route '{route}' is listed more than once"))
            })
            .collect()
    }

    fn generate_code(&self, _config: &MiddlewareConfig, target: &CodeTarget) -> String {
        target.call("UseRouting()")
    }
}
