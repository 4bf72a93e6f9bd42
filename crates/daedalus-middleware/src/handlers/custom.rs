//! Custom middleware handler.
//!
//! User-defined middleware is opaque to the simulator: it always continues
//! and reports the configured class name. A `headerName`/`headerValue`
//! pair, when configured, is added to the response.

use crate::context::SimulationContext;
use crate::handler::{CodeTarget, HandlerOutcome, MiddlewareHandler, ValidationScope};
use crate::trace::{SimulationTrace, StepDecision};
use crate::validation::ValidationIssue;
use daedalus_core::{MiddlewareConfig, MiddlewareKind};
use serde_json::json;

const DEFAULT_CLASS: &str = "CustomMiddleware";

/// Custom middleware handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomHandler;

impl CustomHandler {
    fn class_name(config: &MiddlewareConfig) -> &str {
        config
            .str("className")
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_CLASS)
    }
}

impl MiddlewareHandler for CustomHandler {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::Custom
    }

    fn default_config(&self) -> MiddlewareConfig {
        MiddlewareConfig::new()
            .with("className", DEFAULT_CLASS)
            .with("headerName", "")
            .with("headerValue", "")
    }

    fn simulate(
        &self,
        config: &MiddlewareConfig,
        _ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> HandlerOutcome {
        let class_name = Self::class_name(config);
        let mut outcome = HandlerOutcome::proceed();

        let header = config.str("headerName").filter(|name| !name.is_empty());
        if let Some(name) = header {
            outcome = outcome.with_header(name, config.str_or("headerValue", ""));
        }

        trace.record_with(
            format!("Invoked {class_name}"),
            StepDecision::Continue,
            json!({ "className": class_name, "header": header }),
        );
        outcome
    }

    fn validate(
        &self,
        config: &MiddlewareConfig,
        _scope: &ValidationScope<'_>,
        node_id: &str,
    ) -> Vec<ValidationIssue> {
        let empty = config.str("className").map_or(true, |name| name.trim().is_empty());
        if empty {
            vec![ValidationIssue::warning(
                node_id,
                format!("No className configured; generated code will use {DEFAULT_CLASS}"),
            )]
        } else {
            Vec::new()
        }
    }

    fn generate_code(&self, config: &MiddlewareConfig, target: &CodeTarget) -> String {
        target.call(format!("UseMiddleware<{}>()", Self::class_name(config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::run;
    use daedalus_core::{Pipeline, SimulationRequest};

    #[test]
    fn test_reports_class_name() {
        let config = MiddlewareConfig::new().with("className", "TenantMiddleware");
        let (outcome, trace, _) = run(&CustomHandler, &config, &SimulationRequest::get("/"));
        assert!(!outcome.terminated);
        assert_eq!(trace.steps()[0].action, "Invoked TenantMiddleware");
    }

    #[test]
    fn test_configured_header() {
        let config = CustomHandler
            .default_config()
            .with("headerName", "X-Tenant")
            .with("headerValue", "acme");
        let (outcome, _, _) = run(&CustomHandler, &config, &SimulationRequest::get("/"));
        assert_eq!(outcome.headers.get("X-Tenant").map(String::as_str), Some("acme"));
    }

    #[test]
    fn test_missing_class_name() {
        let pipeline = Pipeline::new("p", "P");
        let scope = ValidationScope::top_level(&pipeline);
        assert_eq!(CustomHandler.validate(&MiddlewareConfig::new(), &scope, "c").len(), 1);
        assert_eq!(
            CustomHandler.generate_code(&MiddlewareConfig::new(), &CodeTarget::top_level("app")),
            "app.UseMiddleware<CustomMiddleware>();"
        );
    }
}
