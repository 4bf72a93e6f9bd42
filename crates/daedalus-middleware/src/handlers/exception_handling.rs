//! Exception handling handler.
//!
//! Exception handlers only matter when something throws, which never
//! happens in a simulation. The handler therefore only records itself;
//! its weight is in validation and in the generated code.

use crate::context::SimulationContext;
use crate::handler::{CodeTarget, HandlerOutcome, MiddlewareHandler, ValidationScope};
use crate::trace::{SimulationTrace, StepDecision};
use crate::validation::ValidationIssue;
use daedalus_core::condition::csharp_string;
use daedalus_core::{MiddlewareConfig, MiddlewareKind};

const DEFAULT_ERROR_PATH: &str = "/error";

/// Exception handling handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionHandlingHandler;

impl MiddlewareHandler for ExceptionHandlingHandler {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::ExceptionHandling
    }

    fn default_config(&self) -> MiddlewareConfig {
        MiddlewareConfig::new()
            .with("errorPath", DEFAULT_ERROR_PATH)
            .with("useDeveloperExceptionPage", false)
    }

    fn simulate(
        &self,
        config: &MiddlewareConfig,
        _ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> HandlerOutcome {
        let message = if config.bool_or("useDeveloperExceptionPage", false) {
            "Developer exception page registered".to_string()
        } else {
            format!(
                "Exception handler registered at {}",
                config.str_or("errorPath", DEFAULT_ERROR_PATH)
            )
        };
        trace.record(message, StepDecision::Continue);
        HandlerOutcome::proceed()
    }

    /// Only HTTPS (or another exception handler) may run before it.
    fn validate(
        &self,
        _config: &MiddlewareConfig,
        scope: &ValidationScope<'_>,
        node_id: &str,
    ) -> Vec<ValidationIssue> {
        let ahead = scope
            .preceding(node_id)
            .iter()
            .filter(|node| {
                !matches!(
                    node.kind,
                    MiddlewareKind::Https | MiddlewareKind::ExceptionHandling
                )
            })
            .count();
        if ahead == 0 {
            return Vec::new();
        }
        vec![ValidationIssue::warning(
            node_id,
            format!(
                "ExceptionHandling should be registered first; {ahead} earlier middleware will not have exceptions handled"
            ),
        )]
    }

    fn generate_code(&self, config: &MiddlewareConfig, target: &CodeTarget) -> String {
        if config.bool_or("useDeveloperExceptionPage", false) {
            return target.call("UseDeveloperExceptionPage()");
        }
        let path = csharp_string(config.str_or("errorPath", DEFAULT_ERROR_PATH));
        target.call(format!("UseExceptionHandler({path})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::run;
    use daedalus_core::{MiddlewareNode, Pipeline, SimulationRequest};

    fn scope_of(nodes: Vec<MiddlewareNode>) -> Pipeline {
        let mut pipeline = Pipeline::new("p", "P");
        pipeline.middlewares = nodes;
        pipeline
    }

    #[test]
    fn test_simulation_is_a_noop() {
        let config = ExceptionHandlingHandler.default_config();
        let (outcome, trace, ctx) = run(&ExceptionHandlingHandler, &config, &SimulationRequest::get("/"));
        assert!(!outcome.terminated);
        assert_eq!(trace.len(), 1);
        assert!(ctx.response().headers.is_empty());
    }

    #[test]
    fn test_https_may_precede() {
        let pipeline = scope_of(vec![
            MiddlewareNode::new("https", MiddlewareKind::Https, 0),
            MiddlewareNode::new("ex", MiddlewareKind::ExceptionHandling, 1),
        ]);
        let scope = ValidationScope::top_level(&pipeline);
        assert!(ExceptionHandlingHandler
            .validate(&MiddlewareConfig::new(), &scope, "ex")
            .is_empty());
    }

    #[test]
    fn test_warns_when_not_first() {
        let pipeline = scope_of(vec![
            MiddlewareNode::new("routing", MiddlewareKind::Routing, 0),
            MiddlewareNode::new("ex", MiddlewareKind::ExceptionHandling, 1),
        ]);
        let scope = ValidationScope::top_level(&pipeline);
        let issues = ExceptionHandlingHandler.validate(&MiddlewareConfig::new(), &scope, "ex");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Exception"));
    }

    #[test]
    fn test_generate_code() {
        let target = CodeTarget::top_level("app");
        let config = ExceptionHandlingHandler.default_config();
        assert_eq!(
            ExceptionHandlingHandler.generate_code(&config, &target),
            "app.UseExceptionHandler(\"/error\");"
        );
        let dev = config.with("useDeveloperExceptionPage", true);
        assert_eq!(
            ExceptionHandlingHandler.generate_code(&dev, &target),
            "app.UseDeveloperExceptionPage();"
        );
    }
}
