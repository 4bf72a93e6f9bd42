//! HTTPS redirection and HSTS handler.

use crate::context::SimulationContext;
use crate::handler::{CodeTarget, HandlerOutcome, MiddlewareHandler, ValidationScope};
use crate::trace::{SimulationTrace, StepDecision};
use crate::validation::ValidationIssue;
use daedalus_core::{MiddlewareConfig, MiddlewareKind};
use serde_json::json;

const DEFAULT_HSTS_MAX_AGE: u64 = 31_536_000;

/// HTTPS handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpsHandler;

impl MiddlewareHandler for HttpsHandler {
    fn kind(&self) -> MiddlewareKind {
        MiddlewareKind::Https
    }

    fn default_config(&self) -> MiddlewareConfig {
        MiddlewareConfig::new()
            .with("httpsPort", 443)
            .with("useHsts", true)
            .with("hstsMaxAge", DEFAULT_HSTS_MAX_AGE)
            .with("includeSubDomains", true)
    }

    fn simulate(
        &self,
        config: &MiddlewareConfig,
        _ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> HandlerOutcome {
        let port = config.u64_or("httpsPort", 443);

        if !config.bool_or("useHsts", true) {
            trace.record(
                format!("HTTPS redirection to port {port} (HSTS disabled)"),
                StepDecision::Continue,
            );
            return HandlerOutcome::proceed();
        }

        let mut hsts = format!("max-age={}", config.u64_or("hstsMaxAge", DEFAULT_HSTS_MAX_AGE));
        if config.bool_or("includeSubDomains", true) {
            hsts.push_str("; includeSubDomains");
        }
        trace.record_with(
            format!("HTTPS redirection to port {port} with HSTS"),
            StepDecision::Continue,
            json!({ "httpsPort": port, "hsts": hsts }),
        );
        HandlerOutcome::proceed().with_header("Strict-Transport-Security", hsts)
    }

    fn validate(
        &self,
        config: &MiddlewareConfig,
        _scope: &ValidationScope<'_>,
        node_id: &str,
    ) -> Vec<ValidationIssue> {
        if config.bool_or("useHsts", true)
            && config.u64_or("hstsMaxAge", DEFAULT_HSTS_MAX_AGE) == 0
        {
            vec![ValidationIssue::warning(
                node_id,
                "HSTS is enabled with hstsMaxAge 0; browsers will not remember the policy",
            )]
        } else {
            Vec::new()
        }
    }

    fn generate_code(&self, config: &MiddlewareConfig, target: &CodeTarget) -> String {
        let mut lines = Vec::new();
        if config.bool_or("useHsts", true) {
            lines.push(target.call("UseHsts()"));
        }
        lines.push(target.call("UseHttpsRedirection()"));
        lines.join("\n")
    }

    fn generate_service_registration(&self, config: &MiddlewareConfig, builder: &str) -> String {
        let mut lines = vec![format!(
            "{builder}.Services.AddHttpsRedirection(options => options.HttpsPort = {});",
            config.u64_or("httpsPort", 443)
        )];
        if config.bool_or("useHsts", true) {
            lines.push(format!("{builder}.Services.AddHsts(options =>"));
            lines.push("{".to_string());
            lines.push(format!(
                "    options.MaxAge = TimeSpan.FromSeconds({});",
                config.u64_or("hstsMaxAge", DEFAULT_HSTS_MAX_AGE)
            ));
            lines.push(format!(
                "    options.IncludeSubDomains = {};",
                config.bool_or("includeSubDomains", true)
            ));
            lines.push("});".to_string());
        }
        lines.join("\n")
    }
}
