//! The middleware handler contract.
//!
//! Every [`MiddlewareKind`] has exactly one [`MiddlewareHandler`]. A handler
//! owns everything that is specific to its kind: default configuration,
//! simulated behavior, kind-specific validation, and the C# it emits. The
//! engines never branch on a kind themselves; they dispatch through the
//! [`HandlerRegistry`](crate::HandlerRegistry).
//!
//! # Invariants
//!
//! - `simulate` MUST record at least one step before returning
//! - `simulate` MUST set `terminated` exactly when it recorded a
//!   terminating step
//! - Handlers MUST NOT keep state between calls; per-run state lives in the
//!   [`SimulationContext`]

use crate::context::SimulationContext;
use crate::trace::SimulationTrace;
use crate::validation::ValidationIssue;
use daedalus_core::{MiddlewareConfig, MiddlewareKind, MiddlewareNode, Pipeline};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// The result of simulating one node.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutcome {
    /// Whether the pipeline stops here.
    pub terminated: bool,

    /// Status code; only meaningful when terminated.
    pub status_code: u16,

    /// Reason phrase.
    pub status_text: String,

    /// Headers to merge into the response.
    pub headers: IndexMap<String, String>,

    /// Response body, for terminal outcomes.
    pub body: Option<Value>,
}

impl HandlerOutcome {
    /// The request proceeds to the next node.
    #[must_use]
    pub fn proceed() -> Self {
        Self {
            terminated: false,
            status_code: 200,
            status_text: "OK".to_string(),
            headers: IndexMap::new(),
            body: None,
        }
    }

    /// The pipeline stops with the given status.
    #[must_use]
    pub fn terminate(status_code: u16, status_text: impl Into<String>) -> Self {
        Self {
            terminated: true,
            status_code,
            status_text: status_text.into(),
            headers: IndexMap::new(),
            body: None,
        }
    }

    /// Adds a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the response body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// What a handler can see while validating one node.
///
/// `siblings` is the list the node lives in (the top-level sequence or a
/// branch arm), stably sorted by `order`.
#[derive(Debug, Clone)]
pub struct ValidationScope<'a> {
    pipeline: &'a Pipeline,
    siblings: Vec<&'a MiddlewareNode>,
    depth: usize,
}

impl<'a> ValidationScope<'a> {
    /// Creates a scope over an already sorted list.
    #[must_use]
    pub fn new(pipeline: &'a Pipeline, siblings: Vec<&'a MiddlewareNode>, depth: usize) -> Self {
        Self {
            pipeline,
            siblings,
            depth,
        }
    }

    /// Creates the scope of the top-level sequence.
    #[must_use]
    pub fn top_level(pipeline: &'a Pipeline) -> Self {
        Self::new(pipeline, pipeline.sorted_middlewares(), 0)
    }

    /// Returns the whole pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &'a Pipeline {
        self.pipeline
    }

    /// Returns the sorted siblings, including the node itself.
    #[must_use]
    pub fn siblings(&self) -> &[&'a MiddlewareNode] {
        &self.siblings
    }

    /// Branch nesting depth; 0 for the top-level sequence.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns true for the top-level sequence.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.depth == 0
    }

    /// Position of the first sibling with `id`.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.siblings.iter().position(|node| node.id == id)
    }

    /// Siblings positioned before `id`.
    #[must_use]
    pub fn preceding(&self, id: &str) -> &[&'a MiddlewareNode] {
        match self.position(id) {
            Some(index) => &self.siblings[..index],
            None => &[],
        }
    }

    /// Siblings positioned after `id`.
    #[must_use]
    pub fn following(&self, id: &str) -> &[&'a MiddlewareNode] {
        match self.position(id) {
            Some(index) => &self.siblings[index + 1..],
            None => &[],
        }
    }

    /// Returns true if a node of `kind` exists anywhere in the pipeline.
    #[must_use]
    pub fn pipeline_contains(&self, kind: MiddlewareKind) -> bool {
        contains_kind(&self.pipeline.middlewares, kind)
    }
}

fn contains_kind(nodes: &[MiddlewareNode], kind: MiddlewareKind) -> bool {
    nodes.iter().any(|node| {
        node.kind == kind
            || node.branch.as_ref().is_some_and(|branch| {
                contains_kind(&branch.on_true, kind) || contains_kind(branch.false_arm(), kind)
            })
    })
}

/// Where generated code for a node goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTarget {
    /// Name of the application builder variable in scope.
    pub app: String,

    /// Indentation prefix for every emitted line.
    pub indent: String,

    /// True inside a conditional branch block.
    pub nested: bool,
}

impl CodeTarget {
    /// Top-level target writing against `app`.
    #[must_use]
    pub fn top_level(app: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            indent: String::new(),
            nested: false,
        }
    }

    /// Prefixes a line with the current indentation.
    #[must_use]
    pub fn line(&self, code: impl fmt::Display) -> String {
        format!("{}{}", self.indent, code)
    }

    /// Emits `app.<call>;`.
    #[must_use]
    pub fn call(&self, call: impl fmt::Display) -> String {
        self.line(format_args!("{}.{};", self.app, call))
    }
}

/// Behavior of one middleware kind.
///
/// # Example
///
/// ```
/// use daedalus_core::{MiddlewareConfig, MiddlewareKind, SimulationRequest};
/// use daedalus_middleware::{
///     CodeTarget, HandlerOutcome, MiddlewareHandler, SimulationContext, SimulationTrace,
///     StepDecision,
/// };
///
/// struct Noop;
///
/// impl MiddlewareHandler for Noop {
///     fn kind(&self) -> MiddlewareKind {
///         MiddlewareKind::Custom
///     }
///
///     fn default_config(&self) -> MiddlewareConfig {
///         MiddlewareConfig::new()
///     }
///
///     fn simulate(
///         &self,
///         _config: &MiddlewareConfig,
///         _ctx: &mut SimulationContext,
///         trace: &mut SimulationTrace,
///     ) -> HandlerOutcome {
///         trace.record("Did nothing", StepDecision::Continue);
///         HandlerOutcome::proceed()
///     }
///
///     fn generate_code(&self, _config: &MiddlewareConfig, target: &CodeTarget) -> String {
///         target.line("// no-op")
///     }
/// }
///
/// let mut ctx = SimulationContext::new(&SimulationRequest::get("/"));
/// let mut trace = SimulationTrace::new();
/// let outcome = Noop.simulate(&MiddlewareConfig::new(), &mut ctx, &mut trace);
/// assert!(!outcome.terminated);
/// assert_eq!(trace.len(), 1);
/// ```
pub trait MiddlewareHandler: Send + Sync {
    /// The kind this handler serves.
    fn kind(&self) -> MiddlewareKind;

    /// Configuration a freshly created node of this kind starts with.
    fn default_config(&self) -> MiddlewareConfig;

    /// Simulates the node against the current request.
    fn simulate(
        &self,
        config: &MiddlewareConfig,
        ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> HandlerOutcome;

    /// Kind-specific validation of one node.
    fn validate(
        &self,
        _config: &MiddlewareConfig,
        _scope: &ValidationScope<'_>,
        _node_id: &str,
    ) -> Vec<ValidationIssue> {
        Vec::new()
    }

    /// C# statements placing the node in the request pipeline.
    fn generate_code(&self, config: &MiddlewareConfig, target: &CodeTarget) -> String;

    /// C# service registrations the node needs, against `builder`.
    fn generate_service_registration(&self, _config: &MiddlewareConfig, _builder: &str) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_core::{BranchCondition, BranchConfig};

    fn pipeline() -> Pipeline {
        let mut pipeline = Pipeline::new("p", "P");
        pipeline.middlewares = vec![
            MiddlewareNode::new("routing", MiddlewareKind::Routing, 2),
            MiddlewareNode::new("cors", MiddlewareKind::Cors, 0).with_branch(
                BranchConfig::new(BranchCondition::authenticated()).on_false(vec![
                    MiddlewareNode::new("auth", MiddlewareKind::Authentication, 0),
                ]),
            ),
            MiddlewareNode::new("static", MiddlewareKind::StaticFiles, 1),
        ];
        pipeline
    }

    #[test]
    fn test_scope_neighbours() {
        let pipeline = pipeline();
        let scope = ValidationScope::top_level(&pipeline);

        let ids = |nodes: &[&MiddlewareNode]| nodes.iter().map(|n| n.id.clone()).collect::<Vec<_>>();
        assert_eq!(scope.position("static"), Some(1));
        assert_eq!(ids(scope.preceding("static")), vec!["cors"]);
        assert_eq!(ids(scope.following("static")), vec!["routing"]);
        assert!(scope.preceding("missing").is_empty());
        assert!(scope.is_top_level());
    }

    #[test]
    fn test_pipeline_contains_searches_arms() {
        let pipeline = pipeline();
        let scope = ValidationScope::top_level(&pipeline);
        assert!(scope.pipeline_contains(MiddlewareKind::Authentication));
        assert!(!scope.pipeline_contains(MiddlewareKind::RateLimiting));
    }

    #[test]
    fn test_code_target() {
        let target = CodeTarget {
            app: "branch".to_string(),
            indent: "    ".to_string(),
            nested: true,
        };
        assert_eq!(target.call("UseRouting()"), "    branch.UseRouting();");
        assert_eq!(CodeTarget::top_level("app").call("Run()"), "app.Run();");
    }

    #[test]
    fn test_outcome_builders() {
        let outcome = HandlerOutcome::terminate(429, "Too Many Requests").with_header("Retry-After", "60");
        assert!(outcome.terminated);
        assert_eq!(outcome.headers.get("Retry-After").map(String::as_str), Some("60"));
        assert!(!HandlerOutcome::proceed().terminated);
    }
}
