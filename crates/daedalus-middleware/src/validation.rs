//! The validation engine.
//!
//! Validation reports structural problems as values; it never fails. The
//! engine walks the node tree depth first, sorting every list by `order`,
//! and contributes the kind-agnostic checks itself:
//!
//! - **Cycles**: a node id that reappears inside its own branch subtree
//! - **Aliases**: a node id that appears twice anywhere else in the tree
//! - **Empty ids** and **branches with no nodes in either arm**
//!
//! Everything kind-specific (ordering heuristics, configuration checks)
//! comes from the handlers' `validate`, called once per node with the
//! sorted list the node lives in.

use crate::handler::ValidationScope;
use crate::registry::HandlerRegistry;
use daedalus_core::{sorted_by_order, MiddlewareNode, Pipeline};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    /// Makes the pipeline invalid.
    Error,
    /// Advisory only.
    Warning,
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// Severity.
    #[serde(rename = "type")]
    pub issue_type: IssueType,

    /// The node the issue is attributed to.
    pub middleware_id: String,

    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    /// Creates an error.
    #[must_use]
    pub fn error(middleware_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issue_type: IssueType::Error,
            middleware_id: middleware_id.into(),
            message: message.into(),
        }
    }

    /// Creates a warning.
    #[must_use]
    pub fn warning(middleware_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issue_type: IssueType::Warning,
            middleware_id: middleware_id.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.issue_type == IssueType::Error
    }
}

/// The outcome of validating a pipeline.
///
/// `valid` is true exactly when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the pipeline has no errors.
    pub valid: bool,

    /// Errors, in discovery order.
    pub errors: Vec<ValidationIssue>,

    /// Warnings, in discovery order.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            issues.into_iter().partition(ValidationIssue::is_error);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Iterates over errors and warnings.
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(&self.warnings)
    }

    /// Returns true if there is nothing to report.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Validates pipelines against a handler registry.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    registry: HandlerRegistry,
}

impl Validator {
    /// Creates a validator using `registry` for kind-specific checks.
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Validates a pipeline.
    #[tracing::instrument(skip_all, fields(pipeline_id = %pipeline.id))]
    pub fn validate(&self, pipeline: &Pipeline) -> ValidationResult {
        let mut walk = Walk {
            registry: &self.registry,
            pipeline,
            on_stack: Vec::new(),
            seen: HashSet::new(),
            issues: Vec::new(),
        };
        walk.list(&pipeline.middlewares, 0);

        let result = ValidationResult::from_issues(walk.issues);
        tracing::info!(
            valid = result.valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "Validated pipeline"
        );
        result
    }
}

/// Validates a pipeline with the default handler registry.
///
/// # Example
///
/// ```
/// use daedalus_core::{MiddlewareKind, MiddlewareNode, Pipeline};
/// use daedalus_middleware::validate_pipeline;
///
/// let mut pipeline = Pipeline::new("p1", "API");
/// pipeline.add_node(MiddlewareNode::new("authz", MiddlewareKind::Authorization, 0)).unwrap();
/// pipeline.add_node(MiddlewareNode::new("authn", MiddlewareKind::Authentication, 1)).unwrap();
///
/// let result = validate_pipeline(&pipeline);
/// assert!(result.valid);
/// assert_eq!(result.warnings.len(), 1);
/// assert_eq!(result.warnings[0].middleware_id, "authz");
/// ```
pub fn validate_pipeline(pipeline: &Pipeline) -> ValidationResult {
    Validator::default().validate(pipeline)
}

struct Walk<'a> {
    registry: &'a HandlerRegistry,
    pipeline: &'a Pipeline,
    /// Ids of the branching nodes whose arms are being walked.
    on_stack: Vec<&'a str>,
    seen: HashSet<&'a str>,
    issues: Vec<ValidationIssue>,
}

impl<'a> Walk<'a> {
    fn list(&mut self, nodes: &'a [MiddlewareNode], depth: usize) {
        let scope = ValidationScope::new(self.pipeline, sorted_by_order(nodes), depth);

        for node in scope.siblings().iter().copied() {
            let id = node.id.as_str();

            if id.trim().is_empty() {
                self.issues.push(ValidationIssue::error(
                    id,
                    format!("A {} node has an empty id", node.kind),
                ));
            }

            if self.on_stack.contains(&id) {
                self.issues.push(ValidationIssue::error(
                    id,
                    format!("Branch cycle: node '{id}' is reachable from its own branch"),
                ));
                continue;
            }
            if !self.seen.insert(id) {
                self.issues.push(ValidationIssue::error(
                    id,
                    format!("Node id '{id}' is used by more than one node"),
                ));
            }

            match self.registry.get(node.kind) {
                Ok(handler) => {
                    self.issues
                        .extend(handler.validate(&node.config, &scope, id));
                }
                Err(err) => self.issues.push(ValidationIssue::error(id, err.to_string())),
            }

            if let Some(branch) = &node.branch {
                if branch.is_empty() {
                    self.issues.push(ValidationIssue::warning(
                        id,
                        format!("Branch on '{id}' has no nodes in either arm"),
                    ));
                }
                self.on_stack.push(id);
                self.list(&branch.on_true, depth + 1);
                self.list(branch.false_arm(), depth + 1);
                self.on_stack.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_core::{BranchCondition, BranchConfig, MiddlewareConfig, MiddlewareKind};

    fn pipeline(nodes: Vec<MiddlewareNode>) -> Pipeline {
        let mut pipeline = Pipeline::new("p", "P");
        pipeline.middlewares = nodes;
        pipeline
    }

    fn branch_to(nodes: Vec<MiddlewareNode>) -> BranchConfig {
        BranchConfig::new(BranchCondition::authenticated()).on_true(nodes)
    }

    #[test]
    fn test_empty_pipeline_is_clean() {
        let result = validate_pipeline(&pipeline(vec![]));
        assert!(result.valid);
        assert!(result.is_clean());
    }

    #[test]
    fn test_mutual_branch_cycle() {
        let a_again = MiddlewareNode::new("a", MiddlewareKind::Custom, 0);
        let b = MiddlewareNode::new("b", MiddlewareKind::Custom, 0).with_branch(branch_to(vec![a_again]));
        let a = MiddlewareNode::new("a", MiddlewareKind::Custom, 0).with_branch(branch_to(vec![b]));

        let result = validate_pipeline(&pipeline(vec![a]));
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("cycle"));
    }

    #[test]
    fn test_self_branch_cycle() {
        let inner = MiddlewareNode::new("a", MiddlewareKind::Routing, 0);
        let a = MiddlewareNode::new("a", MiddlewareKind::Routing, 0).with_branch(branch_to(vec![inner]));
        let result = validate_pipeline(&pipeline(vec![a]));
        assert!(!result.valid);
    }

    #[test]
    fn test_alias_in_sibling_arms() {
        let shared = MiddlewareNode::new("shared", MiddlewareKind::Custom, 0);
        let branch = BranchConfig::new(BranchCondition::authenticated())
            .on_true(vec![shared.clone()])
            .on_false(vec![shared]);
        let node = MiddlewareNode::new("fork", MiddlewareKind::Custom, 0).with_branch(branch);

        let result = validate_pipeline(&pipeline(vec![node]));
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("more than one node"));
    }

    #[test]
    fn test_empty_branch_and_empty_id() {
        let fork = MiddlewareNode::new("fork", MiddlewareKind::Custom, 0)
            .with_config(MiddlewareConfig::new().with("className", "Fork"))
            .with_branch(branch_to(vec![]));
        let blank = MiddlewareNode::new(" ", MiddlewareKind::Routing, 1);

        let result = validate_pipeline(&pipeline(vec![fork, blank]));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("no nodes"));
    }

    #[test]
    fn test_handler_checks_run_inside_arms() {
        let limiter = MiddlewareNode::new("rl", MiddlewareKind::RateLimiting, 0)
            .with_config(MiddlewareConfig::new().with("permitLimit", 0));
        let fork = MiddlewareNode::new("fork", MiddlewareKind::Routing, 0)
            .with_branch(branch_to(vec![limiter]));

        let result = validate_pipeline(&pipeline(vec![fork]));
        assert!(!result.valid);
        assert_eq!(result.errors[0].middleware_id, "rl");
    }

    #[test]
    fn test_issue_serialization() {
        let issue = ValidationIssue::warning("n1", "careful");
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "warning", "middlewareId": "n1", "message": "careful"})
        );
    }
}
