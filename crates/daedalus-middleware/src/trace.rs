//! The simulation trace.
//!
//! Every handler invocation appends at least one [`SimulationStep`]. The
//! engine calls [`SimulationTrace::enter`] before dispatching a node so
//! that handlers only describe *what* happened; attribution, ordering and
//! timestamps are filled in here.

use chrono::{DateTime, Utc};
use daedalus_core::{MiddlewareKind, MiddlewareNode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// What a step decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepDecision {
    /// The request proceeds to the next node.
    Continue,
    /// The node short-circuited the pipeline.
    Terminate,
    /// A branch condition held.
    TrueBranch,
    /// A branch condition did not hold.
    FalseBranch,
    /// Informational note.
    Info,
    /// A node or arm was not run.
    Skip,
}

impl StepDecision {
    /// Returns the serialized name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Terminate => "terminate",
            Self::TrueBranch => "true-branch",
            Self::FalseBranch => "false-branch",
            Self::Info => "info",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for StepDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the simulation trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStep {
    /// 1-based position in the trace.
    pub order: usize,

    /// Id of the node the step belongs to; absent for engine notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middleware_id: Option<String>,

    /// Display name of the node, or `Simulator` for engine notes.
    pub middleware_name: String,

    /// Kind of the node; absent for engine notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middleware_type: Option<MiddlewareKind>,

    /// Human-readable description.
    pub action: String,

    /// What the step decided.
    pub decision: StepDecision,

    /// Diagnostic payload.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub context: Value,

    /// When the step was recorded. Advisory only.
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StepSource {
    id: Option<String>,
    name: String,
    kind: Option<MiddlewareKind>,
}

impl StepSource {
    fn engine() -> Self {
        Self {
            id: None,
            name: "Simulator".to_string(),
            kind: None,
        }
    }
}

/// Append-only list of simulation steps.
#[derive(Debug, Clone)]
pub struct SimulationTrace {
    steps: Vec<SimulationStep>,
    source: StepSource,
}

impl Default for SimulationTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationTrace {
    /// Creates an empty trace attributed to the engine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            source: StepSource::engine(),
        }
    }

    /// Attributes subsequent steps to `node`.
    pub fn enter(&mut self, node: &MiddlewareNode) {
        self.source = StepSource {
            id: Some(node.id.clone()),
            name: node.display_name().to_string(),
            kind: Some(node.kind),
        };
    }

    /// Attributes subsequent steps to the engine itself.
    pub fn enter_engine(&mut self) {
        self.source = StepSource::engine();
    }

    /// Records a step without diagnostic payload.
    pub fn record(&mut self, action: impl Into<String>, decision: StepDecision) {
        self.record_with(action, decision, Value::Null);
    }

    /// Records a step with a diagnostic payload.
    pub fn record_with(
        &mut self,
        action: impl Into<String>,
        decision: StepDecision,
        context: Value,
    ) {
        let step = SimulationStep {
            order: self.steps.len() + 1,
            middleware_id: self.source.id.clone(),
            middleware_name: self.source.name.clone(),
            middleware_type: self.source.kind,
            action: action.into(),
            decision,
            context,
            timestamp: Utc::now(),
        };
        tracing::trace!(
            order = step.order,
            middleware = %step.middleware_name,
            decision = %decision,
            action = %step.action,
            "Recorded simulation step"
        );
        self.steps.push(step);
    }

    /// Returns the steps recorded so far.
    #[must_use]
    pub fn steps(&self) -> &[SimulationStep] {
        &self.steps
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Consumes the trace, returning its steps.
    #[must_use]
    pub fn into_steps(self) -> Vec<SimulationStep> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_steps_are_attributed_and_numbered() {
        let mut trace = SimulationTrace::new();
        trace.record("Request #1", StepDecision::Info);

        let node = MiddlewareNode::new("auth", MiddlewareKind::Authentication, 0);
        trace.enter(&node);
        trace.record_with("Rejected", StepDecision::Terminate, json!({"status": 401}));

        let steps = trace.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].order, 1);
        assert_eq!(steps[0].middleware_name, "Simulator");
        assert_eq!(steps[0].middleware_type, None);
        assert_eq!(steps[1].order, 2);
        assert_eq!(steps[1].middleware_id.as_deref(), Some("auth"));
        assert_eq!(steps[1].middleware_type, Some(MiddlewareKind::Authentication));
    }

    #[test]
    fn test_step_serialization() {
        let mut trace = SimulationTrace::new();
        trace.enter(&MiddlewareNode::new("b", MiddlewareKind::Routing, 0));
        trace.record("Condition held", StepDecision::TrueBranch);

        let value = serde_json::to_value(&trace.steps()[0]).unwrap();
        assert_eq!(value["decision"], "true-branch");
        assert_eq!(value["middlewareType"], "Routing");
        assert!(value.get("context").is_none());
        assert!(value["timestamp"].is_string());
    }
}
