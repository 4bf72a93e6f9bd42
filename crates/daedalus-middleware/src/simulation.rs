//! The simulation engine.
//!
//! Runs a pipeline against a [`SimulationRequest`] without any I/O. Each
//! list of nodes (the top level and every branch arm) is executed the same
//! way:
//!
//! 1. Sort the list by `order` (stable).
//! 2. Run every node up to the first endpoint.
//! 3. Run every non-endpoint node positioned after that endpoint. `Map*`
//!    only registers a route, so `Use*` statements written after it still
//!    execute before endpoint matching.
//! 4. Try the endpoints, in their relative order.
//!
//! A terminal handler outcome stops the whole request. A branching node
//! runs its own handler first, then evaluates its condition and recurses
//! into the selected arm with the same [`SimulationContext`].
//!
//! Repeated requests share one context, so rate-limit counters accumulate
//! from one request to the next.

use crate::context::{SimulatedResponse, SimulationContext};
use crate::handler::HandlerOutcome;
use crate::registry::HandlerRegistry;
use crate::trace::{SimulationStep, SimulationTrace, StepDecision};
use daedalus_core::condition::{describe, evaluate};
use daedalus_core::{
    sorted_by_order, DaedalusResult, MiddlewareKind, MiddlewareNode, Pipeline, SimulationRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;

/// Limits applied by the [`Simulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSettings {
    /// Requests simulated by [`Simulator::simulate`].
    pub default_repeat_count: usize,

    /// Upper bound for repeated requests; larger counts are clamped.
    pub max_repeat_count: usize,

    /// Deepest branch arm that is still executed.
    pub max_branch_depth: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            default_repeat_count: 1,
            max_repeat_count: 1000,
            max_branch_depth: 64,
        }
    }
}

/// Summary of one simulated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationSummary {
    /// 1-based request number.
    pub request_number: u32,

    /// Final status code of the request.
    pub status_code: u16,

    /// Whether a node short-circuited the request.
    pub terminated: bool,

    /// Kind of the terminating node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminated_by: Option<MiddlewareKind>,
}

/// Result of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// False when the last request was terminated with a 4xx/5xx status.
    pub success: bool,

    /// Wall-clock time spent simulating, in milliseconds. Advisory only.
    #[serde(rename = "duration")]
    pub duration_ms: f64,

    /// Every step of every simulated request.
    pub steps: Vec<SimulationStep>,

    /// Response of the last simulated request.
    pub response: SimulatedResponse,

    /// One entry per simulated request.
    pub iterations: Vec<IterationSummary>,
}

impl SimulationResult {
    /// Returns the final status code.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.response.status_code
    }

    /// Returns the steps attributed to a node.
    pub fn steps_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a SimulationStep> + 'a {
        self.steps
            .iter()
            .filter(move |step| step.middleware_id.as_deref() == Some(id))
    }
}

/// A terminal handler outcome and the node that produced it.
struct Termination {
    outcome: HandlerOutcome,
    kind: MiddlewareKind,
    id: String,
}

/// Simulates pipelines against a handler registry.
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    registry: HandlerRegistry,
    settings: SimulationSettings,
}

impl Simulator {
    /// Creates a simulator with default settings.
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            settings: SimulationSettings::default(),
        }
    }

    /// Replaces the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: SimulationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Returns the handler registry.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Simulates `default_repeat_count` requests.
    ///
    /// # Errors
    ///
    /// Returns [`daedalus_core::DaedalusError::UnknownMiddlewareKind`] if a
    /// node's kind has no registered handler.
    pub fn simulate(
        &self,
        pipeline: &Pipeline,
        request: &SimulationRequest,
    ) -> DaedalusResult<SimulationResult> {
        self.simulate_repeated(pipeline, request, self.settings.default_repeat_count)
    }

    /// Simulates `repeat_count` identical requests sharing rate-limit state.
    ///
    /// A count of zero is treated as one; counts above `max_repeat_count`
    /// are clamped.
    ///
    /// # Errors
    ///
    /// Returns [`daedalus_core::DaedalusError::UnknownMiddlewareKind`] if a
    /// node's kind has no registered handler.
    #[tracing::instrument(skip_all, fields(pipeline_id = %pipeline.id, method = %request.method, path = %request.path))]
    pub fn simulate_repeated(
        &self,
        pipeline: &Pipeline,
        request: &SimulationRequest,
        repeat_count: usize,
    ) -> DaedalusResult<SimulationResult> {
        let started = Instant::now();
        let repeat_count = self.clamp_repeat_count(repeat_count);

        let mut ctx = SimulationContext::new(request);
        let mut trace = SimulationTrace::new();
        let mut iterations = Vec::with_capacity(repeat_count);
        let mut response = SimulatedResponse::ok();

        for n in 1..=repeat_count {
            if n > 1 {
                ctx.begin_request(request);
            }
            if repeat_count > 1 {
                trace.enter_engine();
                trace.record(format!("Request #{n}"), StepDecision::Info);
            }

            let mut stack = Vec::new();
            let termination = self.run_list(&pipeline.middlewares, 0, &mut stack, &mut ctx, &mut trace)?;
            response = finish(&mut ctx, termination);

            iterations.push(IterationSummary {
                request_number: ctx.request_number(),
                status_code: response.status_code,
                terminated: response.terminated,
                terminated_by: response.terminated_by,
            });
        }

        let result = SimulationResult {
            success: !response.terminated || response.status_code < 400,
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
            steps: trace.into_steps(),
            response,
            iterations,
        };

        tracing::info!(
            steps = result.steps.len(),
            requests = result.iterations.len(),
            status_code = result.response.status_code,
            terminated = result.response.terminated,
            "Simulated pipeline"
        );
        Ok(result)
    }

    fn clamp_repeat_count(&self, requested: usize) -> usize {
        let max = self.settings.max_repeat_count.max(1);
        if requested > max {
            tracing::warn!(requested, max, "Repeat count clamped");
            max
        } else {
            requested.max(1)
        }
    }

    fn run_list<'a>(
        &self,
        nodes: &'a [MiddlewareNode],
        depth: usize,
        stack: &mut Vec<&'a str>,
        ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> DaedalusResult<Option<Termination>> {
        let sorted = sorted_by_order(nodes);
        let Some(first_endpoint) = sorted.iter().position(|node| node.kind.is_endpoint()) else {
            return self.run_sequence(&sorted, depth, stack, ctx, trace);
        };

        let (head, tail) = sorted.split_at(first_endpoint);
        let (endpoints, hoisted): (Vec<&MiddlewareNode>, Vec<&MiddlewareNode>) =
            tail.iter().copied().partition(|node| node.kind.is_endpoint());

        if let Some(termination) = self.run_sequence(head, depth, stack, ctx, trace)? {
            return Ok(Some(termination));
        }

        if !hoisted.is_empty() {
            let endpoint = endpoints[0];
            let names: Vec<&str> = hoisted.iter().map(|node| node.display_name()).collect();
            trace.enter_engine();
            trace.record_with(
                format!(
                    "Code order places {} after endpoint '{}'; Execution order runs {} before endpoint matching",
                    names.join(", "),
                    endpoint.display_name(),
                    if hoisted.len() == 1 { "it" } else { "them" },
                ),
                StepDecision::Info,
                json!({
                    "endpoint": endpoint.id,
                    "codeOrder": tail.iter().map(|node| node.id.as_str()).collect::<Vec<_>>(),
                    "executionOrder": hoisted
                        .iter()
                        .chain(&endpoints)
                        .map(|node| node.id.as_str())
                        .collect::<Vec<_>>(),
                }),
            );
            tracing::debug!(hoisted = hoisted.len(), endpoint = %endpoint.id, "Hoisted middleware ahead of endpoint");

            if let Some(termination) = self.run_sequence(&hoisted, depth, stack, ctx, trace)? {
                return Ok(Some(termination));
            }
        }

        self.run_sequence(&endpoints, depth, stack, ctx, trace)
    }

    fn run_sequence<'a>(
        &self,
        nodes: &[&'a MiddlewareNode],
        depth: usize,
        stack: &mut Vec<&'a str>,
        ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> DaedalusResult<Option<Termination>> {
        for node in nodes {
            if let Some(termination) = self.run_node(node, depth, stack, ctx, trace)? {
                return Ok(Some(termination));
            }
        }
        Ok(None)
    }

    fn run_node<'a>(
        &self,
        node: &'a MiddlewareNode,
        depth: usize,
        stack: &mut Vec<&'a str>,
        ctx: &mut SimulationContext,
        trace: &mut SimulationTrace,
    ) -> DaedalusResult<Option<Termination>> {
        trace.enter(node);

        if stack.contains(&node.id.as_str()) {
            trace.record(
                format!("Skipped '{}': node is already running in an enclosing branch", node.id),
                StepDecision::Skip,
            );
            return Ok(None);
        }

        let handler = self.registry.get(node.kind)?;
        tracing::debug!(node = %node.id, kind = %node.kind, depth, "Dispatching middleware");

        let recorded = trace.len();
        let outcome = handler.simulate(&node.config, ctx, trace);
        if trace.len() == recorded {
            tracing::warn!(node = %node.id, kind = %node.kind, "Handler recorded no step");
            let decision = if outcome.terminated {
                StepDecision::Terminate
            } else {
                StepDecision::Continue
            };
            trace.record(format!("{} completed", node.display_name()), decision);
        }

        ctx.response_mut()
            .headers
            .extend(outcome.headers.iter().map(|(name, value)| (name.clone(), value.clone())));

        if outcome.terminated {
            return Ok(Some(Termination {
                outcome,
                kind: node.kind,
                id: node.id.clone(),
            }));
        }

        let Some(branch) = &node.branch else {
            return Ok(None);
        };

        let taken = evaluate(&branch.condition, &*ctx);
        let condition = describe(&branch.condition);
        trace.enter(node);
        trace.record_with(
            format!("Condition {condition} is {taken}"),
            if taken {
                StepDecision::TrueBranch
            } else {
                StepDecision::FalseBranch
            },
            json!({ "condition": condition, "result": taken }),
        );

        let arm = branch.arm(taken);
        if arm.is_empty() {
            return Ok(None);
        }
        if depth + 1 > self.settings.max_branch_depth {
            trace.record(
                format!(
                    "Branch depth limit of {} reached; arm not executed",
                    self.settings.max_branch_depth
                ),
                StepDecision::Skip,
            );
            return Ok(None);
        }

        stack.push(node.id.as_str());
        let termination = self.run_list(arm, depth + 1, stack, ctx, trace);
        stack.pop();
        termination
    }
}

fn finish(ctx: &mut SimulationContext, termination: Option<Termination>) -> SimulatedResponse {
    let headers = ctx.response().headers.clone();
    let response = match termination {
        Some(Termination { outcome, kind, id }) => SimulatedResponse {
            status_code: outcome.status_code,
            status_text: outcome.status_text,
            headers,
            body: outcome.body,
            terminated: true,
            terminated_by: Some(kind),
            terminated_by_id: Some(id),
        },
        None => SimulatedResponse {
            headers,
            ..SimulatedResponse::ok()
        },
    };
    *ctx.response_mut() = response.clone();
    response
}

/// Simulates `repeat_count` requests with the default registry and settings.
///
/// # Errors
///
/// Returns [`daedalus_core::DaedalusError::UnknownMiddlewareKind`] if a
/// node's kind has no registered handler.
///
/// # Example
///
/// ```
/// use daedalus_core::{MiddlewareKind, MiddlewareNode, Pipeline, SimulationRequest};
/// use daedalus_middleware::simulate_pipeline;
///
/// let mut pipeline = Pipeline::new("p1", "API");
/// pipeline.add_node(MiddlewareNode::new("auth", MiddlewareKind::Authentication, 0)).unwrap();
///
/// let result = simulate_pipeline(&pipeline, &SimulationRequest::get("/api/users"), 1).unwrap();
/// assert_eq!(result.response.status_code, 401);
/// assert_eq!(result.response.terminated_by, Some(MiddlewareKind::Authentication));
/// assert!(!result.success);
/// ```
pub fn simulate_pipeline(
    pipeline: &Pipeline,
    request: &SimulationRequest,
    repeat_count: usize,
) -> DaedalusResult<SimulationResult> {
    Simulator::default().simulate_repeated(pipeline, request, repeat_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_core::{BranchCondition, BranchConfig, ConditionOperator, MiddlewareConfig};

    fn pipeline(nodes: Vec<MiddlewareNode>) -> Pipeline {
        let mut pipeline = Pipeline::new("p", "P");
        pipeline.middlewares = nodes;
        pipeline
    }

    fn custom(id: &str, order: i64) -> MiddlewareNode {
        MiddlewareNode::new(id, MiddlewareKind::Custom, order)
            .with_config(MiddlewareConfig::new().with("className", id))
    }

    fn endpoint(id: &str, path: &str, order: i64) -> MiddlewareNode {
        MiddlewareNode::new(id, MiddlewareKind::MinimalApiEndpoint, order).with_config(
            MiddlewareConfig::new()
                .with("httpMethod", "GET")
                .with("path", path),
        )
    }

    fn ids(result: &SimulationResult) -> Vec<&str> {
        result
            .steps
            .iter()
            .filter_map(|step| step.middleware_id.as_deref())
            .collect()
    }

    #[test]
    fn test_empty_pipeline_is_ok() {
        let result = simulate_pipeline(&pipeline(vec![]), &SimulationRequest::get("/"), 1).unwrap();
        assert!(result.success);
        assert!(result.steps.is_empty());
        assert_eq!(result.response.status_code, 200);
        assert!(!result.response.terminated);
        assert_eq!(result.iterations.len(), 1);
    }

    #[test]
    fn test_nodes_run_in_order_not_position() {
        let result = simulate_pipeline(
            &pipeline(vec![custom("second", 5), custom("first", 1)]),
            &SimulationRequest::get("/"),
            1,
        )
        .unwrap();
        assert_eq!(ids(&result), vec!["first", "second"]);
    }

    #[test]
    fn test_hoisting_with_multiple_endpoints() {
        let nodes = vec![
            custom("head", 0),
            endpoint("e1", "/a", 1),
            custom("late1", 2),
            endpoint("e2", "/b", 3),
            custom("late2", 4),
        ];
        let result = simulate_pipeline(&pipeline(nodes), &SimulationRequest::get("/b"), 1).unwrap();

        assert_eq!(
            ids(&result),
            vec!["head", "late1", "late2", "e1", "e2", "e2"]
        );
        let note = &result.steps[1];
        assert_eq!(note.decision, StepDecision::Info);
        assert_eq!(note.middleware_name, "Simulator");
        assert_eq!(note.middleware_id, None);
        assert_eq!(note.middleware_type, None);
        assert_eq!(note.context["endpoint"], "e1");
        assert!(note.action.contains("Code order"));
        assert!(note.action.contains("Execution order"));
        assert_eq!(result.response.terminated_by_id.as_deref(), Some("e2"));
    }

    #[test]
    fn test_terminal_node_stops_pipeline() {
        let routing = MiddlewareNode::new("routes", MiddlewareKind::Routing, 0)
            .with_config(MiddlewareConfig::new().with("routes", vec!["/api/*"]));
        let result = simulate_pipeline(
            &pipeline(vec![routing, custom("after", 1)]),
            &SimulationRequest::get("/home"),
            1,
        )
        .unwrap();
        assert_eq!(result.response.status_code, 404);
        assert!(!result.success);
        assert_eq!(ids(&result), vec!["routes"]);
    }

    #[test]
    fn test_branch_selects_arm() {
        let branch = BranchConfig::new(BranchCondition::header(
            "X-Beta",
            ConditionOperator::Equals,
            "1",
        ))
        .on_true(vec![custom("beta", 0)])
        .on_false(vec![custom("stable", 0)]);
        let fork = custom("fork", 0).with_branch(branch);
        let pipeline = pipeline(vec![fork, custom("tail", 1)]);

        let beta = simulate_pipeline(
            &pipeline,
            &SimulationRequest::get("/").with_header("x-beta", "1"),
            1,
        )
        .unwrap();
        assert_eq!(ids(&beta), vec!["fork", "fork", "beta", "tail"]);
        assert_eq!(beta.steps[1].decision, StepDecision::TrueBranch);

        let stable = simulate_pipeline(&pipeline, &SimulationRequest::get("/"), 1).unwrap();
        assert_eq!(ids(&stable), vec!["fork", "fork", "stable", "tail"]);
        assert_eq!(stable.steps[1].decision, StepDecision::FalseBranch);
    }

    #[test]
    fn test_branch_cycle_is_skipped() {
        let inner = custom("loop", 0);
        let outer = custom("loop", 0)
            .with_branch(BranchConfig::new(BranchCondition::authenticated()).on_false(vec![inner]));
        let result = simulate_pipeline(&pipeline(vec![outer]), &SimulationRequest::get("/"), 1).unwrap();
        assert_eq!(result.steps.last().map(|s| s.decision), Some(StepDecision::Skip));
        assert!(result.success);
    }

    #[test]
    fn test_branch_depth_limit() {
        let leaf = custom("leaf", 0);
        let fork = custom("fork", 0)
            .with_branch(BranchConfig::new(BranchCondition::authenticated()).on_false(vec![leaf]));
        let simulator = Simulator::default().with_settings(SimulationSettings {
            max_branch_depth: 0,
            ..SimulationSettings::default()
        });
        let result = simulator
            .simulate(&pipeline(vec![fork]), &SimulationRequest::get("/"))
            .unwrap();
        assert_eq!(result.steps.len(), 3);
        assert_eq!(result.steps[2].decision, StepDecision::Skip);
    }

    #[test]
    fn test_repeat_count_clamped() {
        let simulator = Simulator::default().with_settings(SimulationSettings {
            max_repeat_count: 3,
            ..SimulationSettings::default()
        });
        let result = simulator
            .simulate_repeated(&pipeline(vec![custom("c", 0)]), &SimulationRequest::get("/"), 10)
            .unwrap();
        assert_eq!(result.iterations.len(), 3);
        assert_eq!(result.steps[0].action, "Request #1");
        assert_eq!(result.steps[0].middleware_name, "Simulator");

        let once = simulator
            .simulate_repeated(&pipeline(vec![custom("c", 0)]), &SimulationRequest::get("/"), 0)
            .unwrap();
        assert_eq!(once.iterations.len(), 1);
        assert_eq!(once.steps.len(), 1);
    }

    #[test]
    fn test_unknown_handler_fails_fast() {
        let simulator = Simulator::new(HandlerRegistry::empty());
        let result = simulator.simulate(&pipeline(vec![custom("c", 0)]), &SimulationRequest::get("/"));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_serialization() {
        let result = simulate_pipeline(&pipeline(vec![custom("c", 0)]), &SimulationRequest::get("/"), 1).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], true);
        assert!(value["duration"].is_number());
        assert_eq!(value["response"]["statusCode"], 200);
        assert_eq!(value["steps"][0]["decision"], "continue");
        assert_eq!(value["iterations"][0]["requestNumber"], 1);
    }
}
