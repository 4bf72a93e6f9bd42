//! Assertions over simulation and validation results.

use daedalus_core::MiddlewareKind;
use daedalus_middleware::{SimulationResult, SimulationStep, StepDecision, ValidationIssue, ValidationResult};
use serde_json::Value;
use std::fmt;

/// A simulation result with helper methods for assertions.
///
/// Assertion methods return `&Self` so they can be chained.
pub struct TraceAssertions {
    result: SimulationResult,
}

impl TraceAssertions {
    /// Wraps a simulation result.
    pub fn new(result: SimulationResult) -> Self {
        Self { result }
    }

    /// Returns the wrapped result.
    #[must_use]
    pub fn result(&self) -> &SimulationResult {
        &self.result
    }

    /// Unwraps the result.
    #[must_use]
    pub fn into_result(self) -> SimulationResult {
        self.result
    }

    /// Returns the final status code.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.result.response.status_code
    }

    /// Returns all steps.
    #[must_use]
    pub fn steps(&self) -> &[SimulationStep] {
        &self.result.steps
    }

    /// Returns the decisions of all steps, in order.
    #[must_use]
    pub fn decisions(&self) -> Vec<StepDecision> {
        self.result.steps.iter().map(|step| step.decision).collect()
    }

    /// Index of the first step attributed to `id` with `decision`.
    #[must_use]
    pub fn step_index(&self, id: &str, decision: StepDecision) -> Option<usize> {
        self.result
            .steps
            .iter()
            .position(|step| step.middleware_id.as_deref() == Some(id) && step.decision == decision)
    }

    /// Index of the first step whose action contains every fragment.
    #[must_use]
    pub fn step_mentioning(&self, fragments: &[&str]) -> Option<usize> {
        self.result
            .steps
            .iter()
            .position(|step| fragments.iter().all(|fragment| step.action.contains(fragment)))
    }

    /// Returns a response header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.result
            .response
            .headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    // Assertion methods

    /// Asserts the final status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status_code(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status_code(),
            expected,
            "Expected status {}, got {} (steps: {:?})",
            expected,
            self.status_code(),
            self.actions()
        );
        self
    }

    /// Asserts the request was terminated by a node of `kind`.
    ///
    /// # Panics
    ///
    /// Panics if the request was not terminated or a different kind stopped it.
    pub fn assert_terminated_by(&self, kind: MiddlewareKind) -> &Self {
        assert!(self.result.response.terminated, "Expected a terminated response");
        assert_eq!(
            self.result.response.terminated_by,
            Some(kind),
            "Expected termination by {}",
            kind
        );
        self
    }

    /// Asserts the request passed through the whole pipeline.
    ///
    /// # Panics
    ///
    /// Panics if a node terminated the request.
    pub fn assert_not_terminated(&self) -> &Self {
        assert!(
            !self.result.response.terminated,
            "Expected no termination, stopped by {:?}",
            self.result.response.terminated_by_id
        );
        self
    }

    /// Asserts the number of steps.
    ///
    /// # Panics
    ///
    /// Panics if the count doesn't match.
    pub fn assert_step_count(&self, expected: usize) -> &Self {
        assert_eq!(
            self.result.steps.len(),
            expected,
            "Step count mismatch: {:?}",
            self.actions()
        );
        self
    }

    /// Asserts the decisions of all steps.
    ///
    /// # Panics
    ///
    /// Panics if the decisions don't match.
    pub fn assert_decisions(&self, expected: &[StepDecision]) -> &Self {
        assert_eq!(self.decisions(), expected, "Decision mismatch: {:?}", self.actions());
        self
    }

    /// Asserts some step's action contains every fragment.
    ///
    /// # Panics
    ///
    /// Panics if no step matches.
    pub fn assert_step_mentioning(&self, fragments: &[&str]) -> &Self {
        assert!(
            self.step_mentioning(fragments).is_some(),
            "No step mentions {:?}: {:?}",
            fragments,
            self.actions()
        );
        self
    }

    /// Asserts no step's action contains every fragment.
    ///
    /// # Panics
    ///
    /// Panics if a step matches.
    pub fn assert_no_step_mentioning(&self, fragments: &[&str]) -> &Self {
        assert!(
            self.step_mentioning(fragments).is_none(),
            "Unexpected step mentioning {:?}: {:?}",
            fragments,
            self.actions()
        );
        self
    }

    /// Asserts a response header value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        let actual = self
            .header(name)
            .unwrap_or_else(|| panic!("Header '{}' not found", name));
        assert_eq!(
            actual, expected,
            "Header '{}': expected '{}', got '{}'",
            name, expected, actual
        );
        self
    }

    /// Asserts the status code of every simulated request.
    ///
    /// # Panics
    ///
    /// Panics if the statuses don't match.
    pub fn assert_iteration_statuses(&self, expected: &[u16]) -> &Self {
        let actual: Vec<u16> = self.result.iterations.iter().map(|i| i.status_code).collect();
        assert_eq!(actual, expected, "Per-request status mismatch");
        self
    }

    /// Asserts a field of the response body.
    ///
    /// # Panics
    ///
    /// Panics if there is no body or the field doesn't match.
    pub fn assert_body_field(&self, path: &str, expected: &Value) -> &Self {
        let body = self
            .result
            .response
            .body
            .as_ref()
            .unwrap_or_else(|| panic!("Response has no body"));
        let actual = json_path(body, path).unwrap_or_else(|| {
            panic!("JSON path '{}' not found in: {:?}", path, body);
        });
        assert_eq!(
            actual, expected,
            "Body field '{}': expected {:?}, got {:?}",
            path, expected, actual
        );
        self
    }

    fn actions(&self) -> Vec<String> {
        self.result
            .steps
            .iter()
            .map(|step| format!("{} [{}] {}", step.middleware_name, step.decision, step.action))
            .collect()
    }
}

impl fmt::Debug for TraceAssertions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceAssertions")
            .field("status_code", &self.status_code())
            .field("steps", &self.result.steps.len())
            .field("terminated_by", &self.result.response.terminated_by)
            .finish()
    }
}

/// A validation result with helper methods for assertions.
#[derive(Debug)]
pub struct ValidationAssertions {
    result: ValidationResult,
}

impl ValidationAssertions {
    /// Wraps a validation result.
    pub fn new(result: ValidationResult) -> Self {
        Self { result }
    }

    /// Returns the wrapped result.
    #[must_use]
    pub fn result(&self) -> &ValidationResult {
        &self.result
    }

    /// Warnings whose message contains `fragment`.
    #[must_use]
    pub fn warnings_mentioning(&self, fragment: &str) -> Vec<&ValidationIssue> {
        self.result
            .warnings
            .iter()
            .filter(|issue| issue.message.contains(fragment))
            .collect()
    }

    /// Asserts the pipeline has no errors.
    ///
    /// # Panics
    ///
    /// Panics if there are errors.
    pub fn assert_valid(&self) -> &Self {
        assert!(self.result.valid, "Expected a valid pipeline: {:?}", self.result.errors);
        self
    }

    /// Asserts the pipeline has at least one error.
    ///
    /// # Panics
    ///
    /// Panics if there are no errors.
    pub fn assert_invalid(&self) -> &Self {
        assert!(!self.result.valid, "Expected validation errors");
        assert!(!self.result.errors.is_empty());
        self
    }

    /// Asserts the number of warnings.
    ///
    /// # Panics
    ///
    /// Panics if the count doesn't match.
    pub fn assert_warning_count(&self, expected: usize) -> &Self {
        assert_eq!(
            self.result.warnings.len(),
            expected,
            "Warning count mismatch: {:?}",
            self.result.warnings
        );
        self
    }

    /// Asserts a warning attributed to `id` mentions `fragment`.
    ///
    /// # Panics
    ///
    /// Panics if no such warning exists.
    pub fn assert_warning_for(&self, id: &str, fragment: &str) -> &Self {
        assert!(
            self.result
                .warnings
                .iter()
                .any(|issue| issue.middleware_id == id && issue.message.contains(fragment)),
            "No warning for '{}' mentioning '{}': {:?}",
            id,
            fragment,
            self.result.warnings
        );
        self
    }

    /// Asserts an error mentions `fragment`.
    ///
    /// # Panics
    ///
    /// Panics if no such error exists.
    pub fn assert_error_mentioning(&self, fragment: &str) -> &Self {
        assert!(
            self.result.errors.iter().any(|issue| issue.message.contains(fragment)),
            "No error mentioning '{}': {:?}",
            fragment,
            self.result.errors
        );
        self
    }
}

/// Simple JSON path accessor, e.g. `endpoint.method` or `items.0`.
fn json_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        if segment.is_empty() {
            continue;
        }
        if let Ok(index) = segment.parse::<usize>() {
            current = current.get(index)?;
        } else {
            current = current.get(segment)?;
        }
    }
    Some(current)
}
