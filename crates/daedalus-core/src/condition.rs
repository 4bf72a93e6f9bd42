//! Branch condition evaluation.
//!
//! [`evaluate`] is a pure function of a [`BranchCondition`] and anything
//! that can answer request questions ([`ConditionSubject`]). It never
//! fails: malformed or unsupported conditions evaluate to `false`.
//!
//! | type            | operand                     | operators            |
//! |-----------------|-----------------------------|----------------------|
//! | `header`        | `headers[key]` (or `""`)    | all five             |
//! | `claim`         | `claims[key]` (or `""`)     | all five             |
//! | `path`          | request path                | all five             |
//! | `method`        | request method              | `==`, `!=`           |
//! | `authenticated` | authentication state        | ignored              |
//!
//! The same module renders a condition as a C# boolean expression for the
//! code generator, so both views of a condition stay in one place.

use crate::branch::{BranchCondition, ConditionOperator, ConditionType};

/// Read access to the parts of a request that conditions inspect.
pub trait ConditionSubject {
    /// The request method.
    fn method(&self) -> &str;

    /// The request path.
    fn path(&self) -> &str;

    /// A header value, looked up case-insensitively.
    fn header(&self, name: &str) -> Option<&str>;

    /// A claim value.
    fn claim(&self, key: &str) -> Option<&str>;

    /// Whether the caller is authenticated.
    fn is_authenticated(&self) -> bool;
}

/// Evaluates a condition against a subject.
///
/// # Example
///
/// ```
/// use daedalus_core::condition::evaluate;
/// use daedalus_core::{BranchCondition, ConditionOperator, SimulationRequest};
///
/// let request = SimulationRequest::get("/api/v2/users").with_header("X-Beta", "on");
///
/// let beta = BranchCondition::header("x-beta", ConditionOperator::Equals, "on");
/// assert!(evaluate(&beta, &request));
///
/// let v2 = BranchCondition::path(ConditionOperator::StartsWith, "/api/v2");
/// assert!(evaluate(&v2, &request));
///
/// let unsupported = BranchCondition::method(ConditionOperator::StartsWith, "G");
/// assert!(!evaluate(&unsupported, &request));
/// ```
pub fn evaluate<S: ConditionSubject + ?Sized>(condition: &BranchCondition, subject: &S) -> bool {
    let expected = condition.value.as_deref().unwrap_or("");

    let outcome = match &condition.condition_type {
        ConditionType::Authenticated => Some(subject.is_authenticated()),
        ConditionType::Header => condition.key.as_deref().and_then(|key| {
            apply(&condition.operator, subject.header(key).unwrap_or(""), expected)
        }),
        ConditionType::Claim => condition.key.as_deref().and_then(|key| {
            apply(&condition.operator, subject.claim(key).unwrap_or(""), expected)
        }),
        ConditionType::Path => apply(&condition.operator, subject.path(), expected),
        ConditionType::Method => match condition.operator {
            ConditionOperator::Equals | ConditionOperator::NotEquals => {
                apply(&condition.operator, subject.method(), expected)
            }
            _ => None,
        },
        ConditionType::Other(_) => None,
    };

    let result = outcome.unwrap_or(false);
    tracing::trace!(
        condition = %describe(condition),
        result,
        "Evaluated branch condition"
    );
    result
}

/// Applies an operator; `None` for operators that are not supported.
fn apply(operator: &ConditionOperator, actual: &str, expected: &str) -> Option<bool> {
    match operator {
        ConditionOperator::Equals => Some(actual == expected),
        ConditionOperator::NotEquals => Some(actual != expected),
        ConditionOperator::Contains => Some(actual.contains(expected)),
        ConditionOperator::StartsWith => Some(actual.starts_with(expected)),
        ConditionOperator::EndsWith => Some(actual.ends_with(expected)),
        ConditionOperator::Other(_) => None,
    }
}

/// Renders a condition for traces and messages, e.g. `header[X-Beta] == "on"`.
#[must_use]
pub fn describe(condition: &BranchCondition) -> String {
    let value = condition.value.as_deref().unwrap_or("");
    match &condition.condition_type {
        ConditionType::Authenticated => "request is authenticated".to_string(),
        ConditionType::Header | ConditionType::Claim => format!(
            "{}[{}] {} \"{}\"",
            condition.condition_type,
            condition.key.as_deref().unwrap_or("?"),
            condition.operator,
            value
        ),
        other => format!("{} {} \"{}\"", other, condition.operator, value),
    }
}

/// Renders a condition as a C# boolean expression over `context`.
///
/// Conditions that would evaluate to `false` unconditionally render as
/// the literal `false`.
///
/// # Example
///
/// ```
/// use daedalus_core::condition::to_csharp;
/// use daedalus_core::{BranchCondition, ConditionOperator};
///
/// let condition = BranchCondition::path(ConditionOperator::StartsWith, "/admin");
/// assert_eq!(
///     to_csharp(&condition),
///     "context.Request.Path.StartsWithSegments(\"/admin\")"
/// );
/// ```
#[must_use]
pub fn to_csharp(condition: &BranchCondition) -> String {
    to_csharp_for(condition, "context")
}

/// Renders a condition as a C# boolean expression over the lambda
/// parameter `ctx`.
#[must_use]
pub fn to_csharp_for(condition: &BranchCondition, ctx: &str) -> String {
    let value = csharp_string(condition.value.as_deref().unwrap_or(""));

    match &condition.condition_type {
        ConditionType::Authenticated => {
            format!("{ctx}.User.Identity?.IsAuthenticated == true")
        }
        ConditionType::Header => match condition.key.as_deref() {
            Some(key) => {
                let operand = format!(
                    "{ctx}.Request.Headers[{}].ToString()",
                    csharp_string(key)
                );
                csharp_comparison(&condition.operator, &operand, &value)
            }
            None => "false".to_string(),
        },
        ConditionType::Claim => match condition.key.as_deref() {
            Some(key) => {
                let operand = format!(
                    "({ctx}.User.FindFirst({})?.Value ?? \"\")",
                    csharp_string(key)
                );
                csharp_comparison(&condition.operator, &operand, &value)
            }
            None => "false".to_string(),
        },
        ConditionType::Path => match condition.operator {
            ConditionOperator::StartsWith => {
                format!("{ctx}.Request.Path.StartsWithSegments({value})")
            }
            _ => csharp_comparison(
                &condition.operator,
                &format!("({ctx}.Request.Path.Value ?? \"\")"),
                &value,
            ),
        },
        ConditionType::Method => match condition.operator {
            ConditionOperator::Equals => {
                format!("HttpMethods.Equals({ctx}.Request.Method, {value})")
            }
            ConditionOperator::NotEquals => {
                format!("!HttpMethods.Equals({ctx}.Request.Method, {value})")
            }
            _ => "false".to_string(),
        },
        ConditionType::Other(_) => "false".to_string(),
    }
}

fn csharp_comparison(operator: &ConditionOperator, operand: &str, value: &str) -> String {
    match operator {
        ConditionOperator::Equals => format!("{operand} == {value}"),
        ConditionOperator::NotEquals => format!("{operand} != {value}"),
        ConditionOperator::Contains => format!("{operand}.Contains({value})"),
        ConditionOperator::StartsWith => format!("{operand}.StartsWith({value})"),
        ConditionOperator::EndsWith => format!("{operand}.EndsWith({value})"),
        ConditionOperator::Other(_) => "false".to_string(),
    }
}

/// Quotes a string as a C# literal.
#[must_use]
pub fn csharp_string(raw: &str) -> String {
    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for ch in raw.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}
