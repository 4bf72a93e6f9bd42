//! Branch conditions and branch configuration.

use crate::node::MiddlewareNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a branch condition inspects.
///
/// Unrecognized type names are kept verbatim in [`ConditionType::Other`]
/// so a document round-trips unchanged; they always evaluate to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionType {
    /// A request header, named by the condition key.
    Header,
    /// The request method.
    Method,
    /// The request path.
    Path,
    /// A caller claim, named by the condition key.
    Claim,
    /// The request's authentication state.
    Authenticated,
    /// Any other type name.
    Other(String),
}

impl ConditionType {
    /// Returns the document name of this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Header => "header",
            Self::Method => "method",
            Self::Path => "path",
            Self::Claim => "claim",
            Self::Authenticated => "authenticated",
            Self::Other(name) => name,
        }
    }

    /// Returns true if conditions of this type need a `key`.
    #[must_use]
    pub const fn requires_key(&self) -> bool {
        matches!(self, Self::Header | Self::Claim)
    }
}

impl From<String> for ConditionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "header" => Self::Header,
            "method" => Self::Method,
            "path" => Self::Path,
            "claim" => Self::Claim,
            "authenticated" => Self::Authenticated,
            _ => Self::Other(value),
        }
    }
}

impl From<ConditionType> for String {
    fn from(value: ConditionType) -> Self {
        match value {
            ConditionType::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a condition compares the inspected value to its operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    /// `==`
    Equals,
    /// `!=`
    NotEquals,
    /// `contains`
    Contains,
    /// `startsWith`
    StartsWith,
    /// `endsWith`
    EndsWith,
    /// Any other operator name; never matches.
    Other(String),
}

impl ConditionOperator {
    /// Returns the document name of this operator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::Contains => "contains",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ConditionOperator {
    fn from(value: String) -> Self {
        match value.as_str() {
            "==" => Self::Equals,
            "!=" => Self::NotEquals,
            "contains" => Self::Contains,
            "startsWith" => Self::StartsWith,
            "endsWith" => Self::EndsWith,
            _ => Self::Other(value),
        }
    }
}

impl From<ConditionOperator> for String {
    fn from(value: ConditionOperator) -> Self {
        match value {
            ConditionOperator::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single branch condition.
///
/// `key` is only meaningful for `header` and `claim` conditions. A missing
/// key on those types is not rejected; the condition evaluates to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCondition {
    /// What the condition inspects.
    #[serde(rename = "type")]
    pub condition_type: ConditionType,

    /// How the inspected value is compared.
    pub operator: ConditionOperator,

    /// Header or claim name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Operand compared against the inspected value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl BranchCondition {
    /// Creates a condition without key or value.
    #[must_use]
    pub fn new(condition_type: ConditionType, operator: ConditionOperator) -> Self {
        Self {
            condition_type,
            operator,
            key: None,
            value: None,
        }
    }

    /// `header[key] <operator> value`
    #[must_use]
    pub fn header(
        key: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<String>,
    ) -> Self {
        Self::new(ConditionType::Header, operator)
            .with_key(key)
            .with_value(value)
    }

    /// `claim[key] <operator> value`
    #[must_use]
    pub fn claim(
        key: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<String>,
    ) -> Self {
        Self::new(ConditionType::Claim, operator)
            .with_key(key)
            .with_value(value)
    }

    /// `method <operator> value`
    #[must_use]
    pub fn method(operator: ConditionOperator, value: impl Into<String>) -> Self {
        Self::new(ConditionType::Method, operator).with_value(value)
    }

    /// `path <operator> value`
    #[must_use]
    pub fn path(operator: ConditionOperator, value: impl Into<String>) -> Self {
        Self::new(ConditionType::Path, operator).with_value(value)
    }

    /// True when the request is authenticated.
    #[must_use]
    pub fn authenticated() -> Self {
        Self::new(ConditionType::Authenticated, ConditionOperator::Equals)
    }

    /// Sets the key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// A conditional fork owned by a middleware node.
///
/// Each arm is an independently ordered list of nodes that may carry their
/// own branches. A node lives in exactly one arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchConfig {
    /// The condition selecting the arm.
    pub condition: BranchCondition,

    /// Nodes run when the condition holds.
    #[serde(default)]
    pub on_true: Vec<MiddlewareNode>,

    /// Nodes run when it does not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_false: Option<Vec<MiddlewareNode>>,
}

impl BranchConfig {
    /// Creates a branch with empty arms.
    #[must_use]
    pub fn new(condition: BranchCondition) -> Self {
        Self {
            condition,
            on_true: Vec::new(),
            on_false: None,
        }
    }

    /// Sets the true arm.
    #[must_use]
    pub fn on_true(mut self, nodes: Vec<MiddlewareNode>) -> Self {
        self.on_true = nodes;
        self
    }

    /// Sets the false arm.
    #[must_use]
    pub fn on_false(mut self, nodes: Vec<MiddlewareNode>) -> Self {
        self.on_false = Some(nodes);
        self
    }

    /// Returns the false arm, or an empty slice.
    #[must_use]
    pub fn false_arm(&self) -> &[MiddlewareNode] {
        self.on_false.as_deref().unwrap_or(&[])
    }

    /// Returns the arm selected by `outcome`.
    #[must_use]
    pub fn arm(&self, outcome: bool) -> &[MiddlewareNode] {
        if outcome {
            &self.on_true
        } else {
            self.false_arm()
        }
    }

    /// Returns true if neither arm holds any node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on_true.is_empty() && self.false_arm().is_empty()
    }
}
