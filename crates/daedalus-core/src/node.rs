//! Middleware nodes.

use crate::branch::BranchConfig;
use crate::config::MiddlewareConfig;
use crate::kind::MiddlewareKind;
use serde::{Deserialize, Serialize};

/// One stage of a pipeline.
///
/// `order` alone decides the position of a node within its list; lists are
/// stably sorted by it before simulation and validation, so ties keep their
/// document order.
///
/// # Example
///
/// ```
/// use daedalus_core::{MiddlewareConfig, MiddlewareKind, MiddlewareNode};
///
/// let node = MiddlewareNode::new("limiter", MiddlewareKind::RateLimiting, 3)
///     .with_config(MiddlewareConfig::new().with("permitLimit", 10));
///
/// assert_eq!(node.kind, MiddlewareKind::RateLimiting);
/// assert!(node.branch.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareNode {
    /// Unique node id.
    pub id: String,

    /// The middleware kind.
    #[serde(rename = "type")]
    pub kind: MiddlewareKind,

    /// Position within the owning list.
    pub order: i64,

    /// Kind-specific configuration.
    #[serde(default)]
    pub config: MiddlewareConfig,

    /// Optional conditional fork.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<BranchConfig>,
}

impl MiddlewareNode {
    /// Creates a node with an empty configuration.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: MiddlewareKind, order: i64) -> Self {
        Self {
            id: id.into(),
            kind,
            order,
            config: MiddlewareConfig::default(),
            branch: None,
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: MiddlewareConfig) -> Self {
        self.config = config;
        self
    }

    /// Attaches a branch.
    #[must_use]
    pub fn with_branch(mut self, branch: BranchConfig) -> Self {
        self.branch = Some(branch);
        self
    }

    /// Returns true if the node carries a branch.
    #[must_use]
    pub fn has_branch(&self) -> bool {
        self.branch.is_some()
    }

    /// Returns the display name of the node.
    ///
    /// Uses the `name` config key when set, the kind name otherwise.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.config
            .str("name")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.kind.as_str())
    }
}

/// Returns the nodes of a list stably sorted by `order`.
#[must_use]
pub fn sorted_by_order(nodes: &[MiddlewareNode]) -> Vec<&MiddlewareNode> {
    let mut sorted: Vec<&MiddlewareNode> = nodes.iter().collect();
    sorted.sort_by_key(|node| node.order);
    sorted
}
