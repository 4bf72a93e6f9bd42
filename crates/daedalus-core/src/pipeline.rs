//! The pipeline document and its editing operations.
//!
//! Editing mirrors what a pipeline editor does to a document: add, remove
//! and reorder nodes, change a node's configuration, and attach or detach
//! branches. Every operation keeps node ids unique across the whole tree.

use crate::branch::BranchConfig;
use crate::config::MiddlewareConfig;
use crate::error::{DaedalusError, DaedalusResult};
use crate::node::{sorted_by_order, MiddlewareNode};
use serde::{Deserialize, Serialize};

/// A middleware pipeline document.
///
/// # Example
///
/// ```
/// use daedalus_core::{MiddlewareKind, MiddlewareNode, Pipeline};
///
/// let mut pipeline = Pipeline::new("p1", "API");
/// pipeline.add_node(MiddlewareNode::new("routing", MiddlewareKind::Routing, 5)).unwrap();
/// pipeline.add_node(MiddlewareNode::new("auth", MiddlewareKind::Authentication, 1)).unwrap();
///
/// let ids: Vec<&str> = pipeline.sorted_middlewares().iter().map(|n| n.id.as_str()).collect();
/// assert_eq!(ids, vec!["auth", "routing"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline id.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Top-level nodes.
    pub middlewares: Vec<MiddlewareNode>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            middlewares: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns true if the pipeline has no top-level nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Returns the top-level nodes stably sorted by `order`.
    #[must_use]
    pub fn sorted_middlewares(&self) -> Vec<&MiddlewareNode> {
        sorted_by_order(&self.middlewares)
    }

    /// Returns the `order` a node appended at the end should get.
    ///
    /// Saturates at `i64::MAX`; ties keep document order, so the new node
    /// still sorts last.
    #[must_use]
    pub fn next_order(&self) -> i64 {
        self.middlewares
            .iter()
            .map(|node| node.order)
            .max()
            .map_or(0, |max| max.saturating_add(1))
    }

    /// Returns every node id in the tree, depth first, in document order.
    ///
    /// Ids appear once per occurrence, so duplicates show up twice.
    #[must_use]
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        collect_ids(&self.middlewares, &mut ids);
        ids
    }

    /// Finds a node anywhere in the tree.
    #[must_use]
    pub fn find_node(&self, id: &str) -> Option<&MiddlewareNode> {
        find_in(&self.middlewares, id)
    }

    /// Finds a node anywhere in the tree, mutably.
    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut MiddlewareNode> {
        find_in_mut(&mut self.middlewares, id)
    }

    /// Appends a top-level node.
    ///
    /// # Errors
    ///
    /// Returns [`DaedalusError::DuplicateNodeId`] if the node, or any node
    /// inside its branch, reuses an id already in the pipeline.
    pub fn add_node(&mut self, node: MiddlewareNode) -> DaedalusResult<()> {
        self.ensure_ids_free(std::slice::from_ref(&node))?;
        self.middlewares.push(node);
        Ok(())
    }

    /// Removes a node from wherever it lives in the tree.
    ///
    /// # Errors
    ///
    /// Returns [`DaedalusError::NodeNotFound`] if no node has the id.
    pub fn remove_node(&mut self, id: &str) -> DaedalusResult<MiddlewareNode> {
        remove_from(&mut self.middlewares, id).ok_or_else(|| DaedalusError::node_not_found(id))
    }

    /// Moves a top-level node to `new_index` of the sorted sequence.
    ///
    /// The top-level list is re-sorted and renumbered so that `order`
    /// becomes contiguous from zero. Indices past the end clamp to the end.
    ///
    /// # Errors
    ///
    /// Returns [`DaedalusError::NodeNotFound`] if no top-level node has the id.
    pub fn move_node(&mut self, id: &str, new_index: usize) -> DaedalusResult<()> {
        let mut nodes = std::mem::take(&mut self.middlewares);
        nodes.sort_by_key(|node| node.order);

        let Some(current) = nodes.iter().position(|node| node.id == id) else {
            self.middlewares = nodes;
            return Err(DaedalusError::node_not_found(id));
        };

        let node = nodes.remove(current);
        let target = new_index.min(nodes.len());
        nodes.insert(target, node);

        for (index, node) in nodes.iter_mut().enumerate() {
            node.order = i64::try_from(index).unwrap_or(i64::MAX);
        }
        self.middlewares = nodes;
        Ok(())
    }

    /// Replaces a node's configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DaedalusError::NodeNotFound`] if no node has the id.
    pub fn update_config(&mut self, id: &str, config: MiddlewareConfig) -> DaedalusResult<()> {
        let node = self
            .find_node_mut(id)
            .ok_or_else(|| DaedalusError::node_not_found(id))?;
        node.config = config;
        Ok(())
    }

    /// Attaches a branch to a node, replacing any existing branch.
    ///
    /// # Errors
    ///
    /// Returns [`DaedalusError::NodeNotFound`] if no node has the id, or
    /// [`DaedalusError::DuplicateNodeId`] if the branch arms reuse ids
    /// that exist elsewhere in the pipeline.
    pub fn attach_branch(&mut self, id: &str, branch: BranchConfig) -> DaedalusResult<()> {
        let existing = self
            .find_node(id)
            .ok_or_else(|| DaedalusError::node_not_found(id))?;

        // Ids inside the branch being replaced are about to disappear.
        let mut replaced = Vec::new();
        if let Some(old) = &existing.branch {
            collect_ids(&old.on_true, &mut replaced);
            collect_ids(old.false_arm(), &mut replaced);
        }
        let replaced: Vec<String> = replaced.into_iter().map(str::to_string).collect();

        let mut incoming = Vec::new();
        collect_ids(&branch.on_true, &mut incoming);
        collect_ids(branch.false_arm(), &mut incoming);
        let taken = self.node_ids();
        for (index, candidate) in incoming.iter().enumerate() {
            let clashes = taken
                .iter()
                .any(|taken| taken == candidate && !replaced.iter().any(|r| r == candidate));
            if clashes || incoming[..index].contains(candidate) {
                return Err(DaedalusError::duplicate_node(*candidate));
            }
        }

        if let Some(node) = self.find_node_mut(id) {
            node.branch = Some(branch);
        }
        Ok(())
    }

    /// Detaches and returns a node's branch.
    ///
    /// # Errors
    ///
    /// Returns [`DaedalusError::NodeNotFound`] if no node has the id.
    pub fn detach_branch(&mut self, id: &str) -> DaedalusResult<Option<BranchConfig>> {
        let node = self
            .find_node_mut(id)
            .ok_or_else(|| DaedalusError::node_not_found(id))?;
        Ok(node.branch.take())
    }

    fn ensure_ids_free(&self, nodes: &[MiddlewareNode]) -> DaedalusResult<()> {
        let taken = self.node_ids();
        let mut incoming = Vec::new();
        collect_ids(nodes, &mut incoming);
        for (index, candidate) in incoming.iter().enumerate() {
            if taken.contains(candidate) || incoming[..index].contains(candidate) {
                return Err(DaedalusError::duplicate_node(*candidate));
            }
        }
        Ok(())
    }
}

fn collect_ids<'a>(nodes: &'a [MiddlewareNode], ids: &mut Vec<&'a str>) {
    for node in nodes {
        ids.push(node.id.as_str());
        if let Some(branch) = &node.branch {
            collect_ids(&branch.on_true, ids);
            collect_ids(branch.false_arm(), ids);
        }
    }
}

fn find_in<'a>(nodes: &'a [MiddlewareNode], id: &str) -> Option<&'a MiddlewareNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(branch) = &node.branch {
            if let Some(found) = find_in(&branch.on_true, id).or_else(|| find_in(branch.false_arm(), id)) {
                return Some(found);
            }
        }
    }
    None
}

fn find_in_mut<'a>(nodes: &'a mut [MiddlewareNode], id: &str) -> Option<&'a mut MiddlewareNode> {
    for node in nodes.iter_mut() {
        if node.id == id {
            return Some(node);
        }
        if let Some(branch) = node.branch.as_mut() {
            if let Some(found) = find_in_mut(&mut branch.on_true, id) {
                return Some(found);
            }
            if let Some(arm) = branch.on_false.as_mut() {
                if let Some(found) = find_in_mut(arm, id) {
                    return Some(found);
                }
            }
        }
    }
    None
}

fn remove_from(nodes: &mut Vec<MiddlewareNode>, id: &str) -> Option<MiddlewareNode> {
    if let Some(position) = nodes.iter().position(|node| node.id == id) {
        return Some(nodes.remove(position));
    }
    for node in nodes.iter_mut() {
        if let Some(branch) = node.branch.as_mut() {
            if let Some(removed) = remove_from(&mut branch.on_true, id) {
                return Some(removed);
            }
            if let Some(arm) = branch.on_false.as_mut() {
                if let Some(removed) = remove_from(arm, id) {
                    return Some(removed);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::BranchCondition;
    use crate::kind::MiddlewareKind;

    fn node(id: &str, kind: MiddlewareKind, order: i64) -> MiddlewareNode {
        MiddlewareNode::new(id, kind, order)
    }

    fn branched_pipeline() -> Pipeline {
        let mut pipeline = Pipeline::new("p", "Branched");
        pipeline
            .add_node(
                node("gate", MiddlewareKind::Custom, 0).with_branch(
                    BranchConfig::new(BranchCondition::authenticated())
                        .on_true(vec![node("inner", MiddlewareKind::Authorization, 0)])
                        .on_false(vec![node("fallback", MiddlewareKind::Custom, 0)]),
                ),
            )
            .unwrap();
        pipeline.add_node(node("tail", MiddlewareKind::Routing, 1)).unwrap();
        pipeline
    }

    #[test]
    fn test_next_order() {
        let mut pipeline = Pipeline::new("p", "P");
        assert_eq!(pipeline.next_order(), 0);
        pipeline.add_node(node("a", MiddlewareKind::Routing, 7)).unwrap();
        assert_eq!(pipeline.next_order(), 8);
    }

    #[test]
    fn test_next_order_saturates() {
        let mut pipeline = Pipeline::new("p", "P");
        pipeline.add_node(node("last", MiddlewareKind::Routing, i64::MAX)).unwrap();
        assert_eq!(pipeline.next_order(), i64::MAX);

        let order = pipeline.next_order();
        pipeline.add_node(node("appended", MiddlewareKind::Cors, order)).unwrap();
        let ids: Vec<&str> = pipeline.sorted_middlewares().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["last", "appended"]);
    }

    #[test]
    fn test_add_node_rejects_duplicates_in_branches() {
        let mut pipeline = branched_pipeline();
        let err = pipeline
            .add_node(node("inner", MiddlewareKind::Cors, 5))
            .unwrap_err();
        assert!(matches!(err, DaedalusError::DuplicateNodeId { id } if id == "inner"));
    }

    #[test]
    fn test_find_and_remove_nested_node() {
        let mut pipeline = branched_pipeline();
        assert!(pipeline.find_node("fallback").is_some());

        let removed = pipeline.remove_node("fallback").unwrap();
        assert_eq!(removed.id, "fallback");
        assert!(pipeline.find_node("fallback").is_none());
        assert!(pipeline.remove_node("fallback").is_err());
    }

    #[test]
    fn test_move_node_renumbers() {
        let mut pipeline = Pipeline::new("p", "P");
        pipeline.add_node(node("a", MiddlewareKind::Routing, 10)).unwrap();
        pipeline.add_node(node("b", MiddlewareKind::Cors, 20)).unwrap();
        pipeline.add_node(node("c", MiddlewareKind::Custom, 30)).unwrap();

        pipeline.move_node("c", 0).unwrap();

        let order: Vec<(&str, i64)> = pipeline
            .sorted_middlewares()
            .iter()
            .map(|n| (n.id.as_str(), n.order))
            .collect();
        assert_eq!(order, vec![("c", 0), ("a", 1), ("b", 2)]);

        pipeline.move_node("c", 99).unwrap();
        assert_eq!(pipeline.sorted_middlewares()[2].id, "c");

        assert!(pipeline.move_node("missing", 0).is_err());
        assert_eq!(pipeline.middlewares.len(), 3);
    }

    #[test]
    fn test_update_config_on_nested_node() {
        let mut pipeline = branched_pipeline();
        pipeline
            .update_config("inner", MiddlewareConfig::new().with("policies", "admin"))
            .unwrap();
        let inner = pipeline.find_node("inner").unwrap();
        assert_eq!(inner.config.string_list("policies"), vec!["admin"]);
    }

    #[test]
    fn test_attach_and_detach_branch() {
        let mut pipeline = branched_pipeline();

        // Replacing a branch may reuse the ids of the branch it replaces.
        let replacement = BranchConfig::new(BranchCondition::authenticated())
            .on_true(vec![node("inner", MiddlewareKind::Authorization, 0)]);
        pipeline.attach_branch("gate", replacement).unwrap();
        assert!(pipeline.find_node("fallback").is_none());

        let clashing = BranchConfig::new(BranchCondition::authenticated())
            .on_true(vec![node("gate", MiddlewareKind::Custom, 0)]);
        assert!(pipeline.attach_branch("tail", clashing).is_err());

        let detached = pipeline.detach_branch("gate").unwrap();
        assert!(detached.is_some());
        assert!(pipeline.find_node("inner").is_none());
        assert!(pipeline.detach_branch("nope").is_err());
    }

    #[test]
    fn test_node_ids_depth_first() {
        let pipeline = branched_pipeline();
        assert_eq!(pipeline.node_ids(), vec!["gate", "inner", "fallback", "tail"]);
    }
}
