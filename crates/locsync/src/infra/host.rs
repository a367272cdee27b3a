//! Capability surface of the host document.
//!
//! The node tree and the variable store are owned by the embedding host; the
//! core only ever touches them through these traits. [`NodeTree`] is the read
//! side used by scanning, [`VariableStore`] the write side used by
//! reconciliation. The file-backed implementation lives in
//! [`document`](crate::infra::document).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::model::NodeId;

/// Handle to a variable inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(String);

impl VariableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a variable collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(String);

impl CollectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to a mode within a collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModeId(String);

impl ModeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification of a node as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Page,
    Frame,
    Group,
    Section,
    Component,
    Instance,
    Text,
    /// Anything else the host may expose: shapes, vectors, and so on.
    #[serde(other)]
    Other,
}

impl NodeKind {
    /// Kinds that may hold children regardless of their current child count.
    pub fn container_capable(&self) -> bool {
        matches!(
            self,
            NodeKind::Page
                | NodeKind::Frame
                | NodeKind::Group
                | NodeKind::Section
                | NodeKind::Component
                | NodeKind::Instance
        )
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text)
    }
}

/// Snapshot of one node's host-visible attributes.
///
/// `visible` is the node's own flag; ancestor visibility is not folded in
/// here. Traversal combines the flags along the path itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub visible: bool,
    /// Text payload, present on text nodes.
    pub characters: Option<String>,
    /// Variable currently driving the text payload, if any.
    pub bound_variable: Option<VariableId>,
}

/// Failures surfaced by host capability calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("unknown collection {0}")]
    UnknownCollection(CollectionId),
    #[error("unknown variable {0}")]
    UnknownVariable(VariableId),
    #[error("unknown mode {0}")]
    UnknownMode(ModeId),
    #[error("node {0} carries no text content")]
    NotText(NodeId),
    #[error("{0}")]
    Backend(String),
}

/// Read surface over the host document's node tree.
pub trait NodeTree {
    /// Nodes the user currently has designated, in selection order.
    fn selection(&self) -> Vec<NodeId>;

    /// Resolve a node by identity; stale handles resolve to `None`.
    fn node(&self, id: &NodeId) -> Option<NodeInfo>;

    /// Child ids in document order; empty for leaves and unknown ids.
    fn children(&self, id: &NodeId) -> Vec<NodeId>;

    /// Whether `info` may hold children. Container kinds always qualify, and
    /// so does any node the host currently reports children for, which keeps
    /// kinds this crate does not know about scannable.
    fn is_container(&self, info: &NodeInfo) -> bool {
        info.kind.container_capable() || !self.children(&info.id).is_empty()
    }
}

/// Write surface over the host's variable collections.
pub trait VariableStore {
    /// Look up a collection by display name.
    fn collection_named(&self, name: &str) -> Option<CollectionId>;

    fn create_collection(&mut self, name: &str) -> Result<CollectionId, HostError>;

    /// Mode handles of a collection, in declaration order.
    fn modes(&self, collection: &CollectionId) -> Result<Vec<ModeId>, HostError>;

    fn add_mode(&mut self, collection: &CollectionId, name: &str) -> Result<ModeId, HostError>;

    /// Look up a variable by key within one collection.
    fn variable_named(&self, collection: &CollectionId, name: &str) -> Option<VariableId>;

    fn create_variable(
        &mut self,
        collection: &CollectionId,
        name: &str,
    ) -> Result<VariableId, HostError>;

    /// Overwrite the value a variable holds for one mode.
    fn set_value(
        &mut self,
        variable: &VariableId,
        mode: &ModeId,
        value: &str,
    ) -> Result<(), HostError>;

    /// Drive the text content of `node` from `variable`. Rebinding replaces
    /// any earlier association; rebinding to the same variable is a no-op.
    fn bind_text(&mut self, node: &NodeId, variable: &VariableId) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_capable_covers_structural_kinds() {
        for kind in [
            NodeKind::Page,
            NodeKind::Frame,
            NodeKind::Group,
            NodeKind::Section,
            NodeKind::Component,
            NodeKind::Instance,
        ] {
            assert!(kind.container_capable(), "{kind:?} should hold children");
        }
        assert!(!NodeKind::Text.container_capable());
        assert!(!NodeKind::Other.container_capable());
    }

    #[test]
    fn unknown_kinds_deserialize_as_other() {
        let kind: NodeKind = serde_json::from_str("\"vector\"").unwrap();
        assert_eq!(kind, NodeKind::Other);
        let kind: NodeKind = serde_json::from_str("\"frame\"").unwrap();
        assert_eq!(kind, NodeKind::Frame);
    }
}
