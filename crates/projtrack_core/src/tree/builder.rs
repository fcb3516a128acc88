//! Status tree derivation.
//!
//! # Responsibility
//! - Map a model snapshot onto the two-bucket display tree.
//!
//! # Invariants
//! - Pure: never mutates the model and has no side effects.
//! - Deterministic: identical input yields identical node order and ids.
//! - Buckets appear as `in_progress`, then `completed`.
//! - Inside a bucket, wrappers come first, then loose projects, each in
//!   collection order.
//! - A wrapper node lists every attached project regardless of that
//!   project's own status.

use crate::model::document::Model;
use crate::model::entity::{Project, Status};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Node kind used by the presentation layer for reverse lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    StatusRoot,
    Wrapper,
    Project,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StatusRoot => "status_root",
            Self::Wrapper => "wrapper",
            Self::Project => "project",
        }
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "status_root" => Ok(Self::StatusRoot),
            "wrapper" => Ok(Self::Wrapper),
            "project" => Ok(Self::Project),
            other => Err(format!(
                "unknown node type `{other}`; expected status_root|wrapper|project"
            )),
        }
    }
}

/// One display node.
///
/// Bucket nodes use the status wire value as `node_id` and carry the bucket's
/// status; entity nodes carry their own status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub node_type: NodeType,
    pub node_id: String,
    pub label: String,
    pub status: Status,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(project: &Project) -> Self {
        Self {
            node_type: NodeType::Project,
            node_id: project.id.clone(),
            label: project.name.clone(),
            status: project.status,
            children: Vec::new(),
        }
    }

    /// Depth-first search for a node by `(node_type, node_id)`.
    pub fn find(&self, node_type: NodeType, node_id: &str) -> Option<&TreeNode> {
        if self.node_type == node_type && self.node_id == node_id {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find(node_type, node_id))
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }
}

/// Display tree with exactly one root per status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTree {
    pub roots: Vec<TreeNode>,
}

impl StatusTree {
    /// Returns the bucket node for `status`.
    pub fn bucket(&self, status: Status) -> Option<&TreeNode> {
        self.roots
            .iter()
            .find(|root| root.node_id == status.as_str())
    }

    pub fn find(&self, node_type: NodeType, node_id: &str) -> Option<&TreeNode> {
        self.roots
            .iter()
            .find_map(|root| root.find(node_type, node_id))
    }

    /// Total node count including bucket roots.
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(TreeNode::count).sum()
    }
}

/// Builds the grouped status tree from a model snapshot.
///
/// Runs in O(wrappers + projects). Projects whose `wrapper_id` points at a
/// wrapper missing from `model` have no parent node and are left out.
pub fn build_tree(model: &Model) -> StatusTree {
    let mut children_by_wrapper: HashMap<&str, Vec<&Project>> = HashMap::new();
    for project in &model.projects {
        if let Some(wrapper_id) = project.wrapper_id.as_deref() {
            children_by_wrapper
                .entry(wrapper_id)
                .or_default()
                .push(project);
        }
    }

    let roots = Status::ALL
        .iter()
        .map(|&status| {
            let wrapper_nodes = model
                .wrappers
                .iter()
                .filter(|wrapper| wrapper.status == status)
                .map(|wrapper| TreeNode {
                    node_type: NodeType::Wrapper,
                    node_id: wrapper.id.clone(),
                    label: wrapper.name.clone(),
                    status: wrapper.status,
                    children: children_by_wrapper
                        .get(wrapper.id.as_str())
                        .map(|projects| projects.iter().map(|p| TreeNode::leaf(p)).collect())
                        .unwrap_or_default(),
                });
            let loose_nodes = model
                .loose_projects()
                .filter(|project| project.status == status)
                .map(TreeNode::leaf);

            TreeNode {
                node_type: NodeType::StatusRoot,
                node_id: status.as_str().to_string(),
                label: status.label().to_string(),
                status,
                children: wrapper_nodes.chain(loose_nodes).collect(),
            }
        })
        .collect();

    StatusTree { roots }
}
