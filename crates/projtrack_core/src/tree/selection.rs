//! Node selection views.
//!
//! Resolves a selected `(node_type, node_id)` into either a one-level child
//! list (bucket or wrapper) or a project detail record.

use super::builder::NodeType;
use crate::model::document::Model;
use crate::model::entity::{Project, Status};
use serde::Serialize;

/// One row of a child list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildRow {
    pub node_type: NodeType,
    pub id: String,
    pub name: String,
    pub status: Status,
}

/// What the presentation layer shows for a selected node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum SelectionView {
    /// Direct children of a bucket or wrapper.
    Children { rows: Vec<ChildRow> },
    /// Full record of a selected project.
    ProjectDetail { project: Project },
}

/// Resolves a selected node against `model`.
///
/// Returns `None` for unknown ids and for bucket ids that are not a status.
pub fn select_node(model: &Model, node_type: NodeType, node_id: &str) -> Option<SelectionView> {
    match node_type {
        NodeType::StatusRoot => {
            let status = node_id.parse::<Status>().ok()?;
            Some(SelectionView::Children {
                rows: bucket_rows(model, status),
            })
        }
        NodeType::Wrapper => {
            model.find_wrapper(node_id)?;
            Some(SelectionView::Children {
                rows: model.children_of(node_id).map(project_row).collect(),
            })
        }
        NodeType::Project => model
            .find_project(node_id)
            .map(|project| SelectionView::ProjectDetail {
                project: project.clone(),
            }),
    }
}

/// Ordered `(id, name)` pairs for a "move to wrapper" picker.
pub fn wrapper_choices(model: &Model) -> Vec<(String, String)> {
    model
        .wrappers
        .iter()
        .map(|wrapper| (wrapper.id.clone(), wrapper.name.clone()))
        .collect()
}

fn bucket_rows(model: &Model, status: Status) -> Vec<ChildRow> {
    let wrappers = model
        .wrappers
        .iter()
        .filter(|wrapper| wrapper.status == status)
        .map(|wrapper| ChildRow {
            node_type: NodeType::Wrapper,
            id: wrapper.id.clone(),
            name: wrapper.name.clone(),
            status: wrapper.status,
        });
    let loose = model
        .loose_projects()
        .filter(|project| project.status == status)
        .map(project_row);
    wrappers.chain(loose).collect()
}

fn project_row(project: &Project) -> ChildRow {
    ChildRow {
        node_type: NodeType::Project,
        id: project.id.clone(),
        name: project.name.clone(),
        status: project.status,
    }
}
