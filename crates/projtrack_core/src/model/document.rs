//! In-memory model and its persisted JSON document shape.
//!
//! # Responsibility
//! - Hold the flat wrapper/project collections in collection order.
//! - Parse and render the persisted document, validating at the boundary.
//!
//! # Invariants
//! - Parsed models never contain duplicate ids within one collection.
//! - Parsed models never contain a `wrapper_id` pointing at a missing wrapper.
//! - The `type` field is a round-trip tag only; it must match its collection.

use crate::error::ErrorKind;
use crate::model::entity::{EntityKind, Project, ProjectId, Status, Wrapper, WrapperId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Flat wrapper/project collections.
///
/// Vec order is collection order; the tree builder and child listings rely on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    pub wrappers: Vec<Wrapper>,
    pub projects: Vec<Project>,
}

impl Model {
    pub fn new(wrappers: Vec<Wrapper>, projects: Vec<Project>) -> Self {
        Self { wrappers, projects }
    }

    pub fn find_wrapper(&self, id: &str) -> Option<&Wrapper> {
        self.wrappers.iter().find(|wrapper| wrapper.id == id)
    }

    pub fn find_project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    /// Projects attached to `wrapper_id`, in collection order, any status.
    pub fn children_of<'a>(&'a self, wrapper_id: &'a str) -> impl Iterator<Item = &'a Project> {
        self.projects
            .iter()
            .filter(move |project| project.belongs_to(wrapper_id))
    }

    pub fn child_count(&self, wrapper_id: &str) -> usize {
        self.children_of(wrapper_id).count()
    }

    /// Projects without a wrapper, in collection order.
    pub fn loose_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|project| project.is_loose())
    }

    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty() && self.projects.is_empty()
    }

    pub(crate) fn wrapper_mut(&mut self, id: &str) -> Option<&mut Wrapper> {
        self.wrappers.iter_mut().find(|wrapper| wrapper.id == id)
    }

    pub(crate) fn project_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|project| project.id == id)
    }
}

/// Errors raised while turning persisted text into a [`Model`].
#[derive(Debug)]
pub enum ParseError {
    /// JSON syntax error, missing required field, unknown status or bad date.
    Malformed(serde_json::Error),
    /// Top-level JSON value is not an object.
    NotAnObject,
    /// Record `type` tag does not match the collection it appears in.
    UnexpectedTag {
        entity: EntityKind,
        id: String,
        tag: String,
    },
    /// Record id is blank.
    EmptyId { entity: EntityKind },
    /// Two records in one collection share an id.
    DuplicateId { entity: EntityKind, id: String },
    /// Project references a wrapper id absent from the document.
    DanglingWrapperRef {
        project_id: ProjectId,
        wrapper_id: WrapperId,
    },
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Parse
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed projects document: {err}"),
            Self::NotAnObject => write!(f, "projects document must be a JSON object"),
            Self::UnexpectedTag { entity, id, tag } => write!(
                f,
                "{entity} `{id}` has type tag `{tag}`, expected `{}`",
                entity.as_str()
            ),
            Self::EmptyId { entity } => write!(f, "{entity} record has a blank id"),
            Self::DuplicateId { entity, id } => write!(f, "duplicate {entity} id `{id}`"),
            Self::DanglingWrapperRef {
                project_id,
                wrapper_id,
            } => write!(
                f,
                "project `{project_id}` references missing wrapper `{wrapper_id}`"
            ),
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocumentRecord {
    #[serde(default)]
    wrappers: Vec<WrapperRecord>,
    #[serde(default)]
    projects: Vec<ProjectRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WrapperRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    tag: String,
    status: Status,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    tag: String,
    status: Status,
    // Required key; only the value may be null.
    #[serde(deserialize_with = "Option::deserialize")]
    wrapper_id: Option<String>,
    owner: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    #[serde(default)]
    notes: String,
}

/// Parses a persisted document and validates referential integrity.
///
/// # Errors
/// - [`ParseError::Malformed`] for invalid JSON or record shape.
/// - [`ParseError::NotAnObject`] when the top-level value is an array, string, etc.
/// - Tag, id and reference errors for structurally valid but inconsistent data.
pub fn parse_document(text: &str) -> Result<Model, ParseError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(ParseError::NotAnObject);
    }
    let record = DocumentRecord::deserialize(value)?;

    let mut wrapper_ids = HashSet::with_capacity(record.wrappers.len());
    let mut wrappers = Vec::with_capacity(record.wrappers.len());
    for item in record.wrappers {
        check_record(EntityKind::Wrapper, &item.id, &item.tag, &mut wrapper_ids)?;
        wrappers.push(Wrapper {
            id: item.id,
            name: item.name,
            status: item.status,
        });
    }

    let mut project_ids = HashSet::with_capacity(record.projects.len());
    let mut projects = Vec::with_capacity(record.projects.len());
    for item in record.projects {
        check_record(EntityKind::Project, &item.id, &item.tag, &mut project_ids)?;
        // Blank references are treated as "no wrapper".
        let wrapper_id = item.wrapper_id.filter(|value| !value.trim().is_empty());
        if let Some(wrapper_id) = &wrapper_id {
            if !wrapper_ids.contains(wrapper_id.as_str()) {
                return Err(ParseError::DanglingWrapperRef {
                    project_id: item.id,
                    wrapper_id: wrapper_id.clone(),
                });
            }
        }
        projects.push(Project {
            id: item.id,
            name: item.name,
            status: item.status,
            wrapper_id,
            owner: item.owner,
            start_date: item.start_date,
            end_date: item.end_date,
            notes: item.notes,
        });
    }

    Ok(Model { wrappers, projects })
}

/// Renders `model` as a pretty-printed document with `type` tags.
pub fn render_document(model: &Model) -> Result<String, serde_json::Error> {
    let record = DocumentRecord {
        wrappers: model
            .wrappers
            .iter()
            .map(|wrapper| WrapperRecord {
                id: wrapper.id.clone(),
                name: wrapper.name.clone(),
                tag: EntityKind::Wrapper.as_str().to_string(),
                status: wrapper.status,
            })
            .collect(),
        projects: model
            .projects
            .iter()
            .map(|project| ProjectRecord {
                id: project.id.clone(),
                name: project.name.clone(),
                tag: EntityKind::Project.as_str().to_string(),
                status: project.status,
                wrapper_id: project.wrapper_id.clone(),
                owner: project.owner.clone(),
                start_date: project.start_date,
                end_date: project.end_date,
                notes: project.notes.clone(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&record)
}

fn check_record(
    entity: EntityKind,
    id: &str,
    tag: &str,
    seen: &mut HashSet<String>,
) -> Result<(), ParseError> {
    if id.trim().is_empty() {
        return Err(ParseError::EmptyId { entity });
    }
    if tag != entity.as_str() {
        return Err(ParseError::UnexpectedTag {
            entity,
            id: id.to_string(),
            tag: tag.to_string(),
        });
    }
    if !seen.insert(id.to_string()) {
        return Err(ParseError::DuplicateId {
            entity,
            id: id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_document, ParseError};

    #[test]
    fn missing_collections_load_as_empty() {
        let model = parse_document("{}").unwrap();
        assert!(model.is_empty());
    }

    #[test]
    fn blank_wrapper_reference_is_loose() {
        let model = parse_document(
            r#"{"projects": [{
                "id": "p1", "name": "Loose", "type": "project", "status": "in_progress",
                "wrapper_id": "", "owner": "kim", "start_date": "2024-01-01",
                "end_date": "2024-02-01"
            }]}"#,
        )
        .unwrap();
        assert_eq!(model.projects[0].wrapper_id, None);
        assert_eq!(model.projects[0].notes, "");
    }

    #[test]
    fn top_level_array_is_rejected() {
        assert!(matches!(parse_document("[]"), Err(ParseError::NotAnObject)));
        assert!(matches!(parse_document("null"), Err(ParseError::NotAnObject)));
    }

    #[test]
    fn unknown_top_level_field_is_rejected() {
        let err = parse_document(r#"{"wrappers": [], "extra": 1}"#).unwrap_err();
        assert!(matches!(err, ParseError::Malformed(_)));
    }
}
