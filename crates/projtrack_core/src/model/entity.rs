//! Wrapper/Project domain entities.
//!
//! # Responsibility
//! - Define the canonical records for groupings (`Wrapper`) and work items (`Project`).
//! - Provide create/update payloads and name validation shared by write paths.
//!
//! # Invariants
//! - `id` is unique within its own collection (enforced by the store).
//! - `status` only moves forward: `in_progress -> completed`.
//! - Names are stored trimmed and are never blank.

use crate::error::ErrorKind;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Identifier of a wrapper inside the wrapper collection.
pub type WrapperId = String;

/// Identifier of a project inside the project collection.
pub type ProjectId = String;

/// Lifecycle status shared by wrappers and projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Initial state.
    #[default]
    InProgress,
    /// Terminal state. There is no transition back.
    Completed,
}

impl Status {
    /// All statuses in bucket display order.
    pub const ALL: [Status; 2] = [Status::InProgress, Status::Completed];

    /// Wire value, also used as the bucket node id.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Human-readable bucket label.
    pub fn label(self) -> &'static str {
        match self {
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
        }
    }

    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(format!(
                "unknown status `{other}`; expected in_progress|completed"
            )),
        }
    }
}

/// Entity collection discriminator, used in errors and confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Wrapper,
    Project,
}

impl EntityKind {
    /// Wire `type` tag for records of this collection.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wrapper => "wrapper",
            Self::Project => "project",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named grouping of projects with its own lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wrapper {
    pub id: WrapperId,
    pub name: String,
    pub status: Status,
}

impl Wrapper {
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }
}

/// Individual work item, optionally attached to one wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub status: Status,
    /// `None` means the project is loose (listed directly under its status bucket).
    pub wrapper_id: Option<WrapperId>,
    pub owner: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: String,
}

impl Project {
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Returns whether this project is attached to `wrapper_id`.
    pub fn belongs_to(&self, wrapper_id: &str) -> bool {
        self.wrapper_id.as_deref() == Some(wrapper_id)
    }

    pub fn is_loose(&self) -> bool {
        self.wrapper_id.is_none()
    }
}

/// Caller-supplied fields for creating a project.
///
/// The id is never part of the draft; the store assigns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    pub name: String,
    pub status: Status,
    pub wrapper_id: Option<WrapperId>,
    pub owner: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: String,
}

impl ProjectDraft {
    /// Creates an in-progress, loose draft with empty owner and notes.
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            status: Status::InProgress,
            wrapper_id: None,
            owner: String::new(),
            start_date,
            end_date,
            notes: String::new(),
        }
    }

    pub fn in_wrapper(mut self, wrapper_id: impl Into<WrapperId>) -> Self {
        self.wrapper_id = Some(wrapper_id.into());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Field-level partial update for a project.
///
/// `None` leaves a field untouched. `wrapper_id: Some(None)` detaches the
/// project from its wrapper. Status is absent: status changes go
/// through the status controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub owner: Option<String>,
    pub wrapper_id: Option<Option<WrapperId>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Writes every present field into `project`.
    ///
    /// Callers must validate the patch first; this never fails.
    pub(crate) fn apply_to(&self, project: &mut Project, normalized_name: Option<String>) {
        if let Some(name) = normalized_name {
            project.name = name;
        }
        if let Some(owner) = &self.owner {
            project.owner = owner.clone();
        }
        if let Some(wrapper_id) = &self.wrapper_id {
            project.wrapper_id = wrapper_id.clone();
        }
        if let Some(start_date) = self.start_date {
            project.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            project.end_date = end_date;
        }
        if let Some(notes) = &self.notes {
            project.notes = notes.clone();
        }
    }
}

/// Validation error for entity write payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityValidationError {
    /// Name is empty after trimming.
    EmptyName { entity: EntityKind },
    /// A wrapper cannot start out completed: it has no children yet.
    CompletedWrapperWithoutChildren,
}

impl EntityValidationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

impl Display for EntityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName { entity } => write!(f, "{entity} name must not be blank"),
            Self::CompletedWrapperWithoutChildren => {
                write!(f, "a new wrapper cannot be completed before it has projects")
            }
        }
    }
}

impl Error for EntityValidationError {}

/// Trims `value` and rejects blank names.
pub fn normalize_name(entity: EntityKind, value: &str) -> Result<String, EntityValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EntityValidationError::EmptyName { entity });
    }
    Ok(trimmed.to_string())
}
