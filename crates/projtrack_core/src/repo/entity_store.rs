//! Entity store: single source of truth for wrappers and projects.
//!
//! # Responsibility
//! - Own the in-memory model and the storage backend it round-trips through.
//! - Provide CRUD entry points that enforce naming and referential rules.
//! - Assign collision-free ids on creation.
//!
//! # Invariants
//! - Every check runs before any field is written; a failed call leaves the
//!   model untouched.
//! - Mutators change memory only. Persistence happens on explicit `save`.
//! - A wrapper with referencing projects is never removed.

use crate::error::ErrorKind;
use crate::model::document::Model;
use crate::model::entity::{
    normalize_name, EntityKind, EntityValidationError, Project, ProjectDraft, ProjectId,
    ProjectPatch, Status, Wrapper, WrapperId,
};
use crate::storage::{ModelStorage, StorageError};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Entity store error.
#[derive(Debug)]
pub enum StoreError {
    Validation(EntityValidationError),
    WrapperNotFound(WrapperId),
    ProjectNotFound(ProjectId),
    /// In-progress project cannot join a completed wrapper.
    WrapperCompleted { wrapper_id: WrapperId },
    /// Wrapper is still referenced by projects.
    WrapperHasChildren {
        wrapper_id: WrapperId,
        child_count: usize,
    },
    Storage(StorageError),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::WrapperNotFound(_) | Self::ProjectNotFound(_) => ErrorKind::NotFound,
            Self::WrapperCompleted { .. } => ErrorKind::InvalidState,
            Self::WrapperHasChildren { .. } => ErrorKind::ReferentialIntegrity,
            Self::Storage(err) => err.kind(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::WrapperNotFound(id) => write!(f, "wrapper not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::WrapperCompleted { wrapper_id } => write!(
                f,
                "wrapper {wrapper_id} is completed and cannot take an unfinished project"
            ),
            Self::WrapperHasChildren {
                wrapper_id,
                child_count,
            } => write!(
                f,
                "wrapper {wrapper_id} still has {child_count} project(s) attached"
            ),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::WrapperNotFound(_) => None,
            Self::ProjectNotFound(_) => None,
            Self::WrapperCompleted { .. } => None,
            Self::WrapperHasChildren { .. } => None,
        }
    }
}

impl From<EntityValidationError> for StoreError {
    fn from(value: EntityValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Entity store bound to one storage backend.
#[derive(Debug)]
pub struct EntityStore<S: ModelStorage> {
    storage: S,
    model: Model,
}

impl<S: ModelStorage> EntityStore<S> {
    /// Loads the model from `storage`.
    pub fn open(storage: S) -> StoreResult<Self> {
        let model = storage.load()?;
        Ok(Self { storage, model })
    }

    /// Wraps an already-loaded model without touching storage.
    pub fn with_model(storage: S, model: Model) -> Self {
        Self { storage, model }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Releases the backend and the final in-memory model.
    pub fn into_parts(self) -> (S, Model) {
        (self.storage, self.model)
    }

    /// Replaces the in-memory model with the persisted one.
    ///
    /// On failure the current model is kept.
    pub fn reload(&mut self) -> StoreResult<()> {
        self.model = self.storage.load()?;
        Ok(())
    }

    /// Writes the full model to storage.
    ///
    /// On failure the in-memory model stays authoritative and unchanged.
    pub fn save(&self) -> StoreResult<()> {
        self.storage.save(&self.model).map_err(Into::into)
    }

    pub fn wrappers(&self) -> &[Wrapper] {
        &self.model.wrappers
    }

    pub fn projects(&self) -> &[Project] {
        &self.model.projects
    }

    pub fn find_wrapper(&self, id: &str) -> Option<&Wrapper> {
        self.model.find_wrapper(id)
    }

    pub fn find_project(&self, id: &str) -> Option<&Project> {
        self.model.find_project(id)
    }

    /// Projects attached to `wrapper_id`, in collection order.
    pub fn children(&self, wrapper_id: &str) -> Vec<&Project> {
        self.model
            .projects
            .iter()
            .filter(|project| project.belongs_to(wrapper_id))
            .collect()
    }

    /// Creates one wrapper and returns its assigned id.
    ///
    /// # Errors
    /// - `Validation` when `name` is blank.
    /// - `Validation` when `status` is completed: a fresh wrapper has no children.
    pub fn add_wrapper(&mut self, name: &str, status: Status) -> StoreResult<WrapperId> {
        let name = normalize_name(EntityKind::Wrapper, name)?;
        if status.is_completed() {
            return Err(EntityValidationError::CompletedWrapperWithoutChildren.into());
        }

        let id = next_id(|candidate| self.model.find_wrapper(candidate).is_some());
        self.model.wrappers.push(Wrapper {
            id: id.clone(),
            name,
            status,
        });
        info!("event=wrapper_add module=store status=ok wrapper_id={id}");
        Ok(id)
    }

    /// Renames one wrapper.
    pub fn rename_wrapper(&mut self, id: &str, name: &str) -> StoreResult<()> {
        let name = normalize_name(EntityKind::Wrapper, name)?;
        let wrapper = self
            .model
            .wrapper_mut(id)
            .ok_or_else(|| StoreError::WrapperNotFound(id.to_string()))?;
        wrapper.name = name;
        debug!("event=wrapper_rename module=store status=ok wrapper_id={id}");
        Ok(())
    }

    /// Creates one project and returns its assigned id.
    ///
    /// # Errors
    /// - `Validation` when the draft name is blank.
    /// - `WrapperNotFound` when the draft references an unknown wrapper.
    /// - `WrapperCompleted` when an in-progress draft targets a completed wrapper.
    pub fn add_project(&mut self, draft: ProjectDraft) -> StoreResult<ProjectId> {
        let name = normalize_name(EntityKind::Project, &draft.name)?;
        if let Some(wrapper_id) = &draft.wrapper_id {
            self.ensure_can_attach(wrapper_id, draft.status)?;
        }

        let id = next_id(|candidate| self.model.find_project(candidate).is_some());
        self.model.projects.push(Project {
            id: id.clone(),
            name,
            status: draft.status,
            wrapper_id: draft.wrapper_id,
            owner: draft.owner,
            start_date: draft.start_date,
            end_date: draft.end_date,
            notes: draft.notes,
        });
        info!("event=project_add module=store status=ok project_id={id}");
        Ok(id)
    }

    /// Applies a partial update to one project.
    ///
    /// # Errors
    /// - `ProjectNotFound` when `id` is unknown.
    /// - `Validation` when a patched name is blank.
    /// - `WrapperNotFound` when the patch attaches to an unknown wrapper.
    /// - `WrapperCompleted` when an in-progress project moves into a completed wrapper.
    pub fn update_project(&mut self, id: &str, patch: &ProjectPatch) -> StoreResult<()> {
        let current = self
            .model
            .find_project(id)
            .ok_or_else(|| StoreError::ProjectNotFound(id.to_string()))?;
        let name = match &patch.name {
            Some(value) => Some(normalize_name(EntityKind::Project, value)?),
            None => None,
        };
        if let Some(Some(wrapper_id)) = &patch.wrapper_id {
            if !current.belongs_to(wrapper_id) {
                self.ensure_can_attach(wrapper_id, current.status)?;
            }
        }

        let project = self
            .model
            .project_mut(id)
            .ok_or_else(|| StoreError::ProjectNotFound(id.to_string()))?;
        patch.apply_to(project, name);
        debug!("event=project_update module=store status=ok project_id={id}");
        Ok(())
    }

    /// Removes one project and returns it.
    pub fn delete_project(&mut self, id: &str) -> StoreResult<Project> {
        let index = self
            .model
            .projects
            .iter()
            .position(|project| project.id == id)
            .ok_or_else(|| StoreError::ProjectNotFound(id.to_string()))?;
        let removed = self.model.projects.remove(index);
        info!("event=project_delete module=store status=ok project_id={id}");
        Ok(removed)
    }

    /// Removes one childless wrapper and returns it.
    ///
    /// # Errors
    /// - `WrapperNotFound` when `id` is unknown.
    /// - `WrapperHasChildren` when any project references the wrapper.
    pub fn delete_wrapper(&mut self, id: &str) -> StoreResult<Wrapper> {
        let index = self
            .model
            .wrappers
            .iter()
            .position(|wrapper| wrapper.id == id)
            .ok_or_else(|| StoreError::WrapperNotFound(id.to_string()))?;
        let child_count = self.model.child_count(id);
        if child_count > 0 {
            return Err(StoreError::WrapperHasChildren {
                wrapper_id: id.to_string(),
                child_count,
            });
        }
        let removed = self.model.wrappers.remove(index);
        info!("event=wrapper_delete module=store status=ok wrapper_id={id}");
        Ok(removed)
    }

    /// Sets one project's status. Returns `false` when `id` is unknown.
    ///
    /// Transition rules live in the status controller.
    pub(crate) fn set_project_status(&mut self, id: &str, status: Status) -> bool {
        match self.model.project_mut(id) {
            Some(project) => {
                project.status = status;
                true
            }
            None => false,
        }
    }

    /// Sets one wrapper's status. Returns `false` when `id` is unknown.
    pub(crate) fn set_wrapper_status(&mut self, id: &str, status: Status) -> bool {
        match self.model.wrapper_mut(id) {
            Some(wrapper) => {
                wrapper.status = status;
                true
            }
            None => false,
        }
    }

    /// Checks that a project with `status` may be placed under `wrapper_id`.
    fn ensure_can_attach(&self, wrapper_id: &str, status: Status) -> StoreResult<()> {
        let wrapper = self
            .model
            .find_wrapper(wrapper_id)
            .ok_or_else(|| StoreError::WrapperNotFound(wrapper_id.to_string()))?;
        if wrapper.is_completed() && !status.is_completed() {
            return Err(StoreError::WrapperCompleted {
                wrapper_id: wrapper_id.to_string(),
            });
        }
        Ok(())
    }
}

/// Generates a random v4 id not yet used in the target collection.
fn next_id(is_taken: impl Fn(&str) -> bool) -> String {
    loop {
        let candidate = Uuid::new_v4().to_string();
        if !is_taken(&candidate) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::next_id;
    use std::cell::Cell;

    #[test]
    fn next_id_skips_taken_candidates() {
        let calls = Cell::new(0);
        let id = next_id(|_| {
            calls.set(calls.get() + 1);
            calls.get() < 3
        });
        assert_eq!(calls.get(), 3);
        assert_eq!(id.len(), 36);
    }
}
