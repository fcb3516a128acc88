//! Projects use-case facade.
//!
//! # Responsibility
//! - Provide the operation surface the presentation layer calls.
//! - Follow every successful mutation with a tree rebuild and a save.
//! - Route destructive operations through the caller's confirmation policy.
//!
//! # Invariants
//! - `tree()` always reflects the in-memory model, even after a failed save.
//! - Integrity checks run before the caller is asked to confirm a delete.
//! - A declined confirmation changes nothing and is not an error.

use crate::error::ErrorKind;
use crate::model::document::Model;
use crate::model::entity::{ProjectDraft, ProjectId, ProjectPatch, Status, WrapperId};
use crate::repo::entity_store::{EntityStore, StoreError};
use crate::service::confirm::{ConfirmRequest, ConfirmationPolicy};
use crate::service::status_controller::{
    CompletionOutcome, ProjectCompletion, StatusController, StatusError,
};
use crate::storage::ModelStorage;
use crate::tree::builder::{build_tree, NodeType, StatusTree};
use crate::tree::selection::{select_node, wrapper_choices, SelectionView};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Facade error: either a store failure or a status transition failure.
#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    Status(StatusError),
    /// Entity was created in memory but the save failed.
    Unsaved { id: String, source: StoreError },
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(err) => err.kind(),
            Self::Status(err) => err.kind(),
            Self::Unsaved { source, .. } => source.kind(),
        }
    }

    /// Id of an entity that exists in memory but was not persisted.
    pub fn created_id(&self) -> Option<&str> {
        match self {
            Self::Unsaved { id, .. } => Some(id),
            _ => None,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Status(err) => write!(f, "{err}"),
            Self::Unsaved { id, source } => write!(f, "{id} created but not saved: {source}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Status(err) => Some(err),
            Self::Unsaved { source, .. } => Some(source),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<StatusError> for ServiceError {
    fn from(value: StatusError) -> Self {
        Self::Status(value)
    }
}

/// Outcome of a confirmed delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
}

/// Facade owning one entity store and its latest display tree.
pub struct ProjectsService<S: ModelStorage> {
    store: EntityStore<S>,
    tree: StatusTree,
}

impl<S: ModelStorage> ProjectsService<S> {
    /// Loads the model from `storage` and builds the initial tree.
    pub fn open(storage: S) -> ServiceResult<Self> {
        Ok(Self::from_store(EntityStore::open(storage)?))
    }

    pub fn from_store(store: EntityStore<S>) -> Self {
        let tree = build_tree(store.model());
        Self { store, tree }
    }

    pub fn tree(&self) -> &StatusTree {
        &self.tree
    }

    pub fn store(&self) -> &EntityStore<S> {
        &self.store
    }

    pub fn model(&self) -> &Model {
        self.store.model()
    }

    pub fn into_store(self) -> EntityStore<S> {
        self.store
    }

    pub fn add_wrapper(&mut self, name: &str) -> ServiceResult<WrapperId> {
        let id = self.store.add_wrapper(name, Status::InProgress)?;
        self.commit_created(id)
    }

    pub fn rename_wrapper(&mut self, id: &str, name: &str) -> ServiceResult<()> {
        self.store.rename_wrapper(id, name)?;
        self.commit()
    }

    pub fn add_project(&mut self, draft: ProjectDraft) -> ServiceResult<ProjectId> {
        let id = self.store.add_project(draft)?;
        self.commit_created(id)
    }

    pub fn update_project(&mut self, id: &str, patch: &ProjectPatch) -> ServiceResult<()> {
        self.store.update_project(id, patch)?;
        self.commit()
    }

    /// Deletes one project after the policy confirms.
    pub fn delete_project<P>(&mut self, id: &str, policy: &mut P) -> ServiceResult<DeleteOutcome>
    where
        P: ConfirmationPolicy + ?Sized,
    {
        let project = self
            .store
            .find_project(id)
            .ok_or_else(|| StoreError::ProjectNotFound(id.to_string()))?;
        let request = ConfirmRequest::DeleteProject { project };
        if !policy.confirm(&request) {
            log_declined(request.action(), id);
            return Ok(DeleteOutcome::Declined);
        }

        self.store.delete_project(id)?;
        self.commit()?;
        Ok(DeleteOutcome::Deleted)
    }

    /// Deletes one childless wrapper after the policy confirms.
    ///
    /// The children check runs first, so the caller is never asked to
    /// confirm a delete that would be refused.
    pub fn delete_wrapper<P>(&mut self, id: &str, policy: &mut P) -> ServiceResult<DeleteOutcome>
    where
        P: ConfirmationPolicy + ?Sized,
    {
        let wrapper = self
            .store
            .find_wrapper(id)
            .ok_or_else(|| StoreError::WrapperNotFound(id.to_string()))?;
        let child_count = self.store.model().child_count(id);
        if child_count > 0 {
            return Err(StoreError::WrapperHasChildren {
                wrapper_id: id.to_string(),
                child_count,
            }
            .into());
        }
        let request = ConfirmRequest::DeleteWrapper { wrapper };
        if !policy.confirm(&request) {
            log_declined(request.action(), id);
            return Ok(DeleteOutcome::Declined);
        }

        self.store.delete_wrapper(id)?;
        self.commit()?;
        Ok(DeleteOutcome::Deleted)
    }

    /// Completes one project without acting on a cascade candidate.
    pub fn complete_project(&mut self, id: &str) -> ServiceResult<ProjectCompletion> {
        let result = StatusController::new(&mut self.store).complete_project(id);
        self.rebuild();
        Ok(result?)
    }

    /// Completes one project and asks `policy` whether to complete an
    /// eligible wrapper as well.
    pub fn complete_project_with_cascade<P>(
        &mut self,
        id: &str,
        policy: &mut P,
    ) -> ServiceResult<CompletionOutcome>
    where
        P: ConfirmationPolicy + ?Sized,
    {
        let result =
            StatusController::new(&mut self.store).complete_project_with_cascade(id, policy);
        self.rebuild();
        Ok(result?)
    }

    pub fn complete_wrapper(&mut self, id: &str) -> ServiceResult<()> {
        let result = StatusController::new(&mut self.store).complete_wrapper(id);
        self.rebuild();
        Ok(result?)
    }

    /// Resolves a selected tree node into a child list or project detail.
    pub fn select(&self, node_type: NodeType, node_id: &str) -> Option<SelectionView> {
        select_node(self.store.model(), node_type, node_id)
    }

    /// Ordered `(id, name)` pairs of every wrapper.
    pub fn wrapper_choices(&self) -> Vec<(String, String)> {
        wrapper_choices(self.store.model())
    }

    fn rebuild(&mut self) {
        self.tree = build_tree(self.store.model());
    }

    fn commit(&mut self) -> ServiceResult<()> {
        self.rebuild();
        self.store.save()?;
        Ok(())
    }

    /// Like `commit`, but a failed save still hands back the new id.
    fn commit_created(&mut self, id: String) -> ServiceResult<String> {
        self.rebuild();
        match self.store.save() {
            Ok(()) => Ok(id),
            Err(source) => Err(ServiceError::Unsaved { id, source }),
        }
    }
}

fn log_declined(action: &str, id: &str) {
    info!("event={action} module=service status=declined id={id}");
}
