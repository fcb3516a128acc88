//! Status lifecycle and cascade completion.
//!
//! # Responsibility
//! - Enforce the one-way `in_progress -> completed` state machine.
//! - Detect when completing a project makes its wrapper eligible for completion.
//! - Persist every successful transition.
//!
//! # Invariants
//! - A wrapper completes only with at least one child and all children completed.
//! - Guards run before any status is written.
//! - The controller never decides a cascade on its own: it reports the
//!   candidate, and an injected policy decides.

use crate::error::ErrorKind;
use crate::model::document::Model;
use crate::model::entity::{EntityKind, ProjectId, Status, WrapperId};
use crate::repo::entity_store::EntityStore;
use crate::service::confirm::{ConfirmRequest, ConfirmationPolicy};
use crate::storage::{ModelStorage, StorageError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StatusResult<T> = Result<T, StatusError>;

/// Status transition error.
#[derive(Debug)]
pub enum StatusError {
    ProjectNotFound(ProjectId),
    WrapperNotFound(WrapperId),
    /// Entity is already in the terminal state.
    AlreadyCompleted { entity: EntityKind, id: String },
    /// Wrapper has no child projects and can never complete vacuously.
    WrapperHasNoChildren(WrapperId),
    /// Wrapper still has unfinished children, listed in collection order.
    IncompleteChildren {
        wrapper_id: WrapperId,
        pending: Vec<ProjectId>,
    },
    /// Project completed in memory but could not be persisted.
    /// `cascade_candidate` is the wrapper that became eligible, if any.
    ProjectUnsaved {
        project_id: ProjectId,
        cascade_candidate: Option<WrapperId>,
        source: StorageError,
    },
    /// Transition applied in memory but could not be persisted.
    Storage(StorageError),
}

impl StatusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProjectNotFound(_) | Self::WrapperNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyCompleted { .. } => ErrorKind::InvalidState,
            Self::WrapperHasNoChildren(_) => ErrorKind::ReferentialIntegrity,
            Self::IncompleteChildren { .. } => ErrorKind::IncompleteChildren,
            Self::ProjectUnsaved { source, .. } => source.kind(),
            Self::Storage(err) => err.kind(),
        }
    }

    /// Wrapper made eligible by a completion that failed to persist.
    pub fn cascade_candidate(&self) -> Option<&str> {
        match self {
            Self::ProjectUnsaved {
                cascade_candidate, ..
            } => cascade_candidate.as_deref(),
            _ => None,
        }
    }
}

impl Display for StatusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::WrapperNotFound(id) => write!(f, "wrapper not found: {id}"),
            Self::AlreadyCompleted { entity, id } => {
                write!(f, "{entity} {id} is already completed")
            }
            Self::WrapperHasNoChildren(id) => {
                write!(f, "wrapper {id} has no projects and cannot be completed")
            }
            Self::IncompleteChildren {
                wrapper_id,
                pending,
            } => write!(
                f,
                "wrapper {wrapper_id} has {} unfinished project(s)",
                pending.len()
            ),
            Self::ProjectUnsaved {
                project_id, source, ..
            } => write!(
                f,
                "project {project_id} completed but not saved: {source}"
            ),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StatusError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ProjectUnsaved { source, .. } => Some(source),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for StatusError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Whether a wrapper currently satisfies its completion rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapperReadiness {
    NoChildren,
    /// Ids of children not yet completed.
    Pending(Vec<ProjectId>),
    Ready,
}

/// Evaluates the completion rule for `wrapper_id` against `model`.
pub fn wrapper_readiness(model: &Model, wrapper_id: &str) -> WrapperReadiness {
    let mut child_count = 0usize;
    let mut pending = Vec::new();
    for child in model.children_of(wrapper_id) {
        child_count += 1;
        if !child.is_completed() {
            pending.push(child.id.clone());
        }
    }

    if child_count == 0 {
        WrapperReadiness::NoChildren
    } else if pending.is_empty() {
        WrapperReadiness::Ready
    } else {
        WrapperReadiness::Pending(pending)
    }
}

/// Result of `complete_project`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectCompletion {
    /// Project was already completed; nothing changed.
    AlreadyCompleted,
    /// Project moved to completed. `cascade_candidate` names its wrapper when
    /// every sibling is now completed and the wrapper is still in progress.
    Completed {
        cascade_candidate: Option<WrapperId>,
    },
}

impl ProjectCompletion {
    pub fn cascade_candidate(&self) -> Option<&str> {
        match self {
            Self::Completed {
                cascade_candidate: Some(wrapper_id),
            } => Some(wrapper_id.as_str()),
            _ => None,
        }
    }
}

/// Result of completing a project with the cascade decision applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    AlreadyCompleted,
    /// Project completed; its wrapper (if any) is not yet eligible.
    ProjectCompleted,
    /// Wrapper was eligible but the policy declined.
    CascadeDeclined { wrapper_id: WrapperId },
    /// Project and its wrapper both completed.
    WrapperCompleted { wrapper_id: WrapperId },
}

/// Status state machine on top of an entity store.
pub struct StatusController<'s, S: ModelStorage> {
    store: &'s mut EntityStore<S>,
}

impl<'s, S: ModelStorage> StatusController<'s, S> {
    pub fn new(store: &'s mut EntityStore<S>) -> Self {
        Self { store }
    }

    /// Completes one project and reports a cascade candidate.
    ///
    /// # Errors
    /// - `ProjectNotFound` when `id` is unknown.
    /// - `ProjectUnsaved` when the transition cannot be persisted; the
    ///   in-memory model keeps the new status and the error carries the
    ///   cascade candidate.
    pub fn complete_project(&mut self, id: &str) -> StatusResult<ProjectCompletion> {
        let project = self
            .store
            .find_project(id)
            .ok_or_else(|| StatusError::ProjectNotFound(id.to_string()))?;
        if project.is_completed() {
            info!("event=project_complete module=status status=noop project_id={id}");
            return Ok(ProjectCompletion::AlreadyCompleted);
        }
        let wrapper_id = project.wrapper_id.clone();

        self.store.set_project_status(id, Status::Completed);
        let cascade_candidate = wrapper_id.filter(|wrapper_id| self.is_cascade_candidate(wrapper_id));
        if let Err(source) = self.persist("project_complete", id) {
            return Err(StatusError::ProjectUnsaved {
                project_id: id.to_string(),
                cascade_candidate,
                source,
            });
        }

        info!(
            "event=project_complete module=status status=ok project_id={id} cascade_candidate={}",
            cascade_candidate.as_deref().unwrap_or("none")
        );
        Ok(ProjectCompletion::Completed { cascade_candidate })
    }

    /// Completes one wrapper.
    ///
    /// # Errors
    /// - `WrapperNotFound` when `id` is unknown.
    /// - `AlreadyCompleted` when the wrapper is already completed.
    /// - `WrapperHasNoChildren` when no project references the wrapper.
    /// - `IncompleteChildren` when any child is still in progress.
    /// - `Storage` when the transition cannot be persisted.
    pub fn complete_wrapper(&mut self, id: &str) -> StatusResult<()> {
        let wrapper = self
            .store
            .find_wrapper(id)
            .ok_or_else(|| StatusError::WrapperNotFound(id.to_string()))?;
        if wrapper.is_completed() {
            return Err(StatusError::AlreadyCompleted {
                entity: EntityKind::Wrapper,
                id: id.to_string(),
            });
        }
        match wrapper_readiness(self.store.model(), id) {
            WrapperReadiness::NoChildren => {
                return Err(StatusError::WrapperHasNoChildren(id.to_string()));
            }
            WrapperReadiness::Pending(pending) => {
                return Err(StatusError::IncompleteChildren {
                    wrapper_id: id.to_string(),
                    pending,
                });
            }
            WrapperReadiness::Ready => {}
        }

        self.store.set_wrapper_status(id, Status::Completed);
        self.persist("wrapper_complete", id)
            .map_err(StatusError::Storage)?;
        info!("event=wrapper_complete module=status status=ok wrapper_id={id}");
        Ok(())
    }

    /// Completes one project, then lets `policy` decide on a cascade.
    ///
    /// A declined cascade is an outcome, not an error.
    pub fn complete_project_with_cascade<P>(
        &mut self,
        id: &str,
        policy: &mut P,
    ) -> StatusResult<CompletionOutcome>
    where
        P: ConfirmationPolicy + ?Sized,
    {
        let wrapper_id = match self.complete_project(id)? {
            ProjectCompletion::AlreadyCompleted => return Ok(CompletionOutcome::AlreadyCompleted),
            ProjectCompletion::Completed {
                cascade_candidate: None,
            } => return Ok(CompletionOutcome::ProjectCompleted),
            ProjectCompletion::Completed {
                cascade_candidate: Some(wrapper_id),
            } => wrapper_id,
        };

        let wrapper = self
            .store
            .find_wrapper(&wrapper_id)
            .ok_or_else(|| StatusError::WrapperNotFound(wrapper_id.clone()))?;
        if !policy.confirm(&ConfirmRequest::CascadeComplete { wrapper }) {
            info!("event=cascade_complete module=status status=declined wrapper_id={wrapper_id}");
            return Ok(CompletionOutcome::CascadeDeclined { wrapper_id });
        }

        self.complete_wrapper(&wrapper_id)?;
        Ok(CompletionOutcome::WrapperCompleted { wrapper_id })
    }

    /// Returns whether `wrapper_id` is in progress and every child is completed.
    pub fn is_cascade_candidate(&self, wrapper_id: &str) -> bool {
        let in_progress = self
            .store
            .find_wrapper(wrapper_id)
            .is_some_and(|wrapper| !wrapper.is_completed());
        in_progress && wrapper_readiness(self.store.model(), wrapper_id) == WrapperReadiness::Ready
    }

    fn persist(&self, event: &str, id: &str) -> Result<(), StorageError> {
        self.store
            .storage()
            .save(self.store.model())
            .inspect_err(|err| {
                warn!(
                    "event={event} module=status status=unsaved id={id} error_kind={}",
                    err.kind()
                );
            })
    }
}
