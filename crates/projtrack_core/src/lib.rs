//! Core domain logic for projtrack.
//! This crate is the single source of truth for wrapper/project invariants.

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;
pub mod tree;

pub use config::CoreConfig;
pub use error::ErrorKind;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::document::{parse_document, render_document, Model, ParseError};
pub use model::entity::{
    EntityKind, EntityValidationError, Project, ProjectDraft, ProjectId, ProjectPatch, Status,
    Wrapper, WrapperId,
};
pub use repo::entity_store::{EntityStore, StoreError, StoreResult};
pub use service::confirm::{AlwaysConfirm, ConfirmRequest, ConfirmationPolicy, NeverConfirm};
pub use service::projects_service::{
    DeleteOutcome, ProjectsService, ServiceError, ServiceResult,
};
pub use service::status_controller::{
    wrapper_readiness, CompletionOutcome, ProjectCompletion, StatusController, StatusError,
    StatusResult, WrapperReadiness,
};
pub use storage::{InMemoryStorage, JsonFileStorage, ModelStorage, StorageError, StorageResult};
pub use tree::builder::{build_tree, NodeType, StatusTree, TreeNode};
pub use tree::selection::{select_node, wrapper_choices, ChildRow, SelectionView};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
