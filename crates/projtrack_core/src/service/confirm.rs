//! Confirmation seam for destructive and cascading operations.
//!
//! Core code never prompts. Callers inject a [`ConfirmationPolicy`]; closures
//! of shape `FnMut(&ConfirmRequest<'_>) -> bool` qualify.

use crate::model::entity::{Project, Wrapper};

/// Decision the caller is asked to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmRequest<'a> {
    DeleteProject { project: &'a Project },
    DeleteWrapper { wrapper: &'a Wrapper },
    /// Every child of `wrapper` is completed; complete the wrapper too?
    CascadeComplete { wrapper: &'a Wrapper },
}

impl ConfirmRequest<'_> {
    /// Short event name used in log lines.
    pub fn action(&self) -> &'static str {
        match self {
            Self::DeleteProject { .. } => "delete_project",
            Self::DeleteWrapper { .. } => "delete_wrapper",
            Self::CascadeComplete { .. } => "cascade_complete",
        }
    }
}

/// Caller-supplied yes/no predicate.
pub trait ConfirmationPolicy {
    fn confirm(&mut self, request: &ConfirmRequest<'_>) -> bool;
}

impl<F> ConfirmationPolicy for F
where
    F: FnMut(&ConfirmRequest<'_>) -> bool,
{
    fn confirm(&mut self, request: &ConfirmRequest<'_>) -> bool {
        self(request)
    }
}

/// Accepts every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl ConfirmationPolicy for AlwaysConfirm {
    fn confirm(&mut self, _request: &ConfirmRequest<'_>) -> bool {
        true
    }
}

/// Declines every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl ConfirmationPolicy for NeverConfirm {
    fn confirm(&mut self, _request: &ConfirmRequest<'_>) -> bool {
        false
    }
}
