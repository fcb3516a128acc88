//! Error taxonomy shared by every layer.
//!
//! Each layer keeps its own error enum; `kind()` maps any of them onto the
//! categories the presentation layer reacts to.

use std::fmt::{Display, Formatter};

/// Coarse error category exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Persisted document is malformed or inconsistent.
    Parse,
    /// Empty or invalid field on create/update.
    Validation,
    /// Operation referenced an unknown id.
    NotFound,
    /// Wrapper still has children, or has none where at least one is required.
    ReferentialIntegrity,
    /// Wrapper completion blocked by unfinished children.
    IncompleteChildren,
    /// Entity is already in the requested terminal state.
    InvalidState,
    /// Backing storage could not be read or written.
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::ReferentialIntegrity => "referential_integrity",
            Self::IncompleteChildren => "incomplete_children",
            Self::InvalidState => "invalid_state",
            Self::Storage => "storage",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
