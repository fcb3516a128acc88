//! Persistence backends for the projects model.
//!
//! # Responsibility
//! - Define the load/save contract the entity store depends on.
//! - Keep file-system details out of store and service code.
//!
//! # Invariants
//! - `load` returns only models that passed document validation.
//! - A failed `save` never leaves a truncated document behind.

use crate::error::ErrorKind;
use crate::model::document::{Model, ParseError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod json_file;
mod memory;

pub use json_file::JsonFileStorage;
pub use memory::InMemoryStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-level failure.
#[derive(Debug)]
pub enum StorageError {
    /// Reading, writing or renaming the backing file failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Backing document exists but does not parse into a valid model.
    Parse(ParseError),
    /// Model could not be serialized.
    Encode(serde_json::Error),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(_) => ErrorKind::Parse,
            Self::Io { .. } | Self::Encode(_) => ErrorKind::Storage,
        }
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "storage I/O failed for `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode projects document: {err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<ParseError> for StorageError {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

/// Load/save contract for one projects document.
pub trait ModelStorage {
    /// Reads and validates the full model.
    fn load(&self) -> StorageResult<Model>;
    /// Replaces the persisted document with `model`.
    fn save(&self, model: &Model) -> StorageResult<()>;
}

impl<T: ModelStorage + ?Sized> ModelStorage for &T {
    fn load(&self) -> StorageResult<Model> {
        (**self).load()
    }

    fn save(&self, model: &Model) -> StorageResult<()> {
        (**self).save(model)
    }
}
