//! In-memory backend for embedding callers and tests.

use super::{ModelStorage, StorageError, StorageResult};
use crate::model::document::{parse_document, render_document, Model};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;

const MEMORY_PATH: &str = "<memory>";

/// Keeps the rendered document in memory.
///
/// Saved models still go through the JSON codec, so load/save behave like the
/// file backend. `set_read_only(true)` makes every save fail with a
/// permission error.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    document: RefCell<Option<String>>,
    read_only: Cell<bool>,
    saves: Cell<usize>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend seeded with raw document text.
    pub fn with_document(text: impl Into<String>) -> Self {
        Self {
            document: RefCell::new(Some(text.into())),
            ..Self::default()
        }
    }

    /// Returns the last saved (or seeded) document text.
    pub fn document(&self) -> Option<String> {
        self.document.borrow().clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }
}

impl ModelStorage for InMemoryStorage {
    fn load(&self) -> StorageResult<Model> {
        match self.document.borrow().as_deref() {
            Some(text) => parse_document(text).map_err(StorageError::from),
            None => Ok(Model::default()),
        }
    }

    fn save(&self, model: &Model) -> StorageResult<()> {
        if self.read_only.get() {
            return Err(StorageError::Io {
                path: PathBuf::from(MEMORY_PATH),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "storage is read-only",
                ),
            });
        }
        let text = render_document(model).map_err(StorageError::Encode)?;
        *self.document.borrow_mut() = Some(text);
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
