//! JSON file backend.
//!
//! # Responsibility
//! - Read and validate the projects document from one file path.
//! - Replace the document atomically: write a sibling temp file, then rename.
//!
//! # Invariants
//! - A crash mid-save leaves either the old or the new document, never a partial one.
//! - Log lines carry paths and durations only, never entity content.

use super::{ModelStorage, StorageError, StorageResult};
use crate::model::document::{parse_document, render_document, Model};
use log::{error, info};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// File-backed projects document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document, or an empty model when the file does not exist yet.
    ///
    /// Other read failures and parse failures are still returned.
    pub fn load_or_default(&self) -> StorageResult<Model> {
        if !self.path.exists() {
            info!(
                "event=store_load module=storage status=missing path={}",
                self.path.display()
            );
            return Ok(Model::default());
        }
        self.load()
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn write_atomically(&self, contents: &str) -> StorageResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|err| self.io_error(err))?;

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|err| self.io_error(err))?;
        temp.write_all(contents.as_bytes())
            .map_err(|err| self.io_error(err))?;
        temp.as_file()
            .sync_all()
            .map_err(|err| self.io_error(err))?;
        temp.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }
}

impl ModelStorage for JsonFileStorage {
    fn load(&self) -> StorageResult<Model> {
        let started_at = Instant::now();
        let result = std::fs::read_to_string(&self.path)
            .map_err(|err| self.io_error(err))
            .and_then(|text| parse_document(&text).map_err(StorageError::from));

        match &result {
            Ok(model) => info!(
                "event=store_load module=storage status=ok path={} wrappers={} projects={} duration_ms={}",
                self.path.display(),
                model.wrappers.len(),
                model.projects.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=store_load module=storage status=error path={} duration_ms={} error_kind={} error={}",
                self.path.display(),
                started_at.elapsed().as_millis(),
                err.kind(),
                err
            ),
        }
        result
    }

    fn save(&self, model: &Model) -> StorageResult<()> {
        let started_at = Instant::now();
        let result = render_document(model)
            .map_err(StorageError::Encode)
            .and_then(|contents| self.write_atomically(&contents));

        match &result {
            Ok(()) => info!(
                "event=store_save module=storage status=ok path={} duration_ms={}",
                self.path.display(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=store_save module=storage status=error path={} duration_ms={} error={}",
                self.path.display(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::JsonFileStorage;
    use crate::storage::{ModelStorage, StorageError};

    #[test]
    fn load_or_default_returns_empty_model_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("absent.json"));

        let model = storage.load_or_default().unwrap();
        assert!(model.is_empty());

        let err = storage.load().unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }

    #[test]
    fn save_creates_parent_directories_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("projects.json");
        let storage = JsonFileStorage::new(&nested);

        storage.save(&Default::default()).unwrap();

        assert!(nested.exists());
        let entries = std::fs::read_dir(nested.parent().unwrap())
            .unwrap()
            .count();
        assert_eq!(entries, 1);
    }
}
