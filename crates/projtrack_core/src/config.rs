//! Runtime configuration resolution.
//!
//! # Responsibility
//! - Resolve the projects document path and logging settings from explicit
//!   input, environment variables and defaults.
//!
//! # Invariants
//! - Blank environment values are treated as unset.
//! - Resolution never touches the file system.

use crate::logging::default_log_level;
use std::path::{Path, PathBuf};

/// Env var holding the full document path.
pub const DATA_PATH_ENV: &str = "PROJTRACK_DATA_PATH";
/// Env var holding a resource root; the document lives at `data/projects.json` below it.
pub const RESOURCE_PATH_ENV: &str = "PROJTRACK_RESOURCE_PATH";
pub const LOG_LEVEL_ENV: &str = "PROJTRACK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "PROJTRACK_LOG_DIR";

const DATA_DIR_NAME: &str = "data";
const DATA_FILE_NAME: &str = "projects.json";

/// Resolved core settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub data_path: PathBuf,
    pub log_level: String,
    /// File logging is enabled only when a directory is configured.
    pub log_dir: Option<PathBuf>,
}

impl CoreConfig {
    /// Resolves settings from the process environment.
    ///
    /// `explicit_data_path` wins over every environment variable.
    pub fn from_env(explicit_data_path: Option<&Path>) -> Self {
        Self::resolve(explicit_data_path, |key| std::env::var(key).ok())
    }

    /// Resolves settings with an injectable variable lookup.
    pub fn resolve(
        explicit_data_path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let var = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_path = match explicit_data_path {
            Some(path) => path.to_path_buf(),
            None => var(DATA_PATH_ENV)
                .map(PathBuf::from)
                .or_else(|| {
                    var(RESOURCE_PATH_ENV).map(|root| {
                        PathBuf::from(root)
                            .join(DATA_DIR_NAME)
                            .join(DATA_FILE_NAME)
                    })
                })
                .unwrap_or_else(|| PathBuf::from(DATA_DIR_NAME).join(DATA_FILE_NAME)),
        };

        Self {
            data_path,
            log_level: var(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: var(LOG_DIR_ENV).map(PathBuf::from),
        }
    }
}
