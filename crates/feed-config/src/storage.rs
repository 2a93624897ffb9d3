//! Storage backend selection.
//!
//! Resolved exactly once at startup. Every consumer receives the resulting
//! [`StorageSelection`] instead of probing the environment on its own.

use std::fmt;
use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::StorageConfig;

/// Backend requested in config. `Auto` picks relational storage when the
/// database URL env var is present and non-empty, the flat file otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendChoice {
    #[default]
    Auto,
    Relational,
    FlatFile,
}

/// The backend the process will run against.
#[derive(Clone, PartialEq, Eq)]
pub enum StorageSelection {
    Relational { url: String, max_connections: u32 },
    FlatFile { path: PathBuf },
}

impl StorageSelection {
    pub fn label(&self) -> &'static str {
        match self {
            StorageSelection::Relational { .. } => "relational",
            StorageSelection::FlatFile { .. } => "flat_file",
        }
    }
}

impl fmt::Debug for StorageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // The URL usually carries a password.
            StorageSelection::Relational {
                max_connections, ..
            } => f
                .debug_struct("Relational")
                .field("url", &"<REDACTED>")
                .field("max_connections", max_connections)
                .finish(),
            StorageSelection::FlatFile { path } => {
                f.debug_struct("FlatFile").field("path", path).finish()
            }
        }
    }
}

/// Resolve the storage backend from config plus an environment lookup.
///
/// `env` is injected so tests do not have to mutate process state; binaries
/// pass `|k| std::env::var(k).ok()`.
pub fn resolve_storage<F>(cfg: &StorageConfig, env: F) -> Result<StorageSelection>
where
    F: Fn(&str) -> Option<String>,
{
    let url = env(&cfg.database_url_env).filter(|u| !u.trim().is_empty());

    let selection = match (cfg.backend, url) {
        (BackendChoice::Relational, None) => bail!(
            "storage.backend=relational but env var {} is not set",
            cfg.database_url_env
        ),
        (BackendChoice::Relational | BackendChoice::Auto, Some(url)) => {
            StorageSelection::Relational {
                url,
                max_connections: cfg.max_connections,
            }
        }
        (BackendChoice::FlatFile, _) | (BackendChoice::Auto, None) => {
            if cfg.file_path.trim().is_empty() {
                bail!("storage.file_path must not be empty for flat-file storage");
            }
            StorageSelection::FlatFile {
                path: PathBuf::from(&cfg.file_path),
            }
        }
    };

    info!(backend = selection.label(), "storage backend selected");
    Ok(selection)
}
