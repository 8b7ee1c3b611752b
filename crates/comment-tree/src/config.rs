use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

pub const DEFAULT_STORAGE_KEY: &str = "comments";

/// Settings for building a [`crate::CommentTreeStore`].
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Load the forest on startup and write it back after every mutation.
    pub persist_comments: bool,
    /// Key the forest is stored under.
    pub storage_key: String,
    /// Directory for file storage. Falls back to [`default_storage_dir`].
    pub storage_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            persist_comments: false,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: None,
        }
    }
}

impl StoreConfig {
    /// Persistent config with the default key and directory.
    pub fn persistent() -> Self {
        Self {
            persist_comments: true,
            ..Self::default()
        }
    }

    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        log::debug!("loaded store config from {}", path.display());
        Ok(config)
    }

    pub fn resolved_storage_dir(&self) -> Result<PathBuf> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_storage_dir(),
        }
    }
}

pub fn default_storage_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("comment-tree"))
        .ok_or_else(|| Error::Config {
            message: "Could not find data directory".to_string(),
        })
}
