use std::path::{Path, PathBuf};

use crate::storage::KeyValueStore;
use crate::storage_lock::StorageLock;
use crate::{Error, Result};

/// Directory-backed storage: each key is a `{key}.json` file.
///
/// Writes go to a temporary file that is renamed over the old one, so a crash
/// mid-write leaves the previous value readable. The directory is locked for
/// as long as the value lives.
pub struct FileStorage {
    dir: PathBuf,
    _guard: StorageLock,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory and lock it.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let guard = StorageLock::new(&dir)?;
        log::info!("opened file storage at {}", dir.display());
        Ok(Self { dir, _guard: guard })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn key_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Io(err)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let tmp_path = self.dir.join(format!("{}.json.tmp", key));
        std::fs::write(&tmp_path, value)?;
        std::fs::rename(&tmp_path, &path)?;
        log::debug!("wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// Keys become file names, so only `[A-Za-z0-9_-]` is allowed.
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(Error::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}
