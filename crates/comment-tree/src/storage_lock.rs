use fs2::FileExt;
use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

use crate::{Error, Result};

/// A file-based exclusive lock over a storage directory.
///
/// Lock path: `{storage_dir}/.lock`
///
/// Held for the lifetime of a [`crate::FileStorage`] so only one session
/// reads and writes a directory at a time. Acquisition does not wait: a lock
/// held elsewhere fails with [`Error::Locked`].
#[derive(Debug)]
pub struct StorageLock {
    path: PathBuf,
    _lock_file: File,
}

impl StorageLock {
    pub fn new(dir: &Path) -> Result<Self> {
        let path = Self::lock_path(dir);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        if let Err(err) = file.try_lock_exclusive() {
            if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Err(Error::Locked { path });
            }
            return Err(Error::Io(err));
        }

        log::info!("acquired storage lock at {}", path.display());
        Ok(Self {
            _lock_file: file,
            path,
        })
    }

    pub fn lock_path(dir: &Path) -> PathBuf {
        dir.join(".lock")
    }
}

impl Drop for StorageLock {
    fn drop(&mut self) {
        // The lock file stays in place. Only the lock is released.
        log::info!("released storage lock at {}", self.path.display());
    }
}
