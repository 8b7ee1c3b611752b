use std::{
    cell::RefCell,
    path::{Path, PathBuf},
    rc::Rc,
};

use tempfile::TempDir;

/// A temporary directory that backs file storage in tests.
///
/// The directory and everything in it is removed when the value is dropped.
pub struct TestDir {
    _dir: TempDir,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

type Result<T> = std::result::Result<T, Error>;

impl TestDir {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        Ok(Self { _dir: dir })
    }

    pub fn path(&self) -> &Path {
        self._dir.path()
    }

    /// Path of a nested directory that does not exist yet.
    pub fn child(&self, name: &str) -> PathBuf {
        self._dir.path().join(name)
    }

    pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let file_path = self._dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file_path, content)?;
        Ok(())
    }

    pub fn read_file(&self, path: &str) -> Result<String> {
        let content = std::fs::read_to_string(self._dir.path().join(path))?;
        Ok(content)
    }

    pub fn exists(&self, path: &str) -> bool {
        self._dir.path().join(path).exists()
    }
}

/// Shared, cloneable log of values observed by a test double.
///
/// Clone one handle into the double and keep another in the test to assert on
/// what was recorded.
#[derive(Debug)]
pub struct Recorder<T> {
    calls: Rc<RefCell<Vec<T>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            calls: Rc::clone(&self.calls),
        }
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self {
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<T: Clone> Recorder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, value: T) {
        self.calls.borrow_mut().push(value);
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    pub fn calls(&self) -> Vec<T> {
        self.calls.borrow().clone()
    }

    pub fn last(&self) -> Option<T> {
        self.calls.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}
