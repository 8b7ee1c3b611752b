use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::Result;

/// Key-value persistence backend for the comment forest.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-process storage. Clones share the same entries, so a handle kept
/// outside the store sees every write and can seed a later session.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        storage
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_key() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("comments").unwrap(), None);
    }

    #[test]
    fn test_clones_share_entries() {
        let storage = MemoryStorage::new();
        let mut handle = storage.clone();
        handle.set("comments", "[]").unwrap();
        assert_eq!(storage.get("comments").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_set_overwrites() {
        let mut storage = MemoryStorage::with_entry("comments", "old");
        storage.set("comments", "new").unwrap();
        assert_eq!(storage.get("comments").unwrap().as_deref(), Some("new"));
    }
}
