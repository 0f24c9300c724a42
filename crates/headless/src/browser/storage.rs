//! Web Storage stand-in (`localStorage` / `sessionStorage`).
//!
//! A `MockStorage` is a cheap handle: clones share the same entries, so a
//! test can hand one clone to the code under test and inspect another.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Which storage area a mock stands in for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageArea {
    /// `window.localStorage`
    Local,
    /// `window.sessionStorage`
    Session,
}

impl StorageArea {
    /// Get the global name of this storage area
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "localStorage",
            Self::Session => "sessionStorage",
        }
    }
}

impl std::fmt::Display for StorageArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// In-memory Web Storage with insertion-ordered keys
#[derive(Debug, Clone)]
pub struct MockStorage {
    area: StorageArea,
    entries: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockStorage {
    /// Create an empty storage area
    #[must_use]
    pub fn new(area: StorageArea) -> Self {
        Self {
            area,
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a `localStorage` stand-in
    #[must_use]
    pub fn local() -> Self {
        Self::new(StorageArea::Local)
    }

    /// Create a `sessionStorage` stand-in
    #[must_use]
    pub fn session() -> Self {
        Self::new(StorageArea::Session)
    }

    /// Storage area this mock represents
    #[must_use]
    pub const fn area(&self) -> StorageArea {
        self.area
    }

    fn entries(&self) -> MutexGuard<'_, Vec<(String, String)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `getItem(key)`
    #[must_use]
    pub fn get_item(&self, key: &str) -> Option<String> {
        self.entries()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// `setItem(key, value)`; overwriting keeps the key's original position
    pub fn set_item(&self, key: &str, value: impl Into<String>) {
        let value = value.into();
        let mut entries = self.entries();
        if let Some(slot) = entries.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            entries.push((key.to_string(), value));
        }
        tracing::trace!(target: "jugar_headless::storage", area = %self.area, key, "setItem");
    }

    /// `removeItem(key)`; returns the removed value
    pub fn remove_item(&self, key: &str) -> Option<String> {
        let mut entries = self.entries();
        let index = entries.iter().position(|(k, _)| k == key)?;
        Some(entries.remove(index).1)
    }

    /// `clear()`
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// `key(index)`
    #[must_use]
    pub fn key(&self, index: usize) -> Option<String> {
        self.entries().get(index).map(|(k, _)| k.clone())
    }

    /// `length`
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether no items are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Copy of all entries in key order
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.entries().clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let storage = MockStorage::local();
        assert_eq!(storage.get_item("theme"), None);
        storage.set_item("theme", "dark");
        assert_eq!(storage.get_item("theme").as_deref(), Some("dark"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let storage = MockStorage::local();
        storage.set_item("a", "1");
        storage.set_item("b", "2");
        storage.set_item("a", "3");
        assert_eq!(storage.key(0).as_deref(), Some("a"));
        assert_eq!(storage.key(1).as_deref(), Some("b"));
        assert_eq!(storage.key(2), None);
        assert_eq!(storage.get_item("a").as_deref(), Some("3"));
    }

    #[test]
    fn test_remove_and_clear() {
        let storage = MockStorage::session();
        storage.set_item("a", "1");
        storage.set_item("b", "2");
        assert_eq!(storage.remove_item("a").as_deref(), Some("1"));
        assert_eq!(storage.remove_item("a"), None);
        assert_eq!(storage.len(), 1);
        storage.clear();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let storage = MockStorage::local();
        let handle = storage.clone();
        handle.set_item("token", "abc");
        assert_eq!(storage.get_item("token").as_deref(), Some("abc"));
    }

    #[test]
    fn test_areas_are_separate() {
        let local = MockStorage::local();
        let session = MockStorage::session();
        local.set_item("k", "v");
        assert!(session.is_empty());
        assert_eq!(local.area().to_string(), "localStorage");
        assert_eq!(session.area().as_str(), "sessionStorage");
    }
}
