//! JSON-file backed store.
//!
//! The whole store is one flat JSON object of string values. Every write
//! reads the file, applies the change, and atomically replaces it, so the
//! last writer wins.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use hite_core::error::StoreError;
use hite_core::store::KeyValueStore;

type Entries = BTreeMap<String, String>;

/// A durable store kept in a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry. A missing file is an empty store; a malformed
    /// file is logged and treated as empty.
    pub fn entries(&self) -> Result<Entries, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }
        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(
                    "store file {} is malformed, treating as empty: {e}",
                    self.path.display()
                );
                Ok(Entries::new())
            }
        }
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(entries)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn modify(&self, apply: impl FnOnce(&mut Entries)) -> Result<(), StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Unavailable("file store lock poisoned".into()))?;
        let mut entries = self.entries()?;
        apply(&mut entries);
        self.write_entries(&entries)
    }
}

impl KeyValueStore for JsonFileStore {
    fn name(&self) -> &str {
        "file"
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.modify(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hite_core::store::{read_json, write_soft};

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("store.json"));
        assert_eq!(store.get("answers").unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn set_get_remove_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = JsonFileStore::open(&path);
        store.set("finalScore", "500").unwrap();
        store.set("level", "Pro").unwrap();
        store.remove("level").unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get("finalScore").unwrap().as_deref(), Some("500"));
        assert_eq!(reopened.get("level").unwrap(), None);
    }

    #[test]
    fn malformed_file_is_treated_as_empty_and_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "[1, 2, oops").unwrap();

        let store = JsonFileStore::open(&path);
        assert_eq!(store.get("answers").unwrap(), None);
        assert!(write_soft(&store, "answers", "[]"));
        assert_eq!(read_json::<Vec<u32>>(&store, "answers"), Some(vec![]));
    }

    #[test]
    fn values_are_stored_as_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = JsonFileStore::open(&path);
        store.set("hiteScores", r#"{"composure":1}"#).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["hiteScores"], r#"{"composure":1}"#);
    }
}
