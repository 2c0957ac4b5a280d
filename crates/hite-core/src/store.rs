//! Key-value store contract and the in-memory implementation.
//!
//! The engine talks to persistence only through [`KeyValueStore`]. Reads
//! and writes go through [`read_json`], [`read_parsed`] and [`write_soft`],
//! which swallow failures: a broken store never blocks a session.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Keys shared between the engine and the results display.
pub mod keys {
    /// JSON array of answer records.
    pub const ANSWERS: &str = "answers";
    /// JSON object, category to points.
    pub const AGGREGATE: &str = "hiteScores";
    pub const FINAL_SCORE: &str = "finalScore";
    pub const LEVEL: &str = "level";
    pub const KC_TOTAL: &str = "kcTotal";
    pub const KC_CORRECT: &str = "kcCorrectCount";
    pub const KC_ALL_CORRECT: &str = "kcAllCorrect";
    pub const KC_BONUS: &str = "kcCorrectBonus";
    /// Session-completion flag consumed by the results display.
    pub const SESSION_COMPLETE: &str = "showDiscoverPopup";
    pub const COMPLETED_POINTS: &str = "dteCompletedPoints";
    pub const STREAK_POINTS: &str = "dteStreakPoints";
    pub const PLAN_PROGRESS: &str = "planProgress";
    pub const COMPLETED_AT: &str = "completedAt";
    pub const SESSION_ID: &str = "sessionId";
    pub const BASE_SCORE: &str = "hiteBase";
    pub const STREAK_DAYS: &str = "streakDays";
    pub const XP_LEVEL: &str = "xpLevel";
    pub const FEEDBACK_DRAFT: &str = "FEEDBACK_DRAFT";

    /// Every key hite writes; `hite reset` removes them all.
    pub const ALL: [&str; 18] = [
        ANSWERS,
        AGGREGATE,
        FINAL_SCORE,
        LEVEL,
        KC_TOTAL,
        KC_CORRECT,
        KC_ALL_CORRECT,
        KC_BONUS,
        SESSION_COMPLETE,
        COMPLETED_POINTS,
        STREAK_POINTS,
        PLAN_PROGRESS,
        COMPLETED_AT,
        SESSION_ID,
        BASE_SCORE,
        STREAK_DAYS,
        XP_LEVEL,
        FEEDBACK_DRAFT,
    ];
}

/// A string-keyed, string-valued store.
///
/// Implementations use interior mutability so one store can be shared by
/// the engine and the results reader.
pub trait KeyValueStore: Send + Sync {
    /// Human-readable backend name (e.g. "memory").
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Read and decode a JSON value, treating errors and bad shapes as absent.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = read_raw(store, key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("ignoring malformed '{key}' in {} store: {e}", store.name());
            None
        }
    }
}

/// Read and parse a scalar value, treating errors and bad values as absent.
pub fn read_parsed<T: FromStr>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    read_raw(store, key)?.trim().parse().ok()
}

fn read_raw(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("read of '{key}' from {} store failed: {e}", store.name());
            None
        }
    }
}

/// Write a value, logging and discarding any failure.
///
/// Returns whether the write went through.
pub fn write_soft(store: &dyn KeyValueStore, key: &str, value: &str) -> bool {
    match store.set(key, value) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("write of '{key}' to {} store failed: {e}", store.name());
            false
        }
    }
}

/// Remove a key, logging and discarding any failure.
pub fn remove_soft(store: &dyn KeyValueStore, key: &str) -> bool {
    match store.remove(key) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("remove of '{key}' from {} store failed: {e}", store.name());
            false
        }
    }
}

/// Process-local store, used in tests and for throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            writes: AtomicU32::new(0),
        }
    }

    /// Number of successful `set`/`remove` calls.
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Copy of every entry.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))?;
        entries.remove(key);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn name(&self) -> &str {
            "broken"
        }
        fn get(&self, _: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        fn set(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        fn remove(&self, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
    }

    #[test]
    fn memory_store_get_set_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn malformed_json_reads_as_absent() {
        let store = MemoryStore::with_entries([("answers", "{not json"), ("n", "[1,2]")]);
        assert_eq!(read_json::<Vec<u32>>(&store, "answers"), None);
        assert_eq!(read_json::<Vec<u32>>(&store, "n"), Some(vec![1, 2]));
        // Wrong shape is treated the same as garbage.
        assert_eq!(read_json::<String>(&store, "n"), None);
    }

    #[test]
    fn scalar_parsing_is_tolerant() {
        let store = MemoryStore::with_entries([("a", " 42 "), ("b", "NaN"), ("c", "true")]);
        assert_eq!(read_parsed::<u32>(&store, "a"), Some(42));
        assert_eq!(read_parsed::<u32>(&store, "b"), None);
        assert_eq!(read_parsed::<bool>(&store, "c"), Some(true));
        assert_eq!(read_parsed::<u32>(&store, "missing"), None);
    }

    #[test]
    fn failures_are_swallowed() {
        let store = BrokenStore;
        assert!(!write_soft(&store, "k", "v"));
        assert!(!remove_soft(&store, "k"));
        assert_eq!(read_json::<Vec<u32>>(&store, "k"), None);
        assert_eq!(read_parsed::<u32>(&store, "k"), None);
    }

    #[test]
    fn all_keys_are_distinct() {
        let unique: std::collections::HashSet<_> = keys::ALL.iter().collect();
        assert_eq!(unique.len(), keys::ALL.len());
    }
}
