// Best-score persistence.
// One key per level holding the fewest moves of any finished game, stored as a
// decimal string so the values stay readable in the browser's storage panel.

use std::collections::HashMap;

use tracing::warn;

use super::Level;
use crate::error::StoreError;

/// Durable string key-value store (browser `localStorage` in production).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Per-level minimum move counts on top of a [`KeyValueStore`].
#[derive(Debug, Clone, Default)]
pub struct BestScores<K> {
    store: K,
}

impl<K: KeyValueStore> BestScores<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    /// Stored best for `level`; an unparsable value counts as absent.
    pub fn get(&self, level: Level) -> Option<u32> {
        let key = level.desc().storage_key;
        let raw = self.store.get(key)?;
        match raw.trim().parse::<u32>() {
            Ok(moves) => Some(moves),
            Err(_) => {
                warn!(key, raw = %raw, "ignoring malformed best score");
                None
            }
        }
    }

    /// (easy, hard)
    pub fn both(&self) -> (Option<u32>, Option<u32>) {
        (self.get(Level::Easy), self.get(Level::Hard))
    }

    /// Writes `moves` when nothing is stored yet or it beats the stored value.
    /// Returns whether a write happened.
    pub fn set_if_better(&mut self, level: Level, moves: u32) -> Result<bool, StoreError> {
        if self.get(level).is_some_and(|best| best <= moves) {
            return Ok(false);
        }
        self.store
            .set(level.desc().storage_key, &moves.to_string())?;
        Ok(true)
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut K {
        &mut self.store
    }
}
