//! In-process collection store.
//!
//! Used for local runs without a database (`STORE_BACKEND=memory`) and as the
//! substitute collaborator in tests, where its call counters and failure
//! injection stand in for a misbehaving database.

use super::{CollectionStore, StoreError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryStore {
    data: Mutex<HashMap<String, Value>>,
    next_key: AtomicU64,
    failure: Mutex<Option<String>>,
    reads: AtomicUsize,
    pushes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with `names` already pushed under `path`.
    pub fn with_entries<I, S>(path: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for name in names {
            store.insert(path, Value::String(name.into()));
        }
        store
    }

    /// Replace the raw value at `path`.
    pub fn set_raw(&self, path: &str, value: Value) {
        self.lock_data().insert(path.to_string(), value);
    }

    /// Make every subsequent call fail with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.lock_failure() = Some(message.to_string());
    }

    pub fn recover(&self) {
        *self.lock_failure() = None;
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    // Zero-padded hex keeps lexical order equal to push order.
    fn insert(&self, path: &str, value: Value) -> String {
        let key = format!("-{:016x}", self.next_key.fetch_add(1, Ordering::SeqCst));
        let mut data = self.lock_data();

        let slot = data
            .entry(path.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        if !slot.is_object() {
            *slot = Value::Object(as_object(slot.take()));
        }
        if let Value::Object(entries) = slot {
            entries.insert(key.clone(), value);
        }

        key
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match self.lock_failure().as_ref() {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }

    fn lock_data(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_failure(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Pushing under a non-object value turns it into an object, as the
/// realtime database does with arrays.
fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Map::new(),
    }
}

#[async_trait]
impl CollectionStore for InMemoryStore {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        Ok(self
            .lock_data()
            .get(path)
            .filter(|v| !v.is_null())
            .cloned())
    }

    async fn push(&self, path: &str, value: &Value) -> Result<String, StoreError> {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        Ok(self.insert(path, value.clone()))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
