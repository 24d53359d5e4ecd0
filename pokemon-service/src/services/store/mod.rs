//! Collection store abstraction and implementations.
//!
//! The store is a key-ordered tree addressed by slash-separated paths, in the
//! shape of a realtime database: a path can be read as a whole, and values
//! can be pushed under a path with a store-assigned, time-ordered key.

pub mod auth;
pub mod firebase;
pub mod memory;

use crate::models::decode_collection;
use crate::services::metrics;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

pub use auth::{FirebaseAuth, ServiceAccountTokenSource};
pub use firebase::FirebaseStore;
pub use memory::InMemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Database returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode database response: {0}")]
    Decode(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Read everything under `path`; `None` when nothing is stored there.
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Append `value` under `path`, returning the key the store assigned.
    async fn push(&self, path: &str, value: &Value) -> Result<String, StoreError>;

    /// Short label used in logs and metrics.
    fn name(&self) -> &'static str;
}

/// The owned pokemon collection, bound to one path in a store.
#[derive(Clone)]
pub struct PokemonCollection {
    store: Arc<dyn CollectionStore>,
    path: String,
}

impl PokemonCollection {
    pub fn new(store: Arc<dyn CollectionStore>, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// All owned names in insertion order. An empty path is an empty list.
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let start = Instant::now();
        let result = self.store.read(&self.path).await;
        self.record("read", start, result.is_ok());

        Ok(decode_collection(result?))
    }

    /// Append one name and return its store key.
    pub async fn add(&self, name: &str) -> Result<String, StoreError> {
        let start = Instant::now();
        let result = self
            .store
            .push(&self.path, &Value::String(name.to_string()))
            .await;
        self.record("push", start, result.is_ok());

        let key = result?;
        tracing::debug!(path = %self.path, key = %key, "Appended entry to collection");
        Ok(key)
    }

    fn record(&self, operation: &str, start: Instant, ok: bool) {
        let collaborator = self.store.name();
        metrics::record_collaborator_call(collaborator, operation, start.elapsed().as_secs_f64());
        if !ok {
            metrics::record_collaborator_error(collaborator, operation);
        }
    }
}
