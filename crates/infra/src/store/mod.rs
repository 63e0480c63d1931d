//! JSON document store boundary.
//!
//! Documents live in named collections as JSON bodies keyed by UUID. Stores
//! also own the unique-field bookkeeping, so a duplicate is rejected at the
//! same point the write happens.

pub mod collection;
pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use natours_core::Entity;

pub use collection::Collection;
pub use in_memory::InMemoryDocumentStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresDocumentStore;

/// A value that must not repeat within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueKey {
    pub field: &'static str,
    pub value: String,
}

impl UniqueKey {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// A typed document that can be persisted in a collection.
pub trait Document: Entity + Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for {field}: {value}")]
    Duplicate { field: String, value: String },

    #[error("document not found")]
    NotFound,

    #[error("document (de)serialization failed: {0}")]
    Serialization(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Collection-scoped JSON document storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document; fails with `Duplicate` when a unique key is taken.
    async fn insert(&self, collection: &str, id: Uuid, body: JsonValue, keys: &[UniqueKey]) -> Result<(), StoreError>;

    /// Replace an existing document and its unique keys; `NotFound` when absent.
    async fn replace(&self, collection: &str, id: Uuid, body: JsonValue, keys: &[UniqueKey]) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<JsonValue>, StoreError>;

    /// Every document of the collection, ordered by id.
    async fn list(&self, collection: &str) -> Result<Vec<JsonValue>, StoreError>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError>;
}
