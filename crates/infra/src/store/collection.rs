use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::{Document, DocumentStore, StoreError};

/// Typed view of one collection of a [`DocumentStore`].
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    _doc: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _doc: PhantomData,
        }
    }
}

impl<T: Document> Collection<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _doc: PhantomData,
        }
    }

    fn decode(body: JsonValue) -> Result<T, StoreError> {
        Ok(serde_json::from_value(body)?)
    }

    pub async fn insert(&self, doc: &T) -> Result<(), StoreError> {
        let body = serde_json::to_value(doc)?;
        self.store
            .insert(T::COLLECTION, doc.id().into(), body, &doc.unique_keys())
            .await
    }

    /// Persist changes to an existing document.
    pub async fn save(&self, doc: &T) -> Result<(), StoreError> {
        let body = serde_json::to_value(doc)?;
        self.store
            .replace(T::COLLECTION, doc.id().into(), body, &doc.unique_keys())
            .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, StoreError> {
        self.store
            .get(T::COLLECTION, id.into())
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn all(&self) -> Result<Vec<T>, StoreError> {
        self.store
            .list(T::COLLECTION)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    pub async fn delete(&self, id: T::Id) -> Result<bool, StoreError> {
        let id: Uuid = id.into();
        self.store.delete(T::COLLECTION, id).await
    }
}
