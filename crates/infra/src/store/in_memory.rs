use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::{DocumentStore, StoreError, UniqueKey};

type KeySlot = (String, &'static str, String);

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<String, BTreeMap<Uuid, JsonValue>>,
    keys: HashMap<KeySlot, Uuid>,
}

impl Inner {
    fn check_keys(&self, collection: &str, id: Uuid, keys: &[UniqueKey]) -> Result<(), StoreError> {
        for key in keys {
            let slot = (collection.to_string(), key.field, key.value.clone());
            if let Some(owner) = self.keys.get(&slot) {
                if *owner != id {
                    return Err(StoreError::Duplicate {
                        field: key.field.to_string(),
                        value: key.value.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn release_keys(&mut self, collection: &str, id: Uuid) {
        self.keys.retain(|(c, _, _), owner| !(c == collection && *owner == id));
    }

    fn claim_keys(&mut self, collection: &str, id: Uuid, keys: &[UniqueKey]) {
        for key in keys {
            self.keys.insert((collection.to_string(), key.field, key.value.clone()), id);
        }
    }
}

/// In-memory document store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<Inner>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, collection: &str, id: Uuid, body: JsonValue, keys: &[UniqueKey]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.check_keys(collection, id, keys)?;
        inner.claim_keys(collection, id, keys);
        inner
            .documents
            .entry(collection.to_string())
            .or_default()
            .insert(id, body);
        Ok(())
    }

    async fn replace(&self, collection: &str, id: Uuid, body: JsonValue, keys: &[UniqueKey]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let exists = inner
            .documents
            .get(collection)
            .is_some_and(|docs| docs.contains_key(&id));
        if !exists {
            return Err(StoreError::NotFound);
        }

        inner.check_keys(collection, id, keys)?;
        inner.release_keys(collection, id);
        inner.claim_keys(collection, id, keys);
        inner
            .documents
            .entry(collection.to_string())
            .or_default()
            .insert(id, body);
        Ok(())
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<JsonValue>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.documents.get(collection).and_then(|docs| docs.get(&id)).cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<JsonValue>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .documents
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let removed = inner
            .documents
            .get_mut(collection)
            .and_then(|docs| docs.remove(&id))
            .is_some();
        if removed {
            inner.release_keys(collection, id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn email(value: &str) -> Vec<UniqueKey> {
        vec![UniqueKey::new("email", value)]
    }

    #[tokio::test]
    async fn insert_get_list_delete() {
        let store = InMemoryDocumentStore::new();
        let id = Uuid::now_v7();
        store.insert("users", id, json!({"name": "Ann"}), &[]).await.unwrap();

        assert_eq!(store.get("users", id).await.unwrap(), Some(json!({"name": "Ann"})));
        assert_eq!(store.list("users").await.unwrap().len(), 1);
        assert!(store.list("tours").await.unwrap().is_empty());

        assert!(store.delete("users", id).await.unwrap());
        assert!(!store.delete("users", id).await.unwrap());
        assert_eq!(store.get("users", id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unique_keys_are_enforced_per_collection() {
        let store = InMemoryDocumentStore::new();
        store.insert("users", Uuid::now_v7(), json!({}), &email("a@b.io")).await.unwrap();

        let err = store
            .insert("users", Uuid::now_v7(), json!({}), &email("a@b.io"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { ref field, ref value } if field == "email" && value == "a@b.io"));

        // Same value in another collection is fine.
        store.insert("guides", Uuid::now_v7(), json!({}), &email("a@b.io")).await.unwrap();
    }

    #[tokio::test]
    async fn replace_moves_keys_and_frees_the_old_value() {
        let store = InMemoryDocumentStore::new();
        let id = Uuid::now_v7();
        store.insert("users", id, json!({"v": 1}), &email("old@b.io")).await.unwrap();
        store.replace("users", id, json!({"v": 2}), &email("new@b.io")).await.unwrap();

        // Old value is free again, new one is taken.
        store.insert("users", Uuid::now_v7(), json!({}), &email("old@b.io")).await.unwrap();
        assert!(
            store
                .insert("users", Uuid::now_v7(), json!({}), &email("new@b.io"))
                .await
                .is_err()
        );
        assert_eq!(store.get("users", id).await.unwrap(), Some(json!({"v": 2})));
    }

    #[tokio::test]
    async fn replace_of_missing_document_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let err = store.replace("users", Uuid::now_v7(), json!({}), &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn deleting_releases_unique_keys() {
        let store = InMemoryDocumentStore::new();
        let id = Uuid::now_v7();
        store.insert("users", id, json!({}), &email("a@b.io")).await.unwrap();
        store.delete("users", id).await.unwrap();
        store.insert("users", Uuid::now_v7(), json!({}), &email("a@b.io")).await.unwrap();
    }
}
