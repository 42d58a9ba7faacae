//! In-process document store, used when no database is configured.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{compare_values, Document, DocumentStore, Fields, Query, StoreError, StoreResult};

/// Collections are kept in insertion order so ties in `order_by` stay stable.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| query.matches(&doc.fields))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(field) = &query.order_by {
            // sort_by is stable, so equal keys keep insertion order
            docs.sort_by(|a, b| compare_values(a.fields.get(field), b.fields.get(field)));
        }

        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }

        Ok(docs)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn insert(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields,
            });
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|doc| doc.id == id) {
            Some(doc) => doc.fields = fields,
            None => docs.push(Document {
                id: id.to_string(),
                fields,
            }),
        }
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        for (key, value) in fields {
            doc.fields.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.retain(|doc| doc.id != id);
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_order_by_is_stable_for_equal_keys() {
        let store = MemoryDocumentStore::new();
        let a = store
            .insert("skills", fields(json!({ "name": "a", "order": 2 })))
            .await
            .unwrap();
        let b = store
            .insert("skills", fields(json!({ "name": "b", "order": 1 })))
            .await
            .unwrap();
        let c = store
            .insert("skills", fields(json!({ "name": "c", "order": 2 })))
            .await
            .unwrap();

        let docs = store
            .query("skills", &Query::new().order_by("order"))
            .await
            .unwrap();
        let ids: Vec<_> = docs.into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![b, a, c]);
    }

    #[tokio::test]
    async fn test_query_unknown_collection_is_empty() {
        let store = MemoryDocumentStore::new();
        let docs = store.query("hero", &Query::new()).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_merge_is_shallow_and_keeps_other_fields() {
        let store = MemoryDocumentStore::new();
        let id = store
            .insert("about", fields(json!({ "content": "old", "published": true })))
            .await
            .unwrap();

        store
            .merge("about", &id, fields(json!({ "content": "new" })))
            .await
            .unwrap();

        let doc = store.get("about", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["content"], json!("new"));
        assert_eq!(doc.fields["published"], json!(true));
    }

    #[tokio::test]
    async fn test_merge_missing_document_is_not_found() {
        let store = MemoryDocumentStore::new();
        let err = store
            .merge("about", "nope", fields(json!({ "content": "x" })))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryDocumentStore::new();
        let id = store.insert("footer", Fields::new()).await.unwrap();
        store.delete("footer", &id).await.unwrap();
        store.delete("footer", &id).await.unwrap();
        store.delete("footer", "never-existed").await.unwrap();
        assert_eq!(store.len("footer").await, 0);
    }

    #[tokio::test]
    async fn test_set_replaces_existing_document() {
        let store = MemoryDocumentStore::new();
        store
            .set("users", "uid-1", fields(json!({ "role": "read", "email": "a@b.c" })))
            .await
            .unwrap();
        store
            .set("users", "uid-1", fields(json!({ "role": "write" })))
            .await
            .unwrap();

        let doc = store.get("users", "uid-1").await.unwrap().unwrap();
        assert_eq!(doc.fields.len(), 1);
        assert_eq!(doc.fields["role"], json!("write"));
        assert_eq!(store.len("users").await, 1);
    }

    #[tokio::test]
    async fn test_limit_truncates_after_ordering() {
        let store = MemoryDocumentStore::new();
        for order in [3, 1, 2] {
            store
                .insert("projects", fields(json!({ "slug": "p", "order": order })))
                .await
                .unwrap();
        }

        let docs = store
            .query(
                "projects",
                &Query::new().where_eq("slug", "p").order_by("order").limit(1),
            )
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields["order"], json!(1));
    }
}
