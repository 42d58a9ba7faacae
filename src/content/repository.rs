//! Generic content repository: one instance per content kind.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{ContentKind, Entry};
use crate::store::{Document, DocumentStore, Fields, Query, StoreError, StoreResult};

/// Keys owned by the repository; never accepted from callers.
const RESERVED_KEYS: &[&str] = &["id", "createdAt", "updatedAt"];

pub struct ContentRepository<K> {
    store: Arc<dyn DocumentStore>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for ContentRepository<K> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: ContentKind> ContentRepository<K> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _kind: PhantomData,
        }
    }

    fn collection(&self) -> &'static str {
        K::COLLECTION.name()
    }

    fn decode(&self, doc: Document) -> StoreResult<Entry<K>> {
        let Document { id, mut fields } = doc;
        fields.insert("id".to_string(), Value::String(id.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|source| StoreError::Decode {
            collection: self.collection().to_string(),
            id,
            source,
        })
    }

    fn decode_all(&self, docs: Vec<Document>) -> StoreResult<Vec<Entry<K>>> {
        docs.into_iter().map(|doc| self.decode(doc)).collect()
    }

    fn encode<P: Serialize + ?Sized>(&self, data: &P) -> StoreResult<Fields> {
        let value = serde_json::to_value(data).map_err(|source| StoreError::Encode {
            collection: self.collection().to_string(),
            source,
        })?;
        match value {
            Value::Object(mut fields) => {
                for key in RESERVED_KEYS {
                    fields.remove(*key);
                }
                Ok(fields)
            }
            _ => Err(StoreError::NotAnObject(self.collection().to_string())),
        }
    }

    /// Every document, ascending by the kind's order field. No published filter.
    pub async fn list_all(&self) -> StoreResult<Vec<Entry<K>>> {
        let query = Query::new().order_by(K::ORDER_FIELD);
        let docs = self.store.query(self.collection(), &query).await?;
        self.decode_all(docs)
    }

    /// Only `published == true`, in the same order as [`Self::list_all`].
    pub async fn list_published(&self) -> StoreResult<Vec<Entry<K>>> {
        let query = Query::new()
            .where_eq("published", true)
            .order_by(K::ORDER_FIELD);
        let docs = self.store.query(self.collection(), &query).await?;
        self.decode_all(docs)
    }

    /// First document in the collection's default enumeration order.
    /// Which one is returned is unspecified if there are several.
    pub async fn singleton(&self) -> StoreResult<Option<Entry<K>>> {
        let docs = self
            .store
            .query(self.collection(), &Query::new().limit(1))
            .await?;
        docs.into_iter().next().map(|doc| self.decode(doc)).transpose()
    }

    /// First document whose `slug` equals `slug`.
    pub async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Entry<K>>> {
        self.first_matching(Query::new().where_eq("slug", slug)).await
    }

    /// First published document whose `slug` equals `slug`.
    pub async fn find_published_by_slug(&self, slug: &str) -> StoreResult<Option<Entry<K>>> {
        self.first_matching(
            Query::new()
                .where_eq("slug", slug)
                .where_eq("published", true),
        )
        .await
    }

    async fn first_matching(&self, query: Query) -> StoreResult<Option<Entry<K>>> {
        let docs = self
            .store
            .query(self.collection(), &query.limit(1))
            .await?;
        docs.into_iter().next().map(|doc| self.decode(doc)).transpose()
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Entry<K>>> {
        self.store
            .get(self.collection(), id)
            .await?
            .map(|doc| self.decode(doc))
            .transpose()
    }

    pub async fn count(&self) -> StoreResult<usize> {
        let docs = self.store.query(self.collection(), &Query::new()).await?;
        Ok(docs.len())
    }

    /// Stores `data` as a new document stamped with `createdAt` / `updatedAt`.
    pub async fn create(&self, data: &K) -> StoreResult<String> {
        let mut fields = self.encode(data)?;
        let now = serde_json::to_value(Utc::now()).unwrap_or(Value::Null);
        fields.insert("createdAt".to_string(), now.clone());
        fields.insert("updatedAt".to_string(), now);

        let id = self.store.insert(self.collection(), fields).await?;
        tracing::info!(collection = %self.collection(), id = %id, "content created");
        Ok(id)
    }

    /// Merges `patch` onto document `id` and refreshes `updatedAt`.
    /// `patch` may be a whole `K` or any partial object of its fields.
    pub async fn update<P: Serialize + ?Sized>(&self, id: &str, patch: &P) -> StoreResult<()> {
        let mut fields = self.encode(patch)?;
        let now = serde_json::to_value(Utc::now()).unwrap_or(Value::Null);
        fields.insert("updatedAt".to_string(), now);

        self.store.merge(self.collection(), id, fields).await?;
        tracing::info!(collection = %self.collection(), id = %id, "content updated");
        Ok(())
    }

    /// Overwrites document `id` with `data`, keeping `created_at` and refreshing `updatedAt`.
    /// Fields absent from `data` are dropped from the stored document.
    pub async fn replace(
        &self,
        id: &str,
        data: &K,
        created_at: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let mut fields = self.encode(data)?;
        let now = Utc::now();
        let created = serde_json::to_value(created_at.unwrap_or(now)).unwrap_or(Value::Null);
        fields.insert("createdAt".to_string(), created);
        fields.insert(
            "updatedAt".to_string(),
            serde_json::to_value(now).unwrap_or(Value::Null),
        );

        self.store.set(self.collection(), id, fields).await?;
        tracing::info!(collection = %self.collection(), id = %id, "content replaced");
        Ok(())
    }

    pub async fn remove(&self, id: &str) -> StoreResult<()> {
        self.store.delete(self.collection(), id).await?;
        tracing::info!(collection = %self.collection(), id = %id, "content removed");
        Ok(())
    }
}
