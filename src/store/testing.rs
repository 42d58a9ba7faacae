//! Scripted stores for tests.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::{Document, DocumentStore, Fields, MemoryDocumentStore, Query, StoreError, StoreResult};

/// Delegates to a memory store but fails every call against one collection.
pub struct FailingStore {
    pub inner: Arc<MemoryDocumentStore>,
    failing: String,
}

impl FailingStore {
    pub fn new(inner: Arc<MemoryDocumentStore>, failing: &str) -> Self {
        Self {
            inner,
            failing: failing.to_string(),
        }
    }

    fn check(&self, collection: &str) -> StoreResult<()> {
        if collection == self.failing {
            return Err(StoreError::Unavailable(format!("{collection} is offline")));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        self.check(collection)?;
        self.inner.query(collection, query).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.check(collection)?;
        self.inner.get(collection, id).await
    }

    async fn insert(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        self.check(collection)?;
        self.inner.insert(collection, fields).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        self.check(collection)?;
        self.inner.set(collection, id, fields).await
    }

    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        self.check(collection)?;
        self.inner.merge(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.check(collection)?;
        self.inner.delete(collection, id).await
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("ping disabled".to_string()))
    }
}

/// Holds every `get` on one collection until a permit is released.
pub struct GatedStore {
    pub inner: Arc<MemoryDocumentStore>,
    gated: String,
    gate: Semaphore,
}

impl GatedStore {
    pub fn new(inner: Arc<MemoryDocumentStore>, gated: &str) -> Self {
        Self {
            inner,
            gated: gated.to_string(),
            gate: Semaphore::new(0),
        }
    }

    pub fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        self.inner.query(collection, query).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        if collection == self.gated {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            permit.forget();
        }
        self.inner.get(collection, id).await
    }

    async fn insert(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        self.inner.insert(collection, fields).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        self.inner.set(collection, id, fields).await
    }

    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        self.inner.merge(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.inner.delete(collection, id).await
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
