//! Postgres-backed document store: every collection lives in the `documents` table
//! as JSONB, keyed by `(collection, id)` with a `seq` column preserving insertion order.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::{Document, DocumentStore, Fields, Query, StoreError, StoreResult};
use crate::db::models::DocumentRow;

#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: Arc<PgPool>,
}

impl PgDocumentStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }
}

fn filter_object(query: &Query) -> Value {
    let mut filter = Fields::new();
    for (field, value) in &query.filters {
        filter.insert(field.clone(), value.clone());
    }
    Value::Object(filter)
}

fn into_document(collection: &str, row: DocumentRow) -> StoreResult<Document> {
    match row.data {
        Value::Object(fields) => Ok(Document { id: row.id, fields }),
        _ => Err(StoreError::NotAnObject(collection.to_string())),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        // `data -> NULL` is NULL for every row and `LIMIT NULL` is no limit,
        // so one statement covers the unordered and unlimited cases.
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, data
            FROM documents
            WHERE collection = $1 AND data @> $2
            ORDER BY data -> $3::text ASC NULLS FIRST, seq ASC
            LIMIT $4
            "#,
        )
        .bind(collection)
        .bind(filter_object(query))
        .bind(query.order_by.as_deref())
        .bind(query.limit.map(|l| l as i64))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|row| into_document(collection, row))
            .collect()
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(|row| into_document(collection, row)).transpose()
    }

    async fn insert(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, created_at, updated_at)
            VALUES ($1, $2, $3, now(), now())
            "#,
        )
        .bind(collection)
        .bind(&id)
        .bind(Value::Object(fields))
        .execute(self.pool())
        .await?;

        tracing::debug!(collection = %collection, id = %id, "document inserted");
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, created_at, updated_at)
            VALUES ($1, $2, $3, now(), now())
            ON CONFLICT (collection, id) DO UPDATE SET
                data = EXCLUDED.data,
                updated_at = now()
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Value::Object(fields))
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = data || $3, updated_at = now()
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Value::Object(fields))
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(collection = %collection, id = %id, "delete of missing document");
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").fetch_one(self.pool()).await?;
        Ok(())
    }
}
