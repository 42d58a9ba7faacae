//! Document Store
//! Generic per-collection document access with equality filters and ordering.
//!
//! Two backends implement [`DocumentStore`]: [`postgres::PgDocumentStore`] keeps every
//! collection in one JSONB table, [`memory::MemoryDocumentStore`] keeps them in process
//! and backs no-database mode and tests.

pub mod memory;
pub mod postgres;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// Raw document fields as stored.
pub type Fields = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("failed to decode document {collection}/{id}: {source}")]
    Decode {
        collection: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode document for {collection}: {source}")]
    Encode {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("document data for {0} must be a JSON object")]
    NotAnObject(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A stored document: store-assigned id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Equality filters, an optional ascending order field and an optional limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<String>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when every filter field is present and equal.
    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| fields.get(field) == Some(expected))
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents of `collection` matching `query`. Ordering is ascending on the order field
    /// with missing values first; ties keep insertion order.
    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>>;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Inserts a new document and returns its store-assigned id.
    async fn insert(&self, collection: &str, fields: Fields) -> StoreResult<String>;

    /// Creates or replaces the document at `id`.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;

    /// Shallow-merges `fields` onto an existing document. `NotFound` if it is absent.
    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;

    /// Hard delete. Deleting a missing id succeeds.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    async fn ping(&self) -> StoreResult<()>;
}

/// Orders JSON values the way the Postgres backend orders JSONB:
/// null < string < number < boolean < array < object.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::String(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::Bool(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_matches_all_filters() {
        let fields = json!({ "published": true, "slug": "robot" });
        let fields = fields.as_object().unwrap();

        assert!(Query::new().where_eq("published", true).matches(fields));
        assert!(Query::new()
            .where_eq("published", true)
            .where_eq("slug", "robot")
            .matches(fields));
        assert!(!Query::new().where_eq("slug", "other").matches(fields));
        assert!(!Query::new().where_eq("missing", true).matches(fields));
    }

    #[test]
    fn test_compare_values_numbers_numerically() {
        assert_eq!(
            compare_values(Some(&json!(2)), Some(&json!(10))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!(1.5)), Some(&json!(1))),
            Ordering::Greater
        );
    }

    #[test]
    fn test_compare_values_missing_sorts_first() {
        assert_eq!(compare_values(None, Some(&json!(0))), Ordering::Less);
        assert_eq!(compare_values(None, None), Ordering::Equal);
    }

    #[test]
    fn test_not_found_helper() {
        let err = StoreError::not_found("projects", "abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "document projects/abc not found");
    }
}
