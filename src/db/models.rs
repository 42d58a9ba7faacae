//! Database Models - rows read back from the documents table (used by sqlx).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the `documents` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DocumentRow {
    pub id: String,
    pub data: serde_json::Value,
}
