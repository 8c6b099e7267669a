use chrono::{DateTime, Utc};
use ledgerflow_core::Id;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TextChunk {
    pub id: Id,
    pub page_id: Id,
    pub chunk_index: i32,
    pub content: String,
    pub field_tag: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A chunk to be inserted together with its embedding in one transaction —
/// an embedding only ever exists alongside its chunk.
#[derive(Debug, Clone)]
pub struct NewChunk {
    pub page_id: Id,
    pub chunk_index: i32,
    pub content: String,
    pub field_tag: Option<String>,
    pub vector: Vec<f32>,
}

/// A KNN match row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct KnnMatch {
    pub chunk_id: Id,
    pub content: String,
    pub page_no: i32,
    pub doc_type: String,
    pub period: String,
    pub company: String,
    pub field_tag: Option<String>,
    pub distance: f64,
}
