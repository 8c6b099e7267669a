use chrono::{DateTime, Utc};
use ledgerflow_core::Id;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Document {
    pub id: Id,
    pub project_id: Id,
    pub blob_url: String,
    pub source_url: String,
    pub doc_type: String,
    pub period: String,
    pub page_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DocumentPage {
    pub id: Id,
    pub document_id: Id,
    pub page_no: i32,
    pub text: String,
    pub created_at: DateTime<Utc>,
}
