use chrono::{DateTime, Utc};
use ledgerflow_core::Id;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ExtractionResult {
    pub id: Id,
    pub document_id: Id,
    pub data: serde_json::Value,
    pub citations: Option<serde_json::Value>,
    pub reasoning: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CompanySnapshot {
    pub project_id: Id,
    pub version: i32,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
