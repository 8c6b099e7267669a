use chrono::{DateTime, Utc};
use ledgerflow_core::Id;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Chat {
    pub id: Id,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Ai,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Ai => "ai",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "ai" => MessageRole::Ai,
            _ => MessageRole::User,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageRow {
    pub id: Id,
    pub chat_id: Id,
    pub role: String,
    pub content: String,
    pub project_ids: Vec<uuid::Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: Id,
    pub chat_id: Id,
    pub role: MessageRole,
    pub content: String,
    pub project_ids: Vec<Id>,
    pub created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            chat_id: row.chat_id,
            role: MessageRole::parse(&row.role),
            content: row.content,
            project_ids: row.project_ids.into_iter().map(Id).collect(),
            created_at: row.created_at,
        }
    }
}
