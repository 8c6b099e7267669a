use ledgerflow_core::Id;

use crate::error::{Result, StoreError};
use crate::models::{Chat, Message, MessageRole, MessageRow};
use crate::store::Store;

impl Store {
    pub async fn create_chat(&self, title: Option<&str>) -> Result<Chat> {
        sqlx::query_as::<_, Chat>(
            "INSERT INTO chats (title) VALUES ($1) RETURNING id, title, created_at",
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    pub async fn get_chat(&self, id: Id) -> Result<Chat> {
        sqlx::query_as::<_, Chat>("SELECT id, title, created_at FROM chats WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)
    }

    pub async fn list_chats(&self, skip: i64, limit: i64) -> Result<Vec<Chat>> {
        sqlx::query_as::<_, Chat>(
            "SELECT id, title, created_at FROM chats ORDER BY created_at DESC OFFSET $1 LIMIT $2",
        )
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    pub async fn delete_chat(&self, id: Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM chats WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("chat {id} not found")));
        }
        Ok(())
    }

    /// `project_ids` is recorded per-message, not per-chat — retrieval scope
    /// is message-local.
    pub async fn insert_message(
        &self,
        chat_id: Id,
        role: MessageRole,
        content: &str,
        project_ids: &[Id],
    ) -> Result<Message> {
        let ids: Vec<uuid::Uuid> = project_ids.iter().map(|id| id.0).collect();

        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (chat_id, role, content, project_ids)
            VALUES ($1, $2, $3, $4)
            RETURNING id, chat_id, role, content, project_ids, created_at
            "#,
        )
        .bind(chat_id)
        .bind(role.as_str())
        .bind(content)
        .bind(&ids)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(row.into())
    }

    /// Chronological order — the caller prepends this as chat history.
    pub async fn list_messages_for_chat(&self, chat_id: Id) -> Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, chat_id, role, content, project_ids, created_at \
             FROM messages WHERE chat_id = $1 ORDER BY created_at ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
