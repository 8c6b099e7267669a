use chrono::{DateTime, Utc};
use ledgerflow_core::Id;
use serde::{Deserialize, Serialize};

/// Job FSM state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "running" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "cancelled" => JobStatus::Cancelled,
            _ => JobStatus::Pending,
        }
    }

    /// Terminal states from which no further step execution occurs unless
    /// resumed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRow {
    pub id: Id,
    pub short_id: String,
    pub project_id: Id,
    pub status: String,
    pub current_step: Option<String>,
    pub current_step_index: i32,
    pub total_steps: i32,
    pub last_successful_step: Option<String>,
    pub resume_payload: serde_json::Value,
    pub documents_processed: i32,
    pub embeddings_created: i32,
    pub retry_count: i32,
    pub can_resume: bool,
    pub error_message: Option<String>,
    pub failed_step: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Id,
    pub short_id: String,
    pub project_id: Id,
    pub status: JobStatus,
    pub current_step: Option<String>,
    pub current_step_index: i32,
    pub total_steps: i32,
    pub last_successful_step: Option<String>,
    pub documents_processed: i32,
    pub embeddings_created: i32,
    pub retry_count: i32,
    pub can_resume: bool,
    pub error_message: Option<String>,
    pub failed_step: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl JobRow {
    /// The opaque resume payload, deserialized. The Store treats this as
    /// opaque bytes; only the executor's codec knows its shape.
    pub fn resume_payload<T: for<'de> Deserialize<'de> + Default>(&self) -> T {
        serde_json::from_value(self.resume_payload.clone()).unwrap_or_default()
    }
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Self {
            id: row.id,
            short_id: row.short_id,
            project_id: row.project_id,
            status: JobStatus::parse(&row.status),
            current_step: row.current_step,
            current_step_index: row.current_step_index,
            total_steps: row.total_steps,
            last_successful_step: row.last_successful_step,
            documents_processed: row.documents_processed,
            embeddings_created: row.embeddings_created,
            retry_count: row.retry_count,
            can_resume: row.can_resume,
            error_message: row.error_message,
            failed_step: row.failed_step,
            started_at: row.started_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
            cancelled_at: row.cancelled_at,
        }
    }
}
