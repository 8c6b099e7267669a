use chrono::{DateTime, Utc};
use ledgerflow_core::Id;
use serde::{Deserialize, Serialize};

/// Coarse project lifecycle state. Distinct from the more granular
/// `JobStatus` FSM — a project's state is a summary a caller can poll
/// without knowing about jobs at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectState {
    Pending,
    Scraping,
    Downloading,
    Processing,
    Completed,
    Failed,
}

impl ProjectState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectState::Pending => "pending",
            ProjectState::Scraping => "scraping",
            ProjectState::Downloading => "downloading",
            ProjectState::Processing => "processing",
            ProjectState::Completed => "completed",
            ProjectState::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "scraping" => ProjectState::Scraping,
            "downloading" => ProjectState::Downloading,
            "processing" => ProjectState::Processing,
            "completed" => ProjectState::Completed,
            "failed" => ProjectState::Failed,
            _ => ProjectState::Pending,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: Id,
    pub url: String,
    pub display_name: String,
    pub state: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: Id,
    pub url: String,
    pub display_name: String,
    pub state: ProjectState,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: row.id,
            url: row.url,
            display_name: row.display_name,
            state: ProjectState::parse(&row.state),
            error: row.error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
