use thiserror::Error;

/// Crate-wide error kinds. Every component crate's local error type
/// converts into this one at its public boundary.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("external dependency unavailable: {0}")]
    Unavailable(String),

    #[error("cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IngestError {
    /// Fold a raw `sqlx::Error` into the error kind the Store contract
    /// promises: connection failures surface as `Unavailable`, constraint
    /// violations as `Conflict`, missing rows as `NotFound`, everything
    /// else as `Internal`.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => IngestError::NotFound("row not found".into()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                IngestError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed => {
                IngestError::Unavailable(err.to_string())
            }
            _ => IngestError::Internal(err.to_string()),
        }
    }

    /// Whether this error should be classified `can_resume = false` for a
    /// step.
    pub fn is_fatal_for_step(&self) -> bool {
        matches!(self, IngestError::ValidationFailed(_))
    }
}
