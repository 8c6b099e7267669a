use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use ledgerflow_core::IngestError;
use ledgerflow_store::StoreError;
use serde_json::json;
use tracing::{error, warn};

/// Maps `IngestError` to HTTP status codes:
/// Validation/Conflict as 4xx, Unavailable as 503, NotFound as 404,
/// Cancelled swallowed (caller-initiated, not an error), Internal as 500
/// with a generic body so no message or secret ever leaks to a client.
pub struct ApiError(pub IngestError);

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        Self(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            IngestError::ValidationFailed(m) => (StatusCode::BAD_REQUEST, m.clone()),
            IngestError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            IngestError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            IngestError::Unavailable(m) => {
                warn!(error = %m, "external dependency unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "a dependency is temporarily unavailable".to_string())
            }
            IngestError::Cancelled => (StatusCode::OK, "cancelled".to_string()),
            IngestError::Internal(m) => {
                error!(error = %m, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            IngestError::Database(e) => {
                error!(error = %e, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            IngestError::Other(e) => {
                error!(error = %e, "unclassified error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
