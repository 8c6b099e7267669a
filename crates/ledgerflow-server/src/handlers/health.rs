use axum::response::IntoResponse;

/// Present verbatim as in the teacher's `routes.rs` — a bare liveness
/// probe, no dependency checks.
pub async fn health() -> impl IntoResponse {
    "ok"
}
