use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::deps::AppDeps;
use crate::handlers::{chats, health, projects};

/// Wires every endpoint onto the shared `AppDeps` state, the way the
/// teacher's `main.rs` builds its own `Router` with `.with_state(state)`
/// plus a CORS layer and request tracing.
pub fn build_router(deps: AppDeps) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/projects", post(projects::create_project).get(projects::list_projects))
        .route("/projects/{id}", get(projects::get_project).delete(projects::delete_project))
        .route("/projects/{id}/status", get(projects::get_project_status))
        .route("/projects/{id}/snapshot", get(projects::get_project_snapshot))
        .route("/projects/{id}/job", get(projects::get_project_job))
        .route("/projects/{id}/cancel", post(projects::cancel_project))
        .route("/projects/{id}/resume", post(projects::resume_project))
        .route("/projects/{id}/progress-stream", get(projects::progress_stream))
        .route("/chats", post(chats::create_chat).get(chats::list_chats))
        .route("/chats/{id}", get(chats::get_chat).delete(chats::delete_chat))
        .route("/chats/{id}/messages", post(chats::post_message))
        .with_state(deps.clone())
        .layer(cors_layer(&deps))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        }))
}

/// Permissive if `allowed_origins` is empty, otherwise restricted to the
/// configured list — mirrors the teacher's `CORS_ORIGINS` handling exactly.
fn cors_layer(deps: &AppDeps) -> CorsLayer {
    if deps.config.allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = deps
            .config
            .allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
    }
}
