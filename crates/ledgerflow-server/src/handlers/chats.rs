use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::body::Body;
use bytes::Bytes;
use ledgerflow_core::{Id, IngestError};
use ledgerflow_events::encode_event;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::deps::AppDeps;
use crate::error::ApiError;
use crate::handlers::projects::PaginationQuery;

#[derive(Deserialize)]
pub struct CreateChatRequest {
    pub title: Option<String>,
    pub project_ids: Vec<Id>,
}

#[derive(Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
    pub project_ids: Vec<Id>,
}

/// `POST /chats {title?, project_ids}` — auto-titles from the selected
/// projects' display names when `title` is absent.
pub async fn create_chat(
    State(deps): State<AppDeps>,
    Json(body): Json<CreateChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = match body.title {
        Some(title) => Some(title),
        None => {
            let mut names = Vec::with_capacity(body.project_ids.len());
            for project_id in &body.project_ids {
                names.push(deps.store.get_project(*project_id).await?.display_name);
            }
            (!names.is_empty()).then(|| names.join(", "))
        }
    };

    let chat = deps.store.create_chat(title.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(chat)))
}

pub async fn list_chats(
    State(deps): State<AppDeps>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let skip = pagination.skip.unwrap_or(0).max(0);
    let limit = pagination.limit.unwrap_or(20).clamp(1, 100);
    Ok(Json(deps.store.list_chats(skip, limit).await?))
}

pub async fn get_chat(
    State(deps): State<AppDeps>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, ApiError> {
    let chat = deps.store.get_chat(id).await?;
    let messages = deps.store.list_messages_for_chat(id).await?;
    Ok(Json(serde_json::json!({ "chat": chat, "messages": messages })))
}

pub async fn delete_chat(
    State(deps): State<AppDeps>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, ApiError> {
    deps.store.delete_chat(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /chats/{id}/messages {content, project_ids}` — streams the
/// RetrievalPipeline's event taxonomy over `text/event-stream`.
/// Cancellation is driven off the response body being dropped, which is
/// what happens when the client disconnects mid-stream.
pub async fn post_message(
    State(deps): State<AppDeps>,
    Path(id): Path<Id>,
    Json(body): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    deps.store.get_chat(id).await?;
    if body.content.trim().is_empty() {
        return Err(ApiError(IngestError::ValidationFailed("message content must not be empty".into())));
    }

    let cancellation = CancellationToken::new();
    let guard = cancellation.clone();
    let mut events = Box::pin(deps.retrieval.answer(id, body.content, body.project_ids, cancellation));

    let stream = async_stream::stream! {
        // Dropping the guard when this generator is dropped (client
        // disconnect ends the response body) trips the pipeline's
        // cancellation signal.
        let _guard = guard.drop_guard();
        use futures::StreamExt;
        while let Some(event) = events.next().await {
            yield Ok::<_, Infallible>(Bytes::from(encode_event(&event)));
        }
    };

    Ok((
        [
            (axum::http::header::CONTENT_TYPE, "text/event-stream"),
            (axum::http::header::CACHE_CONTROL, "no-cache"),
            (axum::http::header::HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Body::from_stream(stream),
    ))
}
