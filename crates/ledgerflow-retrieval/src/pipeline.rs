use std::sync::Arc;

use async_stream::stream;
use futures::{Stream, StreamExt};
use ledgerflow_core::{AppConfig, Id};
use ledgerflow_events::Event;
use ledgerflow_providers::Providers;
use ledgerflow_store::{MessageRole, Store};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::prompt::{build_turns, render_context};

/// The RetrievalPipeline component: query-embedding, vector KNN
/// scoped to the caller's project set, prompt assembly, and streamed token
/// generation through the same event taxonomy the ProgressBus uses — but
/// delivered over a per-request channel rather than routed through the bus.
#[derive(Clone)]
pub struct RetrievalPipeline {
    store: Store,
    providers: Arc<Providers>,
    config: Arc<AppConfig>,
}

impl RetrievalPipeline {
    pub fn new(store: Store, providers: Arc<Providers>, config: Arc<AppConfig>) -> Self {
        Self { store, providers, config }
    }

    /// `Answer(chatId, userContent, projectIdSet) -> stream<Event>`.
    /// Ordering is `status*`, then `context`, then `start`, then
    /// one or more `chunk`, then exactly one `done`; `error` may appear at
    /// any point and is terminal. `cancellation` is the
    /// request-scoped signal a client disconnect trips: when set before `done`, persistence of the assistant
    /// message is skipped and the in-flight generation call is dropped.
    pub fn answer(
        &self,
        chat_id: Id,
        user_content: String,
        project_ids: Vec<Id>,
        cancellation: CancellationToken,
    ) -> impl Stream<Item = Event> {
        let store = self.store.clone();
        let providers = self.providers.clone();
        let config = self.config.clone();

        stream! {
            // Step 1: persist the user message before anything else can fail,
            // so a retried question never loses the turn that prompted it.
            let user_message = match store
                .insert_message(chat_id, MessageRole::User, &user_content, &project_ids)
                .await
            {
                Ok(m) => m,
                Err(err) => {
                    yield Event::Error { step: "persist_user_message".into(), message: err.to_string() };
                    return;
                }
            };

            if project_ids.is_empty() {
                yield Event::Error {
                    step: "knn_search".into(),
                    message: "KNN requires a non-empty project id set".into(),
                };
                return;
            }

            yield Event::Status {
                step: "embed_query".into(),
                step_index: 0,
                total_steps: 2,
                message: "Creating query embedding".into(),
            };

            let vector = match providers.embedding.embed(&user_content).await {
                Ok(v) => v,
                Err(err) => {
                    yield Event::Error { step: "embed_query".into(), message: err.to_string() };
                    return;
                }
            };

            if cancellation.is_cancelled() {
                info!(chat_id = %chat_id, "retrieval request cancelled before search");
                return;
            }

            yield Event::Status {
                step: "knn_search".into(),
                step_index: 1,
                total_steps: 2,
                message: "Searching relevant documents".into(),
            };

            let matches = match store.knn(&vector, &project_ids, config.knn_k).await {
                Ok(m) => m,
                Err(err) => {
                    yield Event::Error { step: "knn_search".into(), message: err.to_string() };
                    return;
                }
            };

            yield Event::Context { chunks_found: matches.len() };

            if cancellation.is_cancelled() {
                info!(chat_id = %chat_id, "retrieval request cancelled before prompt assembly");
                return;
            }

            let history = match store.list_messages_for_chat(chat_id).await {
                Ok(rows) => rows.into_iter().filter(|m| m.id != user_message.id).collect::<Vec<_>>(),
                Err(err) => {
                    yield Event::Error { step: "load_history".into(), message: err.to_string() };
                    return;
                }
            };

            let context = render_context(&matches);
            let turns = build_turns(&history, &user_content, &context);

            yield Event::Start {};

            let mut token_stream = match providers.chat.stream_chat(turns).await {
                Ok(s) => s,
                Err(err) => {
                    yield Event::Error { step: "chat_stream".into(), message: err.to_string() };
                    return;
                }
            };

            let mut full_response = String::new();
            let mut cancelled = false;

            loop {
                tokio::select! {
                    biased;
                    _ = cancellation.cancelled() => {
                        cancelled = true;
                        break;
                    }
                    next = token_stream.next() => {
                        match next {
                            Some(Ok(token)) => {
                                full_response.push_str(&token);
                                yield Event::Chunk { content: token };
                            }
                            Some(Err(err)) => {
                                yield Event::Error { step: "chat_stream".into(), message: err.to_string() };
                                return;
                            }
                            None => break,
                        }
                    }
                }
            }

            // Drop the in-flight generation call rather than let it run to
            // completion unobserved.
            drop(token_stream);

            if cancelled {
                warn!(chat_id = %chat_id, "retrieval request cancelled mid-stream; discarding in-flight answer");
                return;
            }

            // Persisted strictly before `done` is emitted.
            let assistant_message = match store
                .insert_message(chat_id, MessageRole::Ai, &full_response, &project_ids)
                .await
            {
                Ok(m) => m,
                Err(err) => {
                    yield Event::Error { step: "persist_assistant_message".into(), message: err.to_string() };
                    return;
                }
            };

            yield Event::Done { message_id: assistant_message.id.to_string() };
        }
    }
}
