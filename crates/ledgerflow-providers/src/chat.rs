use std::pin::Pin;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;

/// A chat turn as the RetrievalPipeline assembles it: the system directive,
/// then chat history, then the retrieval-augmented user turn.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub role: &'static str,
    pub content: String,
}

pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// The RetrievalPipeline's external dependency: a streaming chat
/// completion. Each item is one token/text fragment, surfaced to callers as
/// `chunk` events.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn stream_chat(&self, turns: Vec<ChatTurn>) -> Result<TokenStream>;
}

#[derive(Serialize)]
struct StreamingChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Speaks the OpenAI-compatible streaming `/chat/completions` protocol:
/// newline-delimited `data: <json>` frames, terminated by `data: [DONE]`.
pub struct HttpChatProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpChatProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for HttpChatProvider {
    async fn stream_chat(&self, turns: Vec<ChatTurn>) -> Result<TokenStream> {
        let messages: Vec<WireMessage> = turns
            .iter()
            .map(|t| WireMessage { role: t.role, content: &t.content })
            .collect();

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&StreamingChatRequest { model: &self.model, stream: true, messages })
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("chat request returned {}", response.status());
        }

        let byte_stream = response.bytes_stream();
        let token_stream = byte_stream
            .map(|chunk| chunk.context("chat stream read error"))
            .flat_map(|chunk| futures::stream::iter(split_into_tokens(chunk)));

        Ok(Box::pin(token_stream))
    }
}

fn split_into_tokens(chunk: Result<bytes::Bytes>) -> Vec<Result<String>> {
    let bytes = match chunk {
        Ok(bytes) => bytes,
        Err(err) => return vec![Err(err)],
    };
    let text = String::from_utf8_lossy(&bytes);

    text.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .filter(|data| *data != "[DONE]")
        .filter_map(|data| serde_json::from_str::<Value>(data).ok())
        .filter_map(|event| {
            event["choices"][0]["delta"]["content"]
                .as_str()
                .map(|s| Ok(s.to_string()))
        })
        .collect()
}
