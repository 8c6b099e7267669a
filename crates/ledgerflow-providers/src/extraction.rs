use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// The `extract_data` step's external dependency: turn a document's page
/// text into the structured JSON an ExtractionResult carries, alongside
/// whatever citations/reasoning the model returns.
///
/// The `generate_snapshot` step reuses the same provider to fold a
/// project's extraction results into one CompanySnapshot payload.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    async fn extract(&self, doc_type: &str, period: &str, page_text: &str) -> Result<Value>;
    async fn synthesize_snapshot(&self, extraction_results: &[Value]) -> Result<Value>;
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<WireMessage<'a>>,
    response_format: Value,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: String,
}

/// Speaks the OpenAI-compatible `/chat/completions` JSON-mode shape — the
/// same request shape `chat_completion`/`extract` build against, just with
/// a prompt tailored to financial-document extraction instead of a caller
/// supplied JSON schema.
pub struct HttpExtractionProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpExtractionProvider {
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

    async fn chat_json(&self, system: String, user: String) -> Result<Value> {
        let request = ChatCompletionRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![
                WireMessage { role: "system", content: system },
                WireMessage { role: "user", content: user },
            ],
            response_format: serde_json::json!({ "type": "json_object" }),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("extraction request returned {}", response.status());
        }

        let body: Value = response.json().await?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .context("extraction response missing message content")?;

        serde_json::from_str(content).context("extraction response was not valid JSON")
    }
}

#[async_trait]
impl ExtractionProvider for HttpExtractionProvider {
    async fn extract(&self, doc_type: &str, period: &str, page_text: &str) -> Result<Value> {
        let system = "Extract the key financial figures and disclosures from this filing page. \
            Respond with a JSON object containing the extracted fields, a `citations` array \
            identifying where each figure was found, and a `reasoning` string. \
            Do not invent numbers that are not present in the text."
            .to_string();
        let user = format!("Document type: {doc_type}\nReporting period: {period}\n\n{page_text}");
        self.chat_json(system, user).await
    }

    async fn synthesize_snapshot(&self, extraction_results: &[Value]) -> Result<Value> {
        let system = "Combine these per-document extraction results into one company snapshot. \
            Respond with a single JSON object. Use only the given data; do not guess numbers."
            .to_string();
        let user = serde_json::to_string(extraction_results)?;
        self.chat_json(system, user).await
    }
}
