//! External text-generation and embedding collaborators (spec §6).
//!
//! The orchestration core never talks to a model provider directly — it
//! calls through the [`Generator`] and [`Embedder`] traits defined here.
//! Two implementations ship: an HTTP-backed client that speaks an
//! OpenAI-compatible `/chat/completions` + `/embeddings` surface, and a
//! deterministic in-memory stub used by tests and by callers who have not
//! configured a live backend yet.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod stub;

/// Errors a `Generator` or `Embedder` call can surface.
///
/// These map onto the core's own `GENERATOR_*` / `EMBEDDING_*` error
/// sentinels (spec §7) — the conversation state machine wraps them rather
/// than inspecting provider internals.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("generator call exceeded its deadline")]
    Timeout,
    #[error("generator backend error: {0}")]
    Generator(String),
    #[error("embedding backend error: {0}")]
    Embedding(String),
}

/// A single request to the text-generation collaborator.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    pub deadline: Duration,
}

/// The text-generation collaborator (spec §6: `generate(prompt, temperature,
/// deadline) -> text | error`). Implementations must honor `deadline` and
/// surface [`CollaboratorError::Timeout`] on breach rather than hanging.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, CollaboratorError>;
}

/// The embedding collaborator (spec §6: `embed(text) -> vector`).
/// Determinism across calls is not required by the contract, but
/// reproducibility of segmentation depends on it — the stub and any
/// production backend you wire in should be deterministic for identical
/// input text.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError>;
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// HTTP-backed collaborator speaking an OpenAI-compatible surface.
///
/// Works against any provider exposing `/chat/completions` and
/// `/embeddings` (OpenAI, OpenRouter, a local vLLM/Ollama-compatible
/// gateway, ...). The base URL and model names are supplied by the caller's
/// configuration rather than hardcoded, so the same client type serves
/// every backend the deployer points it at.
#[derive(Debug, Clone)]
pub struct HttpCollaborator {
    client: reqwest::Client,
    base_url: String,
    chat_model: String,
    embedding_model: String,
    api_key: Option<String>,
}

impl HttpCollaborator {
    pub fn new(
        base_url: impl Into<String>,
        chat_model: impl Into<String>,
        embedding_model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            chat_model: chat_model.into(),
            embedding_model: embedding_model.into(),
            api_key,
        }
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'));
        let mut builder = self.client.post(url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }
}

#[async_trait]
impl Generator for HttpCollaborator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, CollaboratorError> {
        let body = ChatCompletionRequest {
            model: &self.chat_model,
            temperature: request.temperature,
            messages: vec![ChatMessage { role: "user", content: &request.prompt }],
        };

        let send = self
            .request("chat/completions")
            .json(&body)
            .timeout(request.deadline)
            .send();

        let response = match tokio::time::timeout(request.deadline, send).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(err)) if err.is_timeout() => return Err(CollaboratorError::Timeout),
            Ok(Err(err)) => return Err(CollaboratorError::Generator(err.to_string())),
            Err(_elapsed) => return Err(CollaboratorError::Timeout),
        };

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Generator(format!("http {status}: {text}")));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| CollaboratorError::Generator(err.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| CollaboratorError::Generator("empty choices array".to_string()))
    }
}

#[async_trait]
impl Embedder for HttpCollaborator {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CollaboratorError> {
        let body = EmbeddingRequest { model: &self.embedding_model, input: text };
        let response = self
            .request("embeddings")
            .json(&body)
            .send()
            .await
            .map_err(|err| CollaboratorError::Embedding(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Embedding(format!("http {status}: {text}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|err| CollaboratorError::Embedding(err.to_string()))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|datum| datum.embedding)
            .ok_or_else(|| CollaboratorError::Embedding("empty data array".to_string()))
    }
}
