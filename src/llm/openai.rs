//! Client for OpenAI-compatible chat completion and embedding endpoints.

use super::{ChatMessage, ChatModel, Embedder, TextModel};
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use wreq::Client;

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Hosted language model client, authenticated with a bearer key.
pub struct OpenAiClient {
    client: Client,
    api_base: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(config: &Config, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .context("Failed to build language model HTTP client")?;

        Ok(Self {
            client,
            api_base: config.llm.api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            chat_model: config.llm.chat_model.clone(),
            embedding_model: config.llm.embedding_model.clone(),
            temperature: config.llm.temperature,
        })
    }

    async fn post<T: for<'de> Deserialize<'de>>(&self, endpoint: &str, body: &Value) -> Result<T> {
        let url = format!("{}/{}", self.api_base, endpoint);
        debug!("POST {}", url);

        let payload = serde_json::to_vec(body).context("Failed to encode request body")?;

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", endpoint))?;

        let status = response.status();
        let text = response.text().await.context("Failed to read response body")?;

        if !status.is_success() {
            anyhow::bail!("Language model API error ({}): {}", status, text);
        }

        serde_json::from_str(&text).with_context(|| format!("Unexpected {} response", endpoint))
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn chat(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ChatMessage> {
        let mut body = json!({
            "model": self.chat_model,
            "temperature": self.temperature,
            "messages": messages,
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.to_vec());
        }

        let response: ChatCompletionResponse = self.post("chat/completions", &body).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .context("Chat completion returned no choices")
    }
}

#[async_trait]
impl TextModel for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let message = self.chat(&[ChatMessage::user(prompt)], &[]).await?;
        Ok(message.content.unwrap_or_default())
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": self.embedding_model,
            "input": inputs,
        });

        let mut response: EmbeddingResponse = self.post("embeddings", &body).await?;

        if response.data.len() != inputs.len() {
            anyhow::bail!(
                "Expected {} embeddings, received {}",
                inputs.len(),
                response.data.len()
            );
        }

        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}
