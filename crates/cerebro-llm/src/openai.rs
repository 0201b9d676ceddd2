//! OpenAI-compatible HTTP client implementing all three collaborators.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::citation::{ANSWER_SENTINEL, REFERENCE_PREFIX};
use crate::embed::TextEmbedder;
use crate::extract::{parse_extraction, Extraction, GraphExtractor};
use crate::synth::AnswerSynthesizer;
use cerebro_core::config::LlmSettings;
use cerebro_core::{Error, Result};

const EXTRACTION_SYSTEM_PROMPT: &str = "You extract a knowledge graph from text. \
Respond with a single JSON object: \
{\"nodes\": [{\"name\": string, \"description\": string}], \
\"edges\": [{\"source\": string, \"target\": string, \"relation\": string}]}. \
Node names are short noun phrases; relations are lowercase snake_case verbs. \
Output nothing but the JSON object.";

/// `OpenAiClient` talks to any OpenAI-compatible API: chat completions for
/// extraction and synthesis, the embeddings endpoint for vectors.
pub struct OpenAiClient {
    client: Client,
    settings: LlmSettings,
    embedding_dim: usize,
}

impl OpenAiClient {
    pub fn new(settings: LlmSettings, embedding_dim: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("http client: {}", e)))?;
        Ok(Self { client, settings, embedding_dim })
    }

    fn api_key(&self) -> Result<&str> {
        self.settings
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("no API key configured".into()))
    }

    fn map_request_error(e: reqwest::Error, what: &str) -> Error {
        if e.is_timeout() {
            Error::Timeout(format!("{} request timed out", what))
        } else {
            Error::Synthesis(format!("{} request failed: {}", what, e))
        }
    }

    /// One non-streaming chat completion, returning the message content.
    async fn chat(&self, system: &str, user: &str, what: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.settings.api_base);
        let body = json!({
            "model": self.settings.chat_model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": 0.0,
        });

        debug!("chat completion via {} for {}", self.settings.chat_model, what);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key()?))
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::map_request_error(e, what))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!("{} API error {}: {}", what, status, body)));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Synthesis(format!("{} response body: {}", what, e)))?;
        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Synthesis(format!("{} response had no content", what)))
    }

    fn synthesis_system_prompt() -> String {
        format!(
            "You answer questions using ONLY the provided knowledge graph schema. \
             Write the answer, then the literal marker {sentinel}, then one line \
             per schema node you used, formatted exactly as \"{prefix} <node name>\". \
             If the schema does not contain the answer, say so before {sentinel}.",
            sentinel = ANSWER_SENTINEL,
            prefix = REFERENCE_PREFIX,
        )
    }
}

#[async_trait]
impl GraphExtractor for OpenAiClient {
    async fn extract(&self, text: &str, source_id: &str) -> Result<Extraction> {
        let raw = self
            .chat(EXTRACTION_SYSTEM_PROMPT, text, "extraction")
            .await
            .map_err(|e| match e {
                Error::Timeout(_) | Error::Config(_) => e,
                other => Error::Extraction(other.to_string()),
            })?;
        let extraction = parse_extraction(&raw)?;
        debug!(
            "extracted {} nodes, {} edges from source {}",
            extraction.nodes.len(),
            extraction.edges.len(),
            source_id
        );
        Ok(extraction)
    }
}

#[async_trait]
impl AnswerSynthesizer for OpenAiClient {
    async fn synthesize(&self, schema_text: &str, question: &str) -> Result<String> {
        let user = format!("Schema:\n{}\n\nQuestion: {}", schema_text, question);
        self.chat(&Self::synthesis_system_prompt(), &user, "synthesis").await
    }
}

#[async_trait]
impl TextEmbedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.settings.api_base);
        let body = json!({
            "model": self.settings.embedding_model,
            "input": text,
            "dimensions": self.embedding_dim,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key()?))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout("embedding request timed out".into())
                } else {
                    Error::Embedding(format!("embedding request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!("embedding API error {}: {}", status, body)));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("embedding response body: {}", e)))?;
        let values = parsed["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| Error::Embedding("embedding response had no vector".into()))?;
        values
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| Error::Embedding("non-numeric embedding value".into()))
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        self.embedding_dim
    }
}
