//! OpenAI embeddings provider
//!
//! Talks to any OpenAI-compatible `/embeddings` endpoint.

use std::time::{Duration, Instant};

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::EmbeddingModel,
    services::embedding::{ensure_dimensions, ensure_text, EmbeddingProvider},
};

#[derive(Clone)]
pub struct OpenAiEmbedder {
    http_client: HttpClient,
    endpoint: String,
    model: EmbeddingModel,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: &str,
        api_url: &str,
        model: EmbeddingModel,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing OpenAI API key");

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
                .context("invalid OpenAI API key")?,
        );
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build OpenAI HTTP client")?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/embeddings", api_url.trim_end_matches('/')),
            model,
        })
    }

    async fn request(&self, input: EmbeddingInput<'_>, expected: usize) -> AppResult<Vec<Vec<f32>>> {
        let start = Instant::now();
        let body = EmbeddingRequest {
            model: self.model.name(),
            input,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmbeddingService(format!(
                "API returned status {}: {}",
                status, body
            )));
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != expected {
            return Err(AppError::EmbeddingFormat(format!(
                "provider returned {} embeddings for {} inputs",
                parsed.data.len(),
                expected
            )));
        }
        if let Some((position, entry)) = parsed
            .data
            .iter()
            .enumerate()
            .find(|(position, entry)| entry.index != *position)
        {
            return Err(AppError::EmbeddingFormat(format!(
                "provider returned index {} where {} was expected",
                entry.index, position
            )));
        }

        let embeddings: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();
        for embedding in &embeddings {
            ensure_dimensions(self.model, embedding)?;
        }

        tracing::info!(
            model = %self.model,
            inputs = expected,
            elapsed_ms = start.elapsed().as_millis() as u64,
            provider = "openai",
            "Embeddings generated"
        );

        Ok(embeddings)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let text = ensure_text(text)?;
        let mut embeddings = self.request(EmbeddingInput::Single(text), 1).await?;
        embeddings
            .pop()
            .ok_or_else(|| AppError::EmbeddingFormat("provider returned no embedding".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        for text in texts {
            ensure_text(text)?;
        }
        self.request(EmbeddingInput::Batch(texts), texts.len()).await
    }

    fn model(&self) -> EmbeddingModel {
        self.model
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum EmbeddingInput<'a> {
    Single(&'a str),
    Batch(&'a [String]),
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: EmbeddingInput<'a>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
