//! Embedding generation
//!
//! Turns prompts and movie documents into fixed-length vectors through an
//! external provider. Providers are interchangeable behind [`EmbeddingProvider`];
//! [`CachedEmbedder`] layers an optional prompt cache over any of them.

use crate::{
    error::{AppError, AppResult},
    models::EmbeddingModel,
};

pub mod cached;
pub mod openai;

pub use cached::{CachedEmbedder, EmbeddingCache};
pub use openai::OpenAiEmbedder;

/// Trait for embedding providers
///
/// Implementations issue one provider call per invocation and never retry;
/// retry policy belongs to whoever hosts the provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a single non-empty text
    ///
    /// Fails with `InvalidInput` for blank text, `EmbeddingService` when the
    /// provider cannot be reached or rejects the call, and `EmbeddingFormat`
    /// when the returned vector does not have [`EmbeddingModel::dimensions`] entries.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;

    /// Embeds several texts in one provider call, preserving input order
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Model whose vectors this provider produces
    fn model(&self) -> EmbeddingModel;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Rejects blank input before any provider call is made
pub fn ensure_text(text: &str) -> AppResult<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(
            "Text to embed cannot be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Checks that a vector has the length the model guarantees
pub fn ensure_dimensions(model: EmbeddingModel, embedding: &[f32]) -> AppResult<()> {
    if embedding.len() != model.dimensions() {
        return Err(AppError::dimension_mismatch(
            model.dimensions(),
            embedding.len(),
        ));
    }
    Ok(())
}
