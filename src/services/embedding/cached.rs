use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::EmbeddingModel,
    services::embedding::{ensure_text, EmbeddingProvider},
};

/// Storage for prompt embeddings, addressed by [`CacheKey::Embedding`]
#[async_trait::async_trait]
pub trait EmbeddingCache: Send + Sync {
    async fn get_from_cache(&self, key: &CacheKey) -> AppResult<Option<Vec<f32>>>;

    /// Stores a value without waiting for the write to land
    fn set_in_background(&self, key: &CacheKey, value: &[f32], ttl: u64);
}

#[async_trait::async_trait]
impl EmbeddingCache for Cache {
    async fn get_from_cache(&self, key: &CacheKey) -> AppResult<Option<Vec<f32>>> {
        Cache::get_from_cache::<Vec<f32>>(self, key).await
    }

    fn set_in_background(&self, key: &CacheKey, value: &[f32], ttl: u64) {
        Cache::set_in_background(self, key, value, ttl)
    }
}

/// Prompt-embedding cache in front of another provider
///
/// Identical prompts (after trimming) for the same model are embedded once per
/// TTL window. Batch calls bypass the cache.
pub struct CachedEmbedder<C> {
    inner: Arc<dyn EmbeddingProvider>,
    cache: C,
    ttl_secs: u64,
}

impl<C: EmbeddingCache> CachedEmbedder<C> {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, cache: C, ttl_secs: u64) -> Self {
        Self {
            inner,
            cache,
            ttl_secs,
        }
    }
}

#[async_trait::async_trait]
impl<C: EmbeddingCache> EmbeddingProvider for CachedEmbedder<C> {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let text = ensure_text(text)?;
        cached!(
            self.cache,
            CacheKey::embedding(self.inner.model(), text),
            self.ttl_secs,
            async { self.inner.embed(text).await }
        )
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.inner.embed_batch(texts).await
    }

    fn model(&self) -> EmbeddingModel {
        self.inner.model()
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
