#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use movie_recs_api::{
    db::InMemoryCatalog,
    error::{AppError, AppResult},
    models::{EmbeddingModel, Movie, MovieId},
    services::{embedding::ensure_text, EmbeddingProvider},
};

pub const MODEL: EmbeddingModel = EmbeddingModel::Small3;

/// Vector of the model's length with the first two components set
pub fn planar(x: f32, y: f32) -> Vec<f32> {
    let mut v = vec![0.0; MODEL.dimensions()];
    v[0] = x;
    v[1] = y;
    v
}

/// Unit vector at `cos_sim` similarity to the x axis
pub fn at_similarity(cos_sim: f32) -> Vec<f32> {
    planar(cos_sim, (1.0 - cos_sim * cos_sim).sqrt())
}

pub fn movie(id: MovieId, votes: i64, rating: f64) -> Movie {
    let mut movie = Movie::new(id, format!("Movie {}", id));
    movie.vote_count = votes;
    movie.vote_average = rating;
    movie.poster_path = Some(format!("/poster/{}.jpg", id));
    movie
}

/// Deterministic embedder: known prompts map to fixed vectors, anything else to the x axis
#[derive(Default)]
pub struct FixtureEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
    failing: bool,
}

impl FixtureEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_prompt(mut self, prompt: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(prompt.to_string(), vector);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FixtureEmbedder {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let text = ensure_text(text)?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AppError::EmbeddingService("provider unavailable".to_string()));
        }
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| planar(1.0, 0.0)))
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn model(&self) -> EmbeddingModel {
        MODEL
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

/// Catalog of `count` movies spread at increasing angles from the x axis
///
/// Movie `i` (1-based) sits at angle `i * 0.05` rad, so distance to the x axis
/// grows with the ID.
pub async fn fan_catalog(count: i32) -> Arc<InMemoryCatalog> {
    let catalog = Arc::new(InMemoryCatalog::new());
    for id in 1..=count {
        let angle = id as f32 * 0.05;
        catalog
            .insert_with_embedding(movie(id, 100, 6.0), MODEL, planar(angle.cos(), angle.sin()))
            .await;
    }
    catalog
}
