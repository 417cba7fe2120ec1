use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use crate::{
    db::{CatalogStore, CatalogWriter},
    error::AppResult,
    models::{Candidate, EmbeddingModel, Movie, MovieId},
    services::retriever::{candidate_order, cosine_distance},
};

struct CatalogEntry {
    movie: Movie,
    embeddings: HashMap<EmbeddingModel, Vec<f32>>,
}

/// Catalog held in memory, ranked by exact brute-force cosine distance
///
/// Used as a fixture in tests and for local runs without a database.
#[derive(Default)]
pub struct InMemoryCatalog {
    entries: RwLock<BTreeMap<MovieId, CatalogEntry>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a movie, keeping any embeddings it already had
    pub async fn insert_movie(&self, movie: Movie) {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&movie.movie_id) {
            Some(entry) => entry.movie = movie,
            None => {
                entries.insert(
                    movie.movie_id,
                    CatalogEntry {
                        movie,
                        embeddings: HashMap::new(),
                    },
                );
            }
        }
    }

    /// Adds a movie together with its embedding for `model`
    pub async fn insert_with_embedding(
        &self,
        movie: Movie,
        model: EmbeddingModel,
        embedding: Vec<f32>,
    ) {
        let movie_id = movie.movie_id;
        self.insert_movie(movie).await;
        if let Some(entry) = self.entries.write().await.get_mut(&movie_id) {
            entry.embeddings.insert(model, embedding);
        }
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn nearest(
        &self,
        model: EmbeddingModel,
        query: &[f32],
        exclude: &[MovieId],
        offset: u64,
        limit: u32,
    ) -> AppResult<Vec<Candidate>> {
        let entries = self.entries.read().await;

        let mut candidates: Vec<Candidate> = entries
            .values()
            .filter(|entry| !exclude.contains(&entry.movie.movie_id))
            .filter_map(|entry| {
                let embedding = entry.embeddings.get(&model)?;
                if embedding.len() != query.len() {
                    tracing::warn!(
                        movie_id = entry.movie.movie_id,
                        stored = embedding.len(),
                        query = query.len(),
                        "Skipping embedding with mismatched dimensions"
                    );
                    return None;
                }
                Some(Candidate {
                    movie: entry.movie.clone(),
                    distance: cosine_distance(query, embedding),
                })
            })
            .collect();

        candidates.sort_by(candidate_order);

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(candidates
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect())
    }

    async fn find_movie(&self, movie_id: MovieId) -> AppResult<Option<Movie>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&movie_id).map(|entry| entry.movie.clone()))
    }

    async fn stored_embedding(
        &self,
        movie_id: MovieId,
        model: EmbeddingModel,
    ) -> AppResult<Option<Vec<f32>>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&movie_id)
            .and_then(|entry| entry.embeddings.get(&model).cloned()))
    }
}

#[async_trait::async_trait]
impl CatalogWriter for InMemoryCatalog {
    async fn movies_missing_embeddings(
        &self,
        model: EmbeddingModel,
        after: Option<MovieId>,
        limit: u32,
    ) -> AppResult<Vec<Movie>> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .filter(|entry| after.map_or(true, |after| entry.movie.movie_id > after))
            .filter(|entry| !entry.embeddings.contains_key(&model))
            .take(limit as usize)
            .map(|entry| entry.movie.clone())
            .collect())
    }

    async fn store_embedding(
        &self,
        movie_id: MovieId,
        model: EmbeddingModel,
        embedding: &[f32],
    ) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(&movie_id).ok_or_else(|| {
            crate::error::AppError::NotFound(format!("movie {} not in catalog", movie_id))
        })?;
        entry.embeddings.insert(model, embedding.to_vec());
        Ok(())
    }
}
