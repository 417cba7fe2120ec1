use std::cmp::Ordering;
use std::sync::Arc;

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{Candidate, EmbeddingModel, MovieId},
};

/// Cosine distance `1 - cos(a, b)`; 0 means same direction, 2 opposite
///
/// A zero vector has no direction and is treated as orthogonal to everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Global candidate order: distance ascending, vote count descending, movie ID ascending
pub fn candidate_order(a: &Candidate, b: &Candidate) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| b.movie.vote_count.cmp(&a.movie.vote_count))
        .then_with(|| a.movie.movie_id.cmp(&b.movie.movie_id))
}

/// Paginated nearest-neighbour lookup over the catalog
///
/// Page `n` is the slice `[(n-1) * page_size, n * page_size)` of the global
/// candidate order. Ordering and pagination are pushed down to the store;
/// the returned page is re-sorted with [`candidate_order`] so ties come back
/// in the same order even when the store's index is approximate.
#[derive(Clone)]
pub struct SimilarityRetriever {
    catalog: Arc<dyn CatalogStore>,
    model: EmbeddingModel,
}

impl SimilarityRetriever {
    pub fn new(catalog: Arc<dyn CatalogStore>, model: EmbeddingModel) -> Self {
        Self { catalog, model }
    }

    pub fn model(&self) -> EmbeddingModel {
        self.model
    }

    pub async fn retrieve(
        &self,
        query: &[f32],
        page: u32,
        page_size: u32,
        exclude: &[MovieId],
    ) -> AppResult<Vec<Candidate>> {
        if page == 0 {
            return Err(AppError::InvalidInput("Page numbers start at 1".to_string()));
        }
        if page_size == 0 {
            return Err(AppError::InvalidInput(
                "Page size must be positive".to_string(),
            ));
        }
        if query.len() != self.model.dimensions() {
            return Err(AppError::InvalidInput(format!(
                "Query vector has {} dimensions, {} expects {}",
                query.len(),
                self.model,
                self.model.dimensions()
            )));
        }

        let offset = u64::from(page - 1) * u64::from(page_size);

        let mut candidates = self
            .catalog
            .nearest(self.model, query, exclude, offset, page_size)
            .await?;

        candidates.retain(|c| !exclude.contains(&c.movie.movie_id));
        candidates.truncate(page_size as usize);
        candidates.sort_by(candidate_order);

        tracing::debug!(
            page,
            page_size,
            excluded = exclude.len(),
            returned = candidates.len(),
            "Similarity retrieval completed"
        );

        Ok(candidates)
    }
}
