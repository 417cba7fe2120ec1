use std::sync::Arc;

use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{Candidate, Movie, MovieId, Recommendation, RecommendationResult, ScoringWeights},
    services::{embedding::EmbeddingProvider, retriever::SimilarityRetriever},
};

/// Generates movie recommendations from free-text prompts
///
/// Each call embeds the prompt, retrieves one page of nearest movies and
/// re-ranks that page by a blended score of similarity, rating and popularity.
/// Pages never overlap: blending only reorders movies within a page.
pub struct RecommendationService {
    embedder: Arc<dyn EmbeddingProvider>,
    catalog: Arc<dyn CatalogStore>,
    retriever: SimilarityRetriever,
    weights: ScoringWeights,
    max_page_size: u32,
}

impl RecommendationService {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        catalog: Arc<dyn CatalogStore>,
        weights: ScoringWeights,
        max_page_size: u32,
    ) -> Self {
        let retriever = SimilarityRetriever::new(catalog.clone(), embedder.model());
        Self {
            embedder,
            catalog,
            retriever,
            weights,
            max_page_size,
        }
    }

    fn check_page(&self, page: u32, page_size: u32) -> AppResult<()> {
        if page == 0 {
            return Err(AppError::InvalidInput("Page numbers start at 1".to_string()));
        }
        if page_size == 0 || page_size > self.max_page_size {
            return Err(AppError::InvalidInput(format!(
                "Page size must be between 1 and {}",
                self.max_page_size
            )));
        }
        Ok(())
    }

    /// Recommends movies for a prompt, one page at a time
    pub async fn recommend(
        &self,
        prompt: &str,
        page: u32,
        page_size: u32,
    ) -> AppResult<RecommendationResult> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::InvalidInput("Prompt cannot be empty".to_string()));
        }
        self.check_page(page, page_size)?;

        let query = self.embedder.embed(prompt).await?;
        let candidates = self.retriever.retrieve(&query, page, page_size, &[]).await?;
        let items = self.rank(candidates);

        tracing::info!(
            prompt_len = prompt.len(),
            page,
            page_size,
            results = items.len(),
            provider = self.embedder.name(),
            "Recommendations generated"
        );

        Ok(RecommendationResult {
            prompt: prompt.to_string(),
            page,
            page_size,
            items,
        })
    }

    /// Looks up a single movie
    pub async fn get_movie(&self, movie_id: MovieId) -> AppResult<Movie> {
        self.catalog
            .find_movie(movie_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))
    }

    /// Movies closest to `movie_id`, seeded by its stored embedding
    pub async fn get_similar(&self, movie_id: MovieId, limit: u32) -> AppResult<Vec<Recommendation>> {
        self.get_similar_page(movie_id, 1, limit).await
    }

    /// Paginated variant of [`Self::get_similar`]
    ///
    /// Results follow the retrieval order and never include `movie_id` itself.
    /// A movie that has not been embedded yet has no similar movies.
    pub async fn get_similar_page(
        &self,
        movie_id: MovieId,
        page: u32,
        page_size: u32,
    ) -> AppResult<Vec<Recommendation>> {
        self.check_page(page, page_size)?;
        self.get_movie(movie_id).await?;

        let Some(seed) = self
            .catalog
            .stored_embedding(movie_id, self.retriever.model())
            .await?
        else {
            tracing::debug!(movie_id, "Movie has no embedding, no similar movies");
            return Ok(Vec::new());
        };

        let candidates = self
            .retriever
            .retrieve(&seed, page, page_size, &[movie_id])
            .await?;

        Ok(candidates
            .into_iter()
            .map(|c| self.to_recommendation(c))
            .collect())
    }

    fn to_recommendation(&self, candidate: Candidate) -> Recommendation {
        let score = self.weights.score(&candidate.movie, candidate.distance);
        Recommendation {
            similarity: ScoringWeights::similarity(candidate.distance),
            distance: candidate.distance,
            score,
            movie: candidate.movie,
        }
    }

    /// Scores a page and orders it by blended score, keeping retrieval order on ties
    fn rank(&self, candidates: Vec<Candidate>) -> Vec<Recommendation> {
        let mut items: Vec<Recommendation> = candidates
            .into_iter()
            .map(|c| self.to_recommendation(c))
            .collect();
        items.sort_by(|a, b| b.score.total_cmp(&a.score));
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::catalog::MockCatalogStore;
    use crate::models::{EmbeddingModel, ScoreMetric};
    use crate::services::embedding::MockEmbeddingProvider;

    const MODEL: EmbeddingModel = EmbeddingModel::Small3;

    fn embedder(expected_calls: usize) -> MockEmbeddingProvider {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_model().return_const(MODEL);
        embedder.expect_name().return_const("mock");
        embedder
            .expect_embed()
            .times(expected_calls)
            .returning(|_| Ok(vec![0.5; MODEL.dimensions()]));
        embedder
    }

    fn candidate(id: MovieId, votes: i64, rating: f64, distance: f64) -> Candidate {
        let mut movie = Movie::new(id, format!("Movie {}", id));
        movie.vote_count = votes;
        movie.vote_average = rating;
        Candidate { movie, distance }
    }

    fn service(
        embedder: MockEmbeddingProvider,
        catalog: MockCatalogStore,
        metric: ScoreMetric,
    ) -> RecommendationService {
        RecommendationService::new(Arc::new(embedder), Arc::new(catalog), metric.weights(), 50)
    }

    #[tokio::test]
    async fn test_empty_prompt_makes_no_external_calls() {
        let mut catalog = MockCatalogStore::new();
        catalog.expect_nearest().times(0);
        let service = service(embedder(0), catalog, ScoreMetric::V3);

        for prompt in ["", "   ", "\n\t"] {
            let result = service.recommend(prompt, 1, 20).await;
            assert!(matches!(result, Err(AppError::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn test_page_size_bounds() {
        let mut catalog = MockCatalogStore::new();
        catalog.expect_nearest().times(0);
        let service = service(embedder(0), catalog, ScoreMetric::V3);

        assert!(service.recommend("space", 1, 0).await.is_err());
        assert!(service.recommend("space", 1, 51).await.is_err());
        assert!(service.recommend("space", 0, 10).await.is_err());
    }

    #[tokio::test]
    async fn test_blended_score_reorders_within_page() {
        let mut catalog = MockCatalogStore::new();
        catalog.expect_nearest().returning(|_, _, _, _, _| {
            Ok(vec![
                candidate(1, 0, 2.0, 0.10),
                candidate(2, 100_000, 9.0, 0.12),
            ])
        });
        let service = service(embedder(1), catalog, ScoreMetric::V2);

        let result = service.recommend("crowd pleaser", 1, 2).await.unwrap();
        assert_eq!(result.movie_ids(), vec![2, 1]);
        assert!(result.items[0].score > result.items[1].score);
        assert!((result.items[1].similarity - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_equal_scores_keep_retrieval_order() {
        let mut catalog = MockCatalogStore::new();
        catalog.expect_nearest().returning(|_, _, _, _, _| {
            Ok(vec![
                candidate(1, 1000, 7.0, 0.1),
                candidate(2, 500, 7.0, 0.1),
            ])
        });
        let service = service(embedder(1), catalog, ScoreMetric::V1);

        let result = service.recommend("anything", 1, 2).await.unwrap();
        assert_eq!(result.movie_ids(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_model().return_const(MODEL);
        embedder
            .expect_embed()
            .returning(|_| Err(AppError::EmbeddingService("timeout".to_string())));
        let mut catalog = MockCatalogStore::new();
        catalog.expect_nearest().times(0);
        let service = service(embedder, catalog, ScoreMetric::V3);

        let result = service.recommend("anything", 1, 5).await;
        assert!(matches!(result, Err(AppError::EmbeddingService(_))));
    }

    #[tokio::test]
    async fn test_get_movie_not_found() {
        let mut catalog = MockCatalogStore::new();
        catalog.expect_find_movie().returning(|_| Ok(None));
        let service = service(embedder(0), catalog, ScoreMetric::V3);

        assert!(matches!(
            service.get_movie(404).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_similar_excludes_seed_and_skips_embedder() {
        let mut catalog = MockCatalogStore::new();
        catalog
            .expect_find_movie()
            .returning(|id| Ok(Some(Movie::new(id, "Seed"))));
        catalog
            .expect_stored_embedding()
            .returning(|_, _| Ok(Some(vec![0.2; MODEL.dimensions()])));
        catalog
            .expect_nearest()
            .withf(|_, _, exclude, offset, limit| exclude.to_vec() == vec![7] && *offset == 0 && *limit == 4)
            .times(1)
            .returning(|_, _, _, _, _| Ok(vec![candidate(8, 10, 6.0, 0.2)]));
        let service = service(embedder(0), catalog, ScoreMetric::V3);

        let similar = service.get_similar(7, 4).await.unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].movie.movie_id, 8);
    }

    #[tokio::test]
    async fn test_get_similar_without_embedding_is_empty() {
        let mut catalog = MockCatalogStore::new();
        catalog
            .expect_find_movie()
            .returning(|id| Ok(Some(Movie::new(id, "Fresh"))));
        catalog.expect_stored_embedding().returning(|_, _| Ok(None));
        catalog.expect_nearest().times(0);
        let service = service(embedder(0), catalog, ScoreMetric::V3);

        assert!(service.get_similar(3, 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_similar_unknown_movie() {
        let mut catalog = MockCatalogStore::new();
        catalog.expect_find_movie().returning(|_| Ok(None));
        catalog.expect_stored_embedding().times(0);
        let service = service(embedder(0), catalog, ScoreMetric::V3);

        assert!(matches!(
            service.get_similar(3, 4).await,
            Err(AppError::NotFound(_))
        ));
    }
}
