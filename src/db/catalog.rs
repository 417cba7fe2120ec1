use crate::{
    error::AppResult,
    models::{Candidate, EmbeddingModel, Movie, MovieId},
};

/// Read access to the movie catalog
///
/// The recommendation path only ever reads through this trait, so any storage
/// backend (Postgres with pgvector, an in-memory fixture) can be injected.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Returns the `limit` movies starting at `offset` in the global similarity order
    ///
    /// The order is cosine distance ascending, then vote count descending, then
    /// movie ID ascending. Movies without an embedding for `model` and movies in
    /// `exclude` are never returned.
    async fn nearest(
        &self,
        model: EmbeddingModel,
        query: &[f32],
        exclude: &[MovieId],
        offset: u64,
        limit: u32,
    ) -> AppResult<Vec<Candidate>>;

    /// Looks up a single movie by ID
    async fn find_movie(&self, movie_id: MovieId) -> AppResult<Option<Movie>>;

    /// Returns the stored embedding of a movie for `model`, if one was generated
    async fn stored_embedding(
        &self,
        movie_id: MovieId,
        model: EmbeddingModel,
    ) -> AppResult<Option<Vec<f32>>>;
}

/// Write access used by the embedding backfill job
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogWriter: Send + Sync {
    /// Movies with no embedding for `model`, ordered by ID, strictly after `after`
    async fn movies_missing_embeddings(
        &self,
        model: EmbeddingModel,
        after: Option<MovieId>,
        limit: u32,
    ) -> AppResult<Vec<Movie>>;

    /// Inserts or replaces the embedding of a movie for `model`
    async fn store_embedding(
        &self,
        movie_id: MovieId,
        model: EmbeddingModel,
        embedding: &[f32],
    ) -> AppResult<()>;
}
