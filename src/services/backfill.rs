use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::{
    db::CatalogWriter,
    error::{AppError, AppResult},
    models::{Movie, MovieId},
    services::embedding::EmbeddingProvider,
};

/// Outcome of a backfill run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    /// Movies whose embedding was written
    pub embedded: usize,
    /// Batches with at least one movie left unembedded
    pub failed_batches: usize,
    pub failed_movies: Vec<MovieId>,
}

/// Generates embeddings for every catalog movie that does not have one yet
///
/// Movies are visited in ascending ID order, `batch_size` at a time, with one
/// provider call per batch. A failed provider call skips its batch and a failed
/// write skips only that movie; either way the run continues.
pub struct EmbeddingBackfill {
    embedder: Arc<dyn EmbeddingProvider>,
    writer: Arc<dyn CatalogWriter>,
    batch_size: u32,
}

impl EmbeddingBackfill {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        writer: Arc<dyn CatalogWriter>,
        batch_size: u32,
    ) -> Self {
        Self {
            embedder,
            writer,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn run(&self) -> AppResult<BackfillReport> {
        let model = self.embedder.model();
        let start = Instant::now();
        let mut report = BackfillReport::default();
        let mut cursor: Option<MovieId> = None;
        let mut batch_index = 0usize;

        tracing::info!(model = %model, batch_size = self.batch_size, "Starting embedding backfill");

        loop {
            let batch = self
                .writer
                .movies_missing_embeddings(model, cursor, self.batch_size)
                .await?;
            let Some(last) = batch.last() else {
                break;
            };
            cursor = Some(last.movie_id);
            batch_index += 1;

            let failed_before = report.failed_movies.len();
            match self.embed_batch(&batch).await {
                Ok(embeddings) => {
                    self.store_batch(&batch, &embeddings, &mut report).await;
                }
                Err(e) => {
                    tracing::error!(batch = batch_index, error = %e, "Backfill batch failed");
                    report
                        .failed_movies
                        .extend(batch.iter().map(|m| m.movie_id));
                }
            }

            let failed = report.failed_movies.len() - failed_before;
            if failed > 0 {
                report.failed_batches += 1;
            }
            tracing::info!(
                batch = batch_index,
                movies = batch.len(),
                failed,
                total = report.embedded,
                "Backfill batch completed"
            );
        }

        tracing::info!(
            embedded = report.embedded,
            failed_batches = report.failed_batches,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Embedding backfill finished"
        );

        Ok(report)
    }

    async fn embed_batch(&self, batch: &[Movie]) -> AppResult<Vec<Vec<f32>>> {
        let documents: Vec<String> = batch.iter().map(Movie::embedding_document).collect();
        let embeddings = self.embedder.embed_batch(&documents).await?;

        if embeddings.len() != batch.len() {
            return Err(AppError::EmbeddingFormat(format!(
                "provider returned {} embeddings for {} movies",
                embeddings.len(),
                batch.len()
            )));
        }
        Ok(embeddings)
    }

    /// Writes each vector on its own; a failed write only fails that movie
    async fn store_batch(
        &self,
        batch: &[Movie],
        embeddings: &[Vec<f32>],
        report: &mut BackfillReport,
    ) {
        let model = self.embedder.model();
        for (movie, embedding) in batch.iter().zip(embeddings) {
            match self
                .writer
                .store_embedding(movie.movie_id, model, embedding)
                .await
            {
                Ok(()) => report.embedded += 1,
                Err(e) => {
                    tracing::warn!(movie_id = movie.movie_id, error = %e, "Failed to store embedding");
                    report.failed_movies.push(movie.movie_id);
                }
            }
        }
    }
}
