pub mod backfill;
pub mod embedding;
pub mod recommendations;
pub mod retriever;

pub use backfill::{BackfillReport, EmbeddingBackfill};
pub use embedding::{CachedEmbedder, EmbeddingProvider, OpenAiEmbedder};
pub use recommendations::RecommendationService;
pub use retriever::SimilarityRetriever;
