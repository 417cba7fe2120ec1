pub mod embedding;
pub mod movie;
pub mod recommendation;
pub mod scoring;

pub use embedding::EmbeddingModel;
pub use movie::{Candidate, Movie, MovieId};
pub use recommendation::{Recommendation, RecommendationResult};
pub use scoring::{ScoreMetric, ScoringWeights};
