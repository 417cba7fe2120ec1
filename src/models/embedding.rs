use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Embedding models supported by the provider, each stored in its own column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbeddingModel {
    #[serde(rename = "text-embedding-ada-002")]
    Ada002,
    #[serde(rename = "text-embedding-3-small")]
    Small3,
    #[default]
    #[serde(rename = "text-embedding-3-large")]
    Large3,
}

impl EmbeddingModel {
    /// Model name sent to the provider
    pub fn name(&self) -> &'static str {
        match self {
            EmbeddingModel::Ada002 => "text-embedding-ada-002",
            EmbeddingModel::Small3 => "text-embedding-3-small",
            EmbeddingModel::Large3 => "text-embedding-3-large",
        }
    }

    /// Fixed vector length produced by the model
    pub fn dimensions(&self) -> usize {
        match self {
            EmbeddingModel::Ada002 | EmbeddingModel::Small3 => 1536,
            EmbeddingModel::Large3 => 3072,
        }
    }

    /// Column of `movie_embedding_openai` holding this model's vectors
    pub fn column(&self) -> &'static str {
        match self {
            EmbeddingModel::Ada002 => "embedding_ada_002",
            EmbeddingModel::Small3 => "embedding_3_small",
            EmbeddingModel::Large3 => "embedding_3_large",
        }
    }
}

impl Display for EmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
