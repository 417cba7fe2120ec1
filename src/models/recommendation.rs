use serde::Serialize;

use super::{Movie, MovieId};

/// A ranked movie together with the signals that ranked it
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub movie: Movie,
    /// Cosine distance between the query vector and the movie's embedding
    pub distance: f64,
    /// `1 - distance`, clamped to [0, 1]
    pub similarity: f64,
    /// Blended score used for the final order within the page
    pub score: f64,
}

/// One page of recommendations for a prompt
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendationResult {
    pub prompt: String,
    pub page: u32,
    pub page_size: u32,
    pub items: Vec<Recommendation>,
}

impl RecommendationResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn movie_ids(&self) -> Vec<MovieId> {
        self.items.iter().map(|r| r.movie.movie_id).collect()
    }
}
