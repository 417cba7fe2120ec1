use serde::{Deserialize, Serialize};

use super::Movie;

/// Named weight presets for the blended score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMetric {
    /// Pure content similarity
    V1,
    /// Similarity with uncapped rating and popularity boosts
    V2,
    /// Similarity-dominant with a capped popularity term
    #[default]
    V3,
}

impl ScoreMetric {
    pub fn weights(&self) -> ScoringWeights {
        match self {
            ScoreMetric::V1 => ScoringWeights {
                similarity: 1.0,
                rating: 0.0,
                popularity: 0.0,
                popularity_cap: None,
            },
            ScoreMetric::V2 => ScoringWeights {
                similarity: 0.8,
                rating: 0.2,
                popularity: 0.1,
                popularity_cap: None,
            },
            ScoreMetric::V3 => ScoringWeights {
                similarity: 0.9,
                rating: 0.07,
                popularity: 0.03,
                popularity_cap: Some(10.0),
            },
        }
    }
}

/// Weights combining similarity, rating and popularity into one rank score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub similarity: f64,
    pub rating: f64,
    pub popularity: f64,
    /// Upper bound applied to the popularity signal
    pub popularity_cap: Option<f64>,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoreMetric::default().weights()
    }
}

impl ScoringWeights {
    /// Similarity in [0, 1] derived from a cosine distance
    pub fn similarity(distance: f64) -> f64 {
        if distance.is_nan() {
            return 0.0;
        }
        (1.0 - distance).clamp(0.0, 1.0)
    }

    /// `log10(1 + vote_count)`, capped when a cap is configured
    pub fn popularity_signal(&self, vote_count: i64) -> f64 {
        let signal = (1.0 + vote_count.max(0) as f64).log10();
        match self.popularity_cap {
            Some(cap) => signal.min(cap),
            None => signal,
        }
    }

    /// Blended score of a movie at the given cosine distance from the query
    pub fn score(&self, movie: &Movie, distance: f64) -> f64 {
        let rating = (movie.vote_average / 10.0).clamp(0.0, 1.0);
        self.similarity * Self::similarity(distance)
            + self.rating * rating
            + self.popularity * self.popularity_signal(movie.vote_count)
    }
}
