use serde::{Deserialize, Serialize};

/// TMDB movie identifier
pub type MovieId = i32;

/// A movie record from the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub movie_id: MovieId,
    pub english_title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Runtime in minutes
    pub runtime: Option<f64>,
    /// Average rating on a 0-10 scale
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i64,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
}

impl Movie {
    /// Creates a movie with only the required fields set
    pub fn new(movie_id: MovieId, english_title: impl Into<String>) -> Self {
        Self {
            movie_id,
            english_title: english_title.into(),
            original_title: None,
            overview: None,
            genres: Vec::new(),
            keywords: Vec::new(),
            runtime: None,
            vote_average: 0.0,
            vote_count: 0,
            poster_path: None,
            backdrop_path: None,
        }
    }

    /// Text sent to the embedding provider when indexing this movie
    pub fn embedding_document(&self) -> String {
        format!(
            "Create an embedding that captures the movie's genre and mood.\n\
             Title: {}\n\
             Genres: {}\n\
             Keywords: {}\n\
             Overview: {}",
            self.english_title,
            join_or_na(&self.genres),
            join_or_na(&self.keywords),
            self.overview
                .as_deref()
                .filter(|o| !o.trim().is_empty())
                .unwrap_or("No overview available."),
        )
    }
}

fn join_or_na(values: &[String]) -> String {
    if values.is_empty() {
        "N/A".to_string()
    } else {
        values.join(", ")
    }
}

/// A catalog entry matched by a similarity query, with its cosine distance to the query
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub movie: Movie,
    pub distance: f64,
}
