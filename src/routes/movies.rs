use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Movie, MovieId},
    routes::{AppState, MovieSummary},
};

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SimilarResponse {
    pub movie_id: MovieId,
    pub movies: Vec<MovieSummary>,
}

/// Handler for movie details
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    path: Result<Path<MovieId>, PathRejection>,
) -> AppResult<Json<Movie>> {
    let Path(movie_id) = path?;
    let movie = state.recommender.get_movie(movie_id).await?;
    Ok(Json(movie))
}

/// Handler for movies similar to a given movie
pub async fn get_similar(
    State(state): State<Arc<AppState>>,
    path: Result<Path<MovieId>, PathRejection>,
    query: Result<Query<SimilarQuery>, QueryRejection>,
) -> AppResult<Json<SimilarResponse>> {
    let Path(movie_id) = path?;
    let Query(params) = query?;
    let limit = params.limit.unwrap_or(state.default_page_size);
    let similar = state.recommender.get_similar(movie_id, limit).await?;

    Ok(Json(SimilarResponse {
        movie_id,
        movies: similar.into_iter().map(MovieSummary::from).collect(),
    }))
}
