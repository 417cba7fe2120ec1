use axum::{http::StatusCode, middleware, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    models::{MovieId, Recommendation},
    services::RecommendationService,
};

pub mod movies;
pub mod recommendations;

/// State shared by all handlers
pub struct AppState {
    pub recommender: Arc<RecommendationService>,
    /// Page size used when a request does not specify one
    pub default_page_size: u32,
}

/// Movie summary returned in result lists
#[derive(Debug, Serialize)]
pub struct MovieSummary {
    pub movie_id: MovieId,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub score: f64,
}

impl From<Recommendation> for MovieSummary {
    fn from(rec: Recommendation) -> Self {
        Self {
            movie_id: rec.movie.movie_id,
            title: rec.movie.english_title,
            poster_path: rec.movie.poster_path,
            vote_average: rec.movie.vote_average,
            vote_count: rec.movie.vote_count,
            score: rec.score,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", get(recommendations::recommend))
        .route("/movies/:movie_id", get(movies::get_movie))
        .route("/movies/:movie_id/similar", get(movies::get_similar))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
