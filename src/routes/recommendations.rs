use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    routes::{AppState, MovieSummary},
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    /// Missing prompts are rejected by the service like blank ones
    #[serde(default)]
    pub prompt: String,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub prompt: String,
    pub page: u32,
    pub page_size: u32,
    pub movies: Vec<MovieSummary>,
}

/// Handler for prompt-based recommendations
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> AppResult<Json<RecommendationResponse>> {
    let Query(params) = query?;
    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(state.default_page_size);

    tracing::info!(
        request_id = %request_id,
        page,
        page_size,
        "Processing recommendation request"
    );

    let result = state
        .recommender
        .recommend(&params.prompt, page, page_size)
        .await?;

    Ok(Json(RecommendationResponse {
        prompt: result.prompt,
        page: result.page,
        page_size: result.page_size,
        movies: result.items.into_iter().map(MovieSummary::from).collect(),
    }))
}
