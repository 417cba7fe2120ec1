use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use movie_recs_api::{
    config::Config,
    db::{create_pool, create_redis_client, Cache, CatalogStore, PgCatalog},
    routes::{create_router, AppState},
    services::{CachedEmbedder, EmbeddingProvider, OpenAiEmbedder, RecommendationService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    let catalog: Arc<dyn CatalogStore> = Arc::new(PgCatalog::new(pool));

    let openai: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbedder::new(
        &config.openai_api_key,
        &config.openai_api_url,
        config.embedding_model,
        Duration::from_secs(config.embedding_timeout_secs),
    )?);

    let mut cache_writer = None;
    let embedder: Arc<dyn EmbeddingProvider> = match &config.redis_url {
        Some(redis_url) if config.embedding_cache_enabled() => {
            let (cache, handle) = Cache::connect(create_redis_client(redis_url)?).await?;
            cache_writer = Some(handle);
            tracing::info!(ttl_secs = config.embedding_cache_ttl_secs, "Prompt embedding cache enabled");
            Arc::new(CachedEmbedder::new(openai, cache, config.embedding_cache_ttl_secs))
        }
        _ => openai,
    };

    let weights = config.scoring_weights();
    tracing::info!(
        model = %config.embedding_model,
        score_metric = ?config.score_metric,
        ?weights,
        "Recommendation service configured"
    );

    let recommender = RecommendationService::new(embedder, catalog, weights, config.max_page_size);
    let state = Arc::new(AppState {
        recommender: Arc::new(recommender),
        default_page_size: config.default_page_size,
    });

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
