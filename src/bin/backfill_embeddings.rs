use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use movie_recs_api::{
    config::Config,
    db::{create_pool, PgCatalog},
    services::{EmbeddingBackfill, OpenAiEmbedder},
};

/// Embeds every catalog movie that has no vector for the configured model yet
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    let catalog = Arc::new(PgCatalog::new(pool));

    let embedder = Arc::new(OpenAiEmbedder::new(
        &config.openai_api_key,
        &config.openai_api_url,
        config.embedding_model,
        Duration::from_secs(config.embedding_timeout_secs),
    )?);

    let report = EmbeddingBackfill::new(embedder, catalog, config.backfill_batch_size)
        .run()
        .await?;

    if report.failed_batches > 0 {
        tracing::warn!(
            failed_batches = report.failed_batches,
            failed_movies = ?report.failed_movies,
            "Some movies were not embedded; rerun to retry them"
        );
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
