use std::fmt::Display;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{AppError, AppResult};
use crate::models::EmbeddingModel;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Prompt embedding, addressed by model and trimmed prompt text
    Embedding { model: EmbeddingModel, text: String },
}

impl CacheKey {
    pub fn embedding(model: EmbeddingModel, text: &str) -> Self {
        CacheKey::Embedding {
            model,
            text: text.trim().to_string(),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Embedding { model, text } => write!(f, "embed:{}:{}", model.name(), text),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// A serialized value waiting to be written
struct PendingWrite {
    key: String,
    payload: String,
    ttl_secs: u64,
}

/// Redis-backed cache with fire-and-forget writes
///
/// Reads go straight to Redis. Writes are queued and applied by a single
/// background task, so filling the cache never delays the caller.
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
    writes: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the background writer, see [`CacheWriterHandle::shutdown`]
pub struct CacheWriterHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<usize>,
}

impl CacheWriterHandle {
    /// Stops the writer once every queued write has been applied
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        match self.task.await {
            Ok(flushed) => tracing::info!(flushed, "Cache writer stopped"),
            Err(e) => tracing::error!(error = %e, "Cache writer task failed"),
        }
    }
}

impl Cache {
    /// Connects to Redis and starts the background writer
    pub async fn connect(client: Client) -> AppResult<(Self, CacheWriterHandle)> {
        let conn = ConnectionManager::new(client).await?;
        let (writes, queue) = mpsc::unbounded_channel();
        let (stop, stopped) = oneshot::channel();

        let task = tokio::spawn(Self::run_writer(conn.clone(), queue, stopped));
        tracing::info!("Cache writer started");

        Ok((Self { conn, writes }, CacheWriterHandle { stop, task }))
    }

    /// Applies queued writes until stopped, then drains the queue
    ///
    /// Returns the number of writes flushed after the stop signal.
    async fn run_writer(
        mut conn: ConnectionManager,
        mut queue: mpsc::UnboundedReceiver<PendingWrite>,
        mut stopped: oneshot::Receiver<()>,
    ) -> usize {
        loop {
            tokio::select! {
                write = queue.recv() => match write {
                    Some(write) => {
                        Self::apply(&mut conn, write).await;
                    }
                    // Every Cache clone is gone, nothing can be queued anymore.
                    None => return 0,
                },
                _ = &mut stopped => break,
            }
        }

        queue.close();
        let mut flushed = 0;
        while let Some(write) = queue.recv().await {
            if Self::apply(&mut conn, write).await {
                flushed += 1;
            }
        }
        flushed
    }

    async fn apply(conn: &mut ConnectionManager, write: PendingWrite) -> bool {
        let result: redis::RedisResult<()> =
            conn.set_ex(&write.key, write.payload, write.ttl_secs).await;
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key = %write.key, error = %e, "Cache write failed");
                false
            }
        }
    }

    /// Retrieves and deserializes a cached value, `None` on a miss
    pub async fn get_from_cache<T: DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(key.to_string()).await?;

        payload
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Corrupt cache entry {}: {}", key, e))
                })
            })
            .transpose()
    }

    /// Queues a value for storage without waiting for Redis
    pub fn set_in_background<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T, ttl_secs: u64) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            payload,
            ttl_secs,
        };
        if self.writes.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer stopped, dropping write");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display_embedding() {
        let key = CacheKey::embedding(EmbeddingModel::Large3, "space opera with robots");
        assert_eq!(
            key.to_string(),
            "embed:text-embedding-3-large:space opera with robots"
        );
    }

    #[test]
    fn test_cache_key_trims_prompt() {
        let a = CacheKey::embedding(EmbeddingModel::Small3, "  heist movie\n");
        let b = CacheKey::embedding(EmbeddingModel::Small3, "heist movie");
        assert_eq!(a, b);
    }

    #[test]
    fn test_cache_key_keeps_case_and_model() {
        let lower = CacheKey::embedding(EmbeddingModel::Small3, "noir");
        let upper = CacheKey::embedding(EmbeddingModel::Small3, "NOIR");
        let other_model = CacheKey::embedding(EmbeddingModel::Ada002, "noir");
        assert_ne!(lower, upper);
        assert_ne!(lower, other_model);
    }

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    // The tests below need a running Redis server.

    #[tokio::test]
    #[ignore]
    async fn test_cache_miss() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, handle) = Cache::connect(client).await.unwrap();

        let key = CacheKey::embedding(EmbeddingModel::Small3, "nonexistent_prompt_12345");
        let retrieved: Option<Vec<f32>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, None);

        handle.shutdown().await;
    }

    #[tokio::test]
    #[ignore]
    async fn test_shutdown_flushes_queued_writes() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, handle) = Cache::connect(client.clone()).await.unwrap();

        let key = CacheKey::embedding(EmbeddingModel::Small3, "test_shutdown_prompt");
        let value = vec![0.25_f32, -0.5, 1.0];

        cache.set_in_background(&key, &value, 60);
        handle.shutdown().await;

        let retrieved: Option<Vec<f32>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key.to_string()).await.unwrap();
    }
}
