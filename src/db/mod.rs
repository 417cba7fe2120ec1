pub mod catalog;
pub mod memory;
pub mod postgres;
pub mod redis;

pub use catalog::{CatalogStore, CatalogWriter};
pub use memory::InMemoryCatalog;
pub use postgres::{create_pool, PgCatalog};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
