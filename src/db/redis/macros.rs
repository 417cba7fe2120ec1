/// Read-through caching around an async computation.
///
/// Returns the cached value when `$key` is present. Otherwise awaits `$block`,
/// queues the result for a background write with the given TTL, and returns it.
/// Errors from the cache lookup or from `$block` are propagated with `?`.
///
/// `$cache` must provide `get_from_cache(&key)` and
/// `set_in_background(&key, &value, ttl)`.
///
/// # Example
/// ```rust,ignore
/// let embedding: Vec<f32> = cached!(
///     self.cache,
///     CacheKey::embedding(model, prompt),
///     self.ttl_secs,
///     async { self.inner.embed(prompt).await }
/// )?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get_from_cache(&key).await? {
            tracing::debug!(key = %key, "Cache hit");
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&key, &value, $ttl);
            Ok(value)
        }
    }};
}
