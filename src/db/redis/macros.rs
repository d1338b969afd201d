/// A macro to simplify caching logic using Redis.
///
/// Checks the cache for `$key`. On a hit the cached value is returned; on a
/// miss (or an unreachable cache) the block is awaited, its value written in
/// the background with `$ttl` seconds to live, and returned.
///
/// The optional `keep_if = |value| ...` predicate decides whether a computed
/// value is worth caching; providers use it so that an empty "no data"
/// answer from a failing upstream is not pinned for the whole TTL.
///
/// # Example
/// ```rust,ignore
/// let items: Vec<MediaItem> = cached!(self.cache, key, SEARCH_CACHE_TTL, async move {
///     self.fetch_search(query).await
/// }, keep_if = |items: &Vec<MediaItem>| !items.is_empty())?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {
        $crate::cached!($cache, $key, $ttl, $block, keep_if = |_| true)
    };
    ($cache:expr, $key:expr, $ttl:expr, $block:expr, keep_if = $keep:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.get_or_miss(&key).await {
            Ok(cached)
        } else {
            let computed: $crate::error::AppResult<_> = $block.await;
            match computed {
                Ok(value) => {
                    if ($keep)(&value) {
                        $cache.set_in_background(&key, &value, $ttl);
                    }
                    Ok(value)
                }
                Err(e) => Err(e),
            }
        }
    }};
}
