use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::MediaType;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Search {
        provider: &'static str,
        media_type: MediaType,
        query: String,
    },
    Trending {
        provider: &'static str,
        media_type: MediaType,
    },
    Details {
        provider: &'static str,
        media_type: MediaType,
        external_id: String,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Search {
                provider,
                media_type,
                query,
            } => write!(
                f,
                "search:{}:{}:{}",
                provider,
                media_type,
                query.trim().to_lowercase()
            ),
            CacheKey::Trending {
                provider,
                media_type,
            } => write!(f, "trending:{}:{}", provider, media_type),
            CacheKey::Details {
                provider,
                media_type,
                external_id,
            } => write!(f, "details:{}:{}:{}", provider, media_type, external_id),
        }
    }
}

/// Creates a Redis client for caching
///
/// `Client::open` only validates the URL; connections are made lazily.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

#[derive(Clone)]
struct CacheBackend {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Cache handler for storing and retrieving data from Redis
///
/// A disabled cache (no Redis configured) misses on every read and drops
/// every write.
#[derive(Clone)]
pub struct Cache {
    backend: Option<CacheBackend>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl CacheWriterHandle {
    /// Initiates a graceful shutdown of the cache writer
    ///
    /// Sends a shutdown signal to the writer task, which flushes all pending
    /// writes to Redis before exiting.
    pub async fn shutdown(self) {
        if let Some(tx) = self.shutdown_tx {
            let _ = tx.send(()).await;
            tracing::info!("Cache writer shutdown signal sent");
        }
    }
}

impl Cache {
    /// Creates a new Cache instance with an async write background task
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            backend: Some(CacheBackend {
                redis_client,
                write_tx,
            }),
        };

        let handle = CacheWriterHandle {
            shutdown_tx: Some(shutdown_tx),
        };

        (cache, handle)
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    /// No-op handle paired with a disabled cache
    pub fn disabled_handle() -> CacheWriterHandle {
        CacheWriterHandle { shutdown_tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Background task that processes cache write messages
    ///
    /// On shutdown signal, flushes all remaining messages before exiting.
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Cache writer shutting down, flushing remaining writes");

                    // Every sender may still be alive, so drain what is queued right now
                    while let Ok(msg) = write_rx.try_recv() {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        }
                    }

                    tracing::info!("Cache writer task stopped");
                    break;
                }
            }
        }
    }

    /// Writes a single message to Redis
    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `Ok(None)` on a miss or when caching is disabled.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let Some(backend) = &self.backend else {
            return Ok(None);
        };

        let mut conn = backend.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Like `get_from_cache`, but a failing cache is logged and reported as a miss
    pub async fn get_or_miss<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        match self.get_from_cache(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Stores a value in the cache asynchronously without blocking
    ///
    /// The value is serialized here and handed to the writer task; this
    /// returns before Redis has seen it.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let Some(backend) = &self.backend else {
            return;
        };

        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl,
        };

        if let Err(e) = backend.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display_search_lowercase() {
        let key = CacheKey::Search {
            provider: "tmdb",
            media_type: MediaType::Film,
            query: "  The Matrix ".to_string(),
        };
        assert_eq!(key.to_string(), "search:tmdb:film:the matrix");
    }

    #[test]
    fn test_cache_key_display_trending() {
        let key = CacheKey::Trending {
            provider: "jikan",
            media_type: MediaType::Manga,
        };
        assert_eq!(key.to_string(), "trending:jikan:manga");
    }

    #[test]
    fn test_cache_key_display_details() {
        let key = CacheKey::Details {
            provider: "igdb",
            media_type: MediaType::Game,
            external_id: "1942".to_string(),
        };
        assert_eq!(key.to_string(), "details:igdb:game:1942");
    }

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let cache = Cache::disabled();
        let key = CacheKey::Trending {
            provider: "tmdb",
            media_type: MediaType::Tv,
        };

        cache.set_in_background(&key, &vec!["a".to_string()], 60);
        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();

        assert!(!cache.is_enabled());
        assert_eq!(retrieved, None);
        Cache::disabled_handle().shutdown().await;
    }

    #[tokio::test]
    async fn test_unreachable_redis_degrades_to_miss() {
        // Nothing listens on port 1, so the connection attempt fails fast
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, handle) = Cache::new(client).await;
        let key = CacheKey::Trending {
            provider: "tmdb",
            media_type: MediaType::Film,
        };

        let retrieved: Option<String> = cache.get_or_miss(&key).await;

        assert_eq!(retrieved, None);
        handle.shutdown().await;
    }
}
