use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feyris_api::{
    config::Config,
    db::{create_pool, create_redis_client, Cache, CacheWriterHandle, LibraryStore, MemoryStore, PgStore},
    middleware::SupabaseAuth,
    routes::{cors_layer, create_router, AppState},
    services::providers::{
        Catalog, CatalogProvider, GoogleBooksProvider, IgdbProvider, JikanProvider, TmdbProvider,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feyris_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let store: Arc<dyn LibraryStore> = if config.uses_memory_store() {
        tracing::warn!("DATABASE_URL=memory, library data will not survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        let pool = create_pool(&config.database_url).await?;
        Arc::new(PgStore::new(pool))
    };

    let (cache, cache_handle) = connect_cache(&config).await?;
    let catalog = register_providers(&config, &cache);

    tracing::info!(
        store = store.name(),
        cache_enabled = cache.is_enabled(),
        providers = ?catalog.provider_names(),
        "Services initialized"
    );

    let state = Arc::new(AppState {
        store,
        auth: Arc::new(SupabaseAuth::new(
            config.auth_url.clone(),
            config.auth_anon_key.clone(),
        )),
        catalog,
    });

    let app = create_router(state).layer(cors_layer(config.cors_origin.as_deref()));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Flush queued cache writes before exiting
    cache_handle.shutdown().await;
    tracing::info!("Server shutdown complete");

    Ok(())
}

async fn connect_cache(config: &Config) -> anyhow::Result<(Cache, CacheWriterHandle)> {
    match &config.redis_url {
        Some(url) => {
            let client = create_redis_client(url)?;
            Ok(Cache::new(client).await)
        }
        None => {
            tracing::warn!("REDIS_URL not set, provider responses will not be cached");
            Ok((Cache::disabled(), Cache::disabled_handle()))
        }
    }
}

/// Registers every provider whose credentials are configured
fn register_providers(config: &Config, cache: &Cache) -> Catalog {
    let mut providers: Vec<Arc<dyn CatalogProvider>> = Vec::new();

    match &config.tmdb_api_key {
        Some(key) => providers.push(Arc::new(TmdbProvider::new(
            cache.clone(),
            key.clone(),
            config.tmdb_api_url.clone(),
        ))),
        None => tracing::warn!("TMDB_API_KEY not set, films and TV are unavailable"),
    }

    providers.push(Arc::new(JikanProvider::new(
        cache.clone(),
        config.jikan_api_url.clone(),
    )));

    match (&config.igdb_client_id, &config.igdb_client_secret) {
        (Some(id), Some(secret)) => providers.push(Arc::new(IgdbProvider::new(
            cache.clone(),
            id.clone(),
            secret.clone(),
            config.igdb_api_url.clone(),
            config.twitch_token_url.clone(),
        ))),
        _ => tracing::warn!("IGDB credentials not set, games are unavailable"),
    }

    providers.push(Arc::new(GoogleBooksProvider::new(
        cache.clone(),
        config.google_books_api_key.clone(),
        config.google_books_api_url.clone(),
    )));

    Catalog::new(providers)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received terminate signal, shutting down"),
    }
}
