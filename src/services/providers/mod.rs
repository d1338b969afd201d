/// Catalog data provider abstraction
///
/// This module provides a pluggable architecture for the third-party catalogs
/// (TMDB, Jikan, IGDB, Google Books). Each provider implements search,
/// trending lists, and detail lookup for the media types it serves, always
/// returning normalized `MediaItem`s.
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{MediaItem, MediaType, Source},
};

pub mod google_books;
pub mod igdb;
pub mod jikan;
pub mod tmdb;

pub use google_books::GoogleBooksProvider;
pub use igdb::IgdbProvider;
pub use jikan::JikanProvider;
pub use tmdb::TmdbProvider;

pub(crate) const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
pub(crate) const TRENDING_CACHE_TTL: u64 = 3600; // 1 hour
pub(crate) const DETAILS_CACHE_TTL: u64 = 86400; // 1 day
pub(crate) const PAGE_SIZE: usize = 20;

/// Trait for catalog providers
///
/// A non-OK upstream status is "no data" (`Ok(vec![])` / `Ok(None)`), never an
/// error; `Err` is reserved for transport and decode failures, which callers
/// fanning out across providers drop without failing the request.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Search titles of `media_type` by free text
    async fn search(&self, query: &str, media_type: MediaType) -> AppResult<Vec<MediaItem>>;

    /// Currently popular titles of `media_type`, for carousels and candidates
    async fn trending(&self, media_type: MediaType) -> AppResult<Vec<MediaItem>>;

    /// Full record for one title, `None` when the provider does not know it
    async fn details(&self, external_id: &str, media_type: MediaType)
        -> AppResult<Option<MediaItem>>;

    /// Catalog this provider's ids belong to
    fn source(&self) -> Source;

    /// Media types this provider can answer for
    fn media_types(&self) -> Vec<MediaType>;

    /// Provider name for logging and cache keys
    fn name(&self) -> &'static str;
}

/// The set of providers registered at startup
#[derive(Clone, Default)]
pub struct Catalog {
    providers: Vec<Arc<dyn CatalogProvider>>,
}

impl Catalog {
    pub fn new(providers: Vec<Arc<dyn CatalogProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// First registered provider serving `media_type`
    pub fn for_type(&self, media_type: MediaType) -> Option<Arc<dyn CatalogProvider>> {
        self.providers
            .iter()
            .find(|p| p.media_types().contains(&media_type))
            .cloned()
    }

    /// First registered provider whose ids come from `source`
    pub fn for_source(&self, source: Source) -> Option<Arc<dyn CatalogProvider>> {
        self.providers
            .iter()
            .find(|p| p.source() == source)
            .cloned()
    }

    /// Every (provider, type) pair to query, restricted to `filter` when given
    pub fn targets(&self, filter: Option<MediaType>) -> Vec<(Arc<dyn CatalogProvider>, MediaType)> {
        self.providers
            .iter()
            .flat_map(|p| {
                p.media_types()
                    .into_iter()
                    .filter(move |t| filter.map_or(true, |f| f == *t))
                    .map(move |t| (Arc::clone(p), t))
            })
            .collect()
    }
}

/// Non-OK upstream response: logged, then treated as "no data"
pub(crate) async fn log_unsuccessful(provider: &'static str, response: reqwest::Response) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        provider = provider,
        status = %status,
        body = %body.chars().take(200).collect::<String>(),
        "Provider returned non-success status"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_provider(source: Source, types: Vec<MediaType>, name: &'static str) -> MockCatalogProvider {
        let mut provider = MockCatalogProvider::new();
        provider.expect_source().return_const(source);
        provider.expect_media_types().return_const(types);
        provider.expect_name().return_const(name);
        provider
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Arc::new(mock_provider(Source::Tmdb, vec![MediaType::Film, MediaType::Tv], "tmdb")),
            Arc::new(mock_provider(Source::Mal, vec![MediaType::Anime, MediaType::Manga], "jikan")),
        ])
    }

    #[test]
    fn test_targets_all_types() {
        let targets = catalog().targets(None);
        let types: Vec<MediaType> = targets.iter().map(|(_, t)| *t).collect();
        assert_eq!(
            types,
            vec![MediaType::Film, MediaType::Tv, MediaType::Anime, MediaType::Manga]
        );
    }

    #[test]
    fn test_targets_filtered() {
        let targets = catalog().targets(Some(MediaType::Manga));
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].0.name(), "jikan");
    }

    #[test]
    fn test_lookup_by_type_and_source() {
        let catalog = catalog();
        assert_eq!(catalog.for_type(MediaType::Tv).unwrap().name(), "tmdb");
        assert_eq!(catalog.for_source(Source::Mal).unwrap().name(), "jikan");
        assert!(catalog.for_type(MediaType::Game).is_none());
        assert!(catalog.for_source(Source::Igdb).is_none());
        assert_eq!(catalog.provider_names(), vec!["tmdb", "jikan"]);
    }
}
