/// Google Books provider
///
/// Serves books. The API key is optional; without one requests share the
/// anonymous quota.
use reqwest::{Client as HttpClient, StatusCode};

use super::{
    log_unsuccessful, CatalogProvider, DETAILS_CACHE_TTL, PAGE_SIZE, SEARCH_CACHE_TTL,
    TRENDING_CACHE_TTL,
};
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::{
        google_books::{BookVolume, BookVolumes},
        MediaItem, MediaType, Source,
    },
    services::normalize::{decode_items, normalize_book},
};

const PROVIDER: &str = "google_books";
const TRENDING_QUERY: &str = "subject:fiction";

#[derive(Clone)]
pub struct GoogleBooksProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    cache: Cache,
}

impl GoogleBooksProvider {
    pub fn new(cache: Cache, api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    fn with_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }

    async fn fetch_volumes(&self, query: &str, order_by: &str) -> AppResult<Vec<MediaItem>> {
        let url = format!("{}/volumes", self.api_url);
        let max_results = PAGE_SIZE.to_string();

        let request = self.http_client.get(&url).query(&[
            ("q", query),
            ("maxResults", max_results.as_str()),
            ("orderBy", order_by),
            ("printType", "books"),
        ]);
        let response = self.with_key(request).send().await?;

        if !response.status().is_success() {
            log_unsuccessful(PROVIDER, response).await;
            return Ok(vec![]);
        }

        let volumes: BookVolumes = response.json().await?;
        Ok(decode_items::<BookVolume>(volumes.items, PROVIDER)
            .into_iter()
            .map(normalize_book)
            .collect())
    }
}

#[async_trait::async_trait]
impl CatalogProvider for GoogleBooksProvider {
    async fn search(&self, query: &str, media_type: MediaType) -> AppResult<Vec<MediaItem>> {
        cached!(
            self.cache,
            CacheKey::Search {
                provider: PROVIDER,
                media_type,
                query: query.to_string(),
            },
            SEARCH_CACHE_TTL,
            async move {
                let items = self.fetch_volumes(query, "relevance").await?;

                tracing::info!(
                    query = %query,
                    results = items.len(),
                    provider = PROVIDER,
                    "Title search completed"
                );

                Ok(items)
            },
            keep_if = |items: &Vec<MediaItem>| !items.is_empty()
        )
    }

    async fn trending(&self, media_type: MediaType) -> AppResult<Vec<MediaItem>> {
        cached!(
            self.cache,
            CacheKey::Trending {
                provider: PROVIDER,
                media_type,
            },
            TRENDING_CACHE_TTL,
            async move { self.fetch_volumes(TRENDING_QUERY, "newest").await },
            keep_if = |items: &Vec<MediaItem>| !items.is_empty()
        )
    }

    async fn details(
        &self,
        external_id: &str,
        media_type: MediaType,
    ) -> AppResult<Option<MediaItem>> {
        cached!(
            self.cache,
            CacheKey::Details {
                provider: PROVIDER,
                media_type,
                external_id: external_id.to_string(),
            },
            DETAILS_CACHE_TTL,
            async move {
                let url = format!("{}/volumes/{}", self.api_url, external_id);
                let response = self.with_key(self.http_client.get(&url)).send().await?;

                if response.status() == StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if !response.status().is_success() {
                    log_unsuccessful(PROVIDER, response).await;
                    return Ok(None);
                }

                let volume: BookVolume = response.json().await?;
                let item = normalize_book(volume);

                tracing::info!(media_id = %item.id, provider = PROVIDER, "Details fetched");

                Ok(Some(item))
            },
            keep_if = |item: &Option<MediaItem>| item.is_some()
        )
    }

    fn source(&self) -> Source {
        Source::Book
    }

    fn media_types(&self) -> Vec<MediaType> {
        vec![MediaType::Book]
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_metadata() {
        let provider = GoogleBooksProvider::new(
            Cache::disabled(),
            None,
            "http://test.local".to_string(),
        );
        assert_eq!(provider.source(), Source::Book);
        assert_eq!(provider.media_types(), vec![MediaType::Book]);
    }

    #[test]
    fn test_key_is_appended_when_configured() {
        let provider = GoogleBooksProvider::new(
            Cache::disabled(),
            Some("secret".to_string()),
            "http://test.local".to_string(),
        );
        let request = provider
            .with_key(provider.http_client.get("http://test.local/volumes"))
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("key=secret"));
    }
}
