/// TMDB provider
///
/// Serves films and TV. Search and trending use the list endpoints; details
/// append credits, videos, keywords and watch providers in one request.
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
        tmdb::{TmdbMovie, TmdbPage, TmdbTv},
        MediaItem, MediaType, Source,
    },
    services::normalize::{decode_items, normalize_tmdb_movie, normalize_tmdb_tv},
};

const PROVIDER: &str = "tmdb";
const DETAIL_APPENDS: &str = "credits,videos,keywords,watch/providers";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    /// TMDB path segment for a media type
    fn kind(media_type: MediaType) -> &'static str {
        match media_type {
            MediaType::Tv => "tv",
            _ => "movie",
        }
    }

    fn normalize_page(page: TmdbPage, media_type: MediaType) -> Vec<MediaItem> {
        let mut items: Vec<MediaItem> = match media_type {
            MediaType::Tv => decode_items::<TmdbTv>(page.results, PROVIDER)
                .into_iter()
                .map(normalize_tmdb_tv)
                .collect(),
            _ => decode_items::<TmdbMovie>(page.results, PROVIDER)
                .into_iter()
                .map(normalize_tmdb_movie)
                .collect(),
        };
        items.truncate(PAGE_SIZE);
        items
    }

    async fn fetch_page(
        &self,
        path: &str,
        params: &[(&str, &str)],
        media_type: MediaType,
    ) -> AppResult<Vec<MediaItem>> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            log_unsuccessful(PROVIDER, response).await;
            return Ok(vec![]);
        }

        let page: TmdbPage = response.json().await?;
        Ok(Self::normalize_page(page, media_type))
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
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
                let path = format!("/search/{}", Self::kind(media_type));
                let items = self
                    .fetch_page(&path, &[("query", query), ("include_adult", "false")], media_type)
                    .await?;

                tracing::info!(
                    query = %query,
                    media_type = %media_type,
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
            async move {
                let path = match media_type {
                    MediaType::Tv => "/tv/popular".to_string(),
                    _ => "/trending/movie/week".to_string(),
                };
                self.fetch_page(&path, &[], media_type).await
            },
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
                let url = format!("{}/{}/{}", self.api_url, Self::kind(media_type), external_id);

                let response = self
                    .http_client
                    .get(&url)
                    .query(&[
                        ("api_key", self.api_key.as_str()),
                        ("language", "en-US"),
                        ("append_to_response", DETAIL_APPENDS),
                    ])
                    .send()
                    .await?;

                if response.status() == StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if !response.status().is_success() {
                    log_unsuccessful(PROVIDER, response).await;
                    return Ok(None);
                }

                let item = match media_type {
                    MediaType::Tv => normalize_tmdb_tv(response.json::<TmdbTv>().await?),
                    _ => normalize_tmdb_movie(response.json::<TmdbMovie>().await?),
                };

                tracing::info!(
                    media_id = %item.id,
                    provider = PROVIDER,
                    "Details fetched"
                );

                Ok(Some(item))
            },
            keep_if = |item: &Option<MediaItem>| item.is_some()
        )
    }

    fn source(&self) -> Source {
        Source::Tmdb
    }

    fn media_types(&self) -> Vec<MediaType> {
        vec![MediaType::Film, MediaType::Tv]
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_path_segment() {
        assert_eq!(TmdbProvider::kind(MediaType::Tv), "tv");
        assert_eq!(TmdbProvider::kind(MediaType::Film), "movie");
    }

    #[test]
    fn test_normalize_page_by_type() {
        let page: TmdbPage = serde_json::from_value(json!({
            "results": [
                { "id": 1399, "name": "Game of Thrones" },
                { "id": 1400 }
            ]
        }))
        .unwrap();

        let items = TmdbProvider::normalize_page(page, MediaType::Tv);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "tmdb-1399");
        assert_eq!(items[0].media_type, MediaType::Tv);
    }

    #[test]
    fn test_provider_metadata() {
        let provider = TmdbProvider::new(
            Cache::disabled(),
            "key".to_string(),
            "http://test.local".to_string(),
        );
        assert_eq!(provider.name(), "tmdb");
        assert_eq!(provider.source(), Source::Tmdb);
        assert_eq!(provider.media_types(), vec![MediaType::Film, MediaType::Tv]);
    }
}
