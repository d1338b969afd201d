/// Jikan (unofficial MyAnimeList API) provider
///
/// Serves anime and manga. No API key; Jikan rate-limits aggressively and
/// answers 429 when exceeded, which is treated like any other non-OK status.
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
        jikan::{JikanEntry, JikanItem, JikanList},
        MediaItem, MediaType, Source,
    },
    services::normalize::{decode_items, normalize_jikan},
};

const PROVIDER: &str = "jikan";

#[derive(Clone)]
pub struct JikanProvider {
    http_client: HttpClient,
    api_url: String,
    cache: Cache,
}

impl JikanProvider {
    pub fn new(cache: Cache, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            cache,
        }
    }

    fn kind(media_type: MediaType) -> &'static str {
        match media_type {
            MediaType::Manga => "manga",
            _ => "anime",
        }
    }

    /// Query for the trending list of each kind
    fn trending_filter(media_type: MediaType) -> &'static str {
        match media_type {
            MediaType::Manga => "bypopularity",
            _ => "airing",
        }
    }

    fn normalize_list(list: JikanList, media_type: MediaType) -> Vec<MediaItem> {
        let mut items: Vec<MediaItem> = decode_items::<JikanEntry>(list.data, PROVIDER)
            .into_iter()
            .map(|entry| normalize_jikan(entry, media_type))
            .collect();
        // Jikan repeats entries across pages when rankings shift mid-request
        let mut seen = std::collections::HashSet::new();
        items.retain(|item| seen.insert(item.id.clone()));
        items.truncate(PAGE_SIZE);
        items
    }

    async fn fetch_list(
        &self,
        path: &str,
        params: &[(&str, &str)],
        media_type: MediaType,
    ) -> AppResult<Vec<MediaItem>> {
        let url = format!("{}{}", self.api_url, path);
        let limit = PAGE_SIZE.to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[("limit", limit.as_str()), ("sfw", "true")])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            log_unsuccessful(PROVIDER, response).await;
            return Ok(vec![]);
        }

        let list: JikanList = response.json().await?;
        Ok(Self::normalize_list(list, media_type))
    }
}

#[async_trait::async_trait]
impl CatalogProvider for JikanProvider {
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
                let path = format!("/{}", Self::kind(media_type));
                let items = self.fetch_list(&path, &[("q", query)], media_type).await?;

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
                let path = format!("/top/{}", Self::kind(media_type));
                self.fetch_list(&path, &[("filter", Self::trending_filter(media_type))], media_type)
                    .await
            },
            keep_if = |items: &Vec<MediaItem>| !items.is_empty()
        )
    }

    async fn details(
        &self,
        external_id: &str,
        media_type: MediaType,
    ) -> AppResult<Option<MediaItem>> {
        if external_id.parse::<u64>().is_err() {
            return Ok(None);
        }

        cached!(
            self.cache,
            CacheKey::Details {
                provider: PROVIDER,
                media_type,
                external_id: external_id.to_string(),
            },
            DETAILS_CACHE_TTL,
            async move {
                let url = format!(
                    "{}/{}/{}/full",
                    self.api_url,
                    Self::kind(media_type),
                    external_id
                );

                let response = self.http_client.get(&url).send().await?;

                if response.status() == StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if !response.status().is_success() {
                    log_unsuccessful(PROVIDER, response).await;
                    return Ok(None);
                }

                let wrapper: JikanItem<JikanEntry> = response.json().await?;
                let item = normalize_jikan(wrapper.data, media_type);

                tracing::info!(media_id = %item.id, provider = PROVIDER, "Details fetched");

                Ok(Some(item))
            },
            keep_if = |item: &Option<MediaItem>| item.is_some()
        )
    }

    fn source(&self) -> Source {
        Source::Mal
    }

    fn media_types(&self) -> Vec<MediaType> {
        vec![MediaType::Anime, MediaType::Manga]
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
    fn test_normalize_list_dedupes() {
        let list: JikanList = serde_json::from_value(json!({
            "data": [
                { "mal_id": 21, "title": "One Piece" },
                { "mal_id": 21, "title": "One Piece" },
                { "mal_id": 20, "title": "Naruto" }
            ]
        }))
        .unwrap();

        let items = JikanProvider::normalize_list(list, MediaType::Anime);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["mal-21", "mal-20"]);
    }

    #[test]
    fn test_paths_per_kind() {
        assert_eq!(JikanProvider::kind(MediaType::Manga), "manga");
        assert_eq!(JikanProvider::kind(MediaType::Anime), "anime");
        assert_eq!(JikanProvider::trending_filter(MediaType::Anime), "airing");
    }

    #[tokio::test]
    async fn test_details_rejects_non_numeric_id_without_request() {
        let provider = JikanProvider::new(Cache::disabled(), "http://127.0.0.1:1".to_string());
        let item = provider.details("abc", MediaType::Anime).await.unwrap();
        assert!(item.is_none());
    }
}
