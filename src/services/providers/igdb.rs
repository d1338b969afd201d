/// IGDB provider
///
/// Serves games. IGDB authenticates with a Twitch app access token obtained
/// through the client-credentials grant; the token is kept in memory until
/// shortly before it expires. Queries are Apicalypse bodies POSTed to
/// `/games`.
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client as HttpClient;
use tokio::sync::Mutex;

use super::{
    log_unsuccessful, CatalogProvider, DETAILS_CACHE_TTL, PAGE_SIZE, SEARCH_CACHE_TTL,
    TRENDING_CACHE_TTL,
};
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        igdb::{IgdbGame, TwitchToken},
        MediaItem, MediaType, Source,
    },
    services::normalize::{decode_items, normalize_igdb},
};

const PROVIDER: &str = "igdb";
const GAME_FIELDS: &str = "fields name,summary,storyline,cover.image_id,screenshots.image_id,\
artworks.image_id,first_release_date,total_rating,total_rating_count,genres.name,themes.name,\
platforms.name,involved_companies.company.name,involved_companies.developer,videos.video_id,videos.name;";
/// Refresh this long before the advertised expiry
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Clone)]
pub struct IgdbProvider {
    http_client: HttpClient,
    client_id: String,
    client_secret: String,
    api_url: String,
    token_url: String,
    cache: Cache,
    token: Arc<Mutex<Option<AccessToken>>>,
}

impl IgdbProvider {
    pub fn new(
        cache: Cache,
        client_id: String,
        client_secret: String,
        api_url: String,
        token_url: String,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            client_id,
            client_secret,
            api_url,
            token_url,
            cache,
            token: Arc::new(Mutex::new(None)),
        }
    }

    /// Escapes a user query for use inside an Apicalypse string literal
    fn escape_query(query: &str) -> String {
        query
            .chars()
            .filter(|c| !c.is_control())
            .flat_map(|c| match c {
                '"' | '\\' => vec!['\\', c],
                _ => vec![c],
            })
            .collect()
    }

    fn search_body(query: &str) -> String {
        format!(
            "search \"{}\"; {} where version_parent = null; limit {};",
            Self::escape_query(query),
            GAME_FIELDS,
            PAGE_SIZE
        )
    }

    fn trending_body() -> String {
        format!(
            "{} where total_rating_count > 50 & first_release_date != null; sort first_release_date desc; limit {};",
            GAME_FIELDS, PAGE_SIZE
        )
    }

    fn details_body(id: u64) -> String {
        format!("{} where id = {};", GAME_FIELDS, id)
    }

    /// Returns a valid access token, requesting a new one when needed
    async fn access_token(&self) -> AppResult<String> {
        let mut guard = self.token.lock().await;

        if let Some(token) = guard.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .http_client
            .post(&self.token_url)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "Twitch token endpoint returned status {}",
                status
            )));
        }

        let token: TwitchToken = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);

        tracing::info!(
            expires_in = token.expires_in,
            provider = PROVIDER,
            "Obtained IGDB access token"
        );

        *guard = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }

    async fn query_games(&self, body: String) -> AppResult<Vec<MediaItem>> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .post(format!("{}/games", self.api_url))
            .header("Client-ID", &self.client_id)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            log_unsuccessful(PROVIDER, response).await;
            return Ok(vec![]);
        }

        let values: Vec<serde_json::Value> = response.json().await?;
        Ok(decode_items::<IgdbGame>(values, PROVIDER)
            .into_iter()
            .map(normalize_igdb)
            .collect())
    }
}

#[async_trait::async_trait]
impl CatalogProvider for IgdbProvider {
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
                let items = self.query_games(Self::search_body(query)).await?;

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
            async move { self.query_games(Self::trending_body()).await },
            keep_if = |items: &Vec<MediaItem>| !items.is_empty()
        )
    }

    async fn details(
        &self,
        external_id: &str,
        media_type: MediaType,
    ) -> AppResult<Option<MediaItem>> {
        let Ok(id) = external_id.parse::<u64>() else {
            return Ok(None);
        };

        cached!(
            self.cache,
            CacheKey::Details {
                provider: PROVIDER,
                media_type,
                external_id: external_id.to_string(),
            },
            DETAILS_CACHE_TTL,
            async move {
                let items = self.query_games(Self::details_body(id)).await?;
                Ok(items.into_iter().next())
            },
            keep_if = |item: &Option<MediaItem>| item.is_some()
        )
    }

    fn source(&self) -> Source {
        Source::Igdb
    }

    fn media_types(&self) -> Vec<MediaType> {
        vec![MediaType::Game]
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
