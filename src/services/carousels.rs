use serde::Serialize;

use crate::{
    models::{MediaItem, MediaType},
    services::providers::Catalog,
};

/// A named, typed row of titles on the home and discover pages
#[derive(Debug, Clone, Serialize)]
pub struct Carousel {
    pub key: &'static str,
    pub title: &'static str,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub items: Vec<MediaItem>,
}

/// Home page rows, in display order
pub const HOME_CAROUSELS: [(&str, &str, MediaType); 6] = [
    ("trending_films", "Trending Films", MediaType::Film),
    ("popular_tv", "Popular TV", MediaType::Tv),
    ("airing_anime", "Top Airing Anime", MediaType::Anime),
    ("popular_manga", "Popular Manga", MediaType::Manga),
    ("popular_games", "Popular Games", MediaType::Game),
    ("new_books", "New in Fiction", MediaType::Book),
];

/// Fetches every home carousel concurrently
///
/// Rows whose provider is not registered, failed, or returned nothing are
/// left out rather than failing the page.
pub async fn home_carousels(catalog: &Catalog) -> Vec<Carousel> {
    let mut tasks = Vec::new();

    for (key, title, media_type) in HOME_CAROUSELS {
        let Some(provider) = catalog.for_type(media_type) else {
            tracing::debug!(carousel = key, "No provider registered for carousel");
            continue;
        };
        let task = tokio::spawn(async move {
            let result = provider.trending(media_type).await;
            (key, title, media_type, result)
        });
        tasks.push(task);
    }

    let mut carousels = Vec::new();

    for task in tasks {
        match task.await {
            Ok((key, title, media_type, Ok(items))) => {
                if items.is_empty() {
                    tracing::debug!(carousel = key, "Carousel came back empty");
                    continue;
                }
                carousels.push(Carousel {
                    key,
                    title,
                    media_type,
                    items,
                });
            }
            Ok((key, _, _, Err(e))) => {
                tracing::warn!(error = %e, carousel = key, "Carousel fetch failed");
            }
            Err(e) => {
                tracing::error!(error = %e, "Carousel task join error");
            }
        }
    }

    tracing::info!(carousels = carousels.len(), "Home carousels assembled");

    carousels
}
