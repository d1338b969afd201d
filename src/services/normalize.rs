//! Provider payload → `MediaItem` mapping.
//!
//! Each function is total over its typed input: any optional field may be
//! missing and the result still carries `id`, `slug` and `media_type`.

use chrono::{DateTime, Datelike};

use crate::models::{
    google_books::BookVolume,
    igdb::IgdbGame,
    jikan::JikanEntry,
    tmdb::{tmdb_genre_name, TmdbCredits, TmdbGenre, TmdbVideos, TmdbWatchProviders},
    tmdb::{TmdbMovie, TmdbTv},
    CastMember, MediaItem, MediaTag, MediaType, Source, Video, WatchKind, WatchProvider,
};

const TMDB_POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";
const TMDB_BACKDROP_BASE: &str = "https://image.tmdb.org/t/p/original";
const TMDB_PROFILE_BASE: &str = "https://image.tmdb.org/t/p/w185";
const IGDB_IMAGE_BASE: &str = "https://images.igdb.com/igdb/image/upload";
const WATCH_REGION: &str = "US";
const MAX_CAST: usize = 12;

/// Leading four-digit year of a date string such as `2021-09-15` or `1965`
fn year_from_date(date: Option<&str>) -> Option<i32> {
    let date = date?.trim();
    date.get(..4)?.parse().ok()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn tmdb_image(base: &str, path: Option<&String>) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{}{}", base, p))
}

fn tmdb_genres(genres: &[TmdbGenre], genre_ids: &[u32]) -> Vec<String> {
    if !genres.is_empty() {
        return genres.iter().map(|g| g.name.clone()).collect();
    }
    genre_ids
        .iter()
        .filter_map(|id| tmdb_genre_name(*id))
        .map(str::to_string)
        .collect()
}

fn tmdb_keyword_tags(keywords: &[TmdbGenre]) -> Vec<MediaTag> {
    keywords
        .iter()
        .map(|k| MediaTag {
            name: k.name.clone(),
            relevance: 1.0,
        })
        .collect()
}

fn tmdb_cast(credits: Option<&TmdbCredits>) -> Vec<CastMember> {
    credits
        .map(|c| {
            c.cast
                .iter()
                .take(MAX_CAST)
                .map(|member| CastMember {
                    name: member.name.clone(),
                    character: non_empty(member.character.clone()),
                    profile_url: tmdb_image(TMDB_PROFILE_BASE, member.profile_path.as_ref()),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn tmdb_videos(videos: Option<&TmdbVideos>) -> Vec<Video> {
    videos
        .map(|v| {
            v.results
                .iter()
                .filter(|video| video.site.eq_ignore_ascii_case("youtube"))
                .map(|video| Video::youtube(&video.key, &video.name))
                .collect()
        })
        .unwrap_or_default()
}

fn tmdb_watch_providers(providers: Option<&TmdbWatchProviders>) -> Vec<WatchProvider> {
    let Some(region) = providers.and_then(|p| p.results.get(WATCH_REGION)) else {
        return Vec::new();
    };

    let groups = [
        (WatchKind::Flatrate, &region.flatrate),
        (WatchKind::Free, &region.free),
        (WatchKind::Rent, &region.rent),
        (WatchKind::Buy, &region.buy),
    ];

    groups
        .into_iter()
        .flat_map(|(kind, list)| {
            list.iter().map(move |p| WatchProvider {
                name: p.provider_name.clone(),
                logo_url: tmdb_image(TMDB_POSTER_BASE, p.logo_path.as_ref()),
                kind,
            })
        })
        .collect()
}

/// Maps a TMDB movie (search result or full details) to a film item
pub fn normalize_tmdb_movie(movie: TmdbMovie) -> MediaItem {
    let mut item = MediaItem::new(
        Source::Tmdb,
        movie.id.to_string(),
        MediaType::Film,
        movie.title,
    );

    item.original_title = non_empty(movie.original_title).filter(|t| *t != item.title);
    item.cover_url = tmdb_image(TMDB_POSTER_BASE, movie.poster_path.as_ref());
    item.backdrop_url = tmdb_image(TMDB_BACKDROP_BASE, movie.backdrop_path.as_ref());
    item.description = non_empty(movie.overview);
    item.year = year_from_date(movie.release_date.as_deref());
    item.rating = movie.vote_average.filter(|v| *v > 0.0).map(|v| v * 10.0);
    item.popularity = movie.popularity;
    item.genres = tmdb_genres(&movie.genres, &movie.genre_ids);
    item.tags = movie
        .keywords
        .as_ref()
        .map(|k| tmdb_keyword_tags(&k.keywords))
        .unwrap_or_default();
    item.runtime_minutes = movie.runtime.filter(|r| *r > 0);
    item.status = movie.status;
    item.creators = movie
        .credits
        .as_ref()
        .map(|c| {
            c.crew
                .iter()
                .filter(|member| member.job.as_deref() == Some("Director"))
                .map(|member| member.name.clone())
                .collect()
        })
        .unwrap_or_default();
    item.cast = tmdb_cast(movie.credits.as_ref());
    item.videos = tmdb_videos(movie.videos.as_ref());
    item.watch_providers = tmdb_watch_providers(movie.watch_providers.as_ref());

    item
}

/// Maps a TMDB TV show to a tv item
pub fn normalize_tmdb_tv(show: TmdbTv) -> MediaItem {
    let mut item = MediaItem::new(Source::Tmdb, show.id.to_string(), MediaType::Tv, show.name);

    item.original_title = non_empty(show.original_name).filter(|t| *t != item.title);
    item.cover_url = tmdb_image(TMDB_POSTER_BASE, show.poster_path.as_ref());
    item.backdrop_url = tmdb_image(TMDB_BACKDROP_BASE, show.backdrop_path.as_ref());
    item.description = non_empty(show.overview);
    item.year = year_from_date(show.first_air_date.as_deref());
    item.rating = show.vote_average.filter(|v| *v > 0.0).map(|v| v * 10.0);
    item.popularity = show.popularity;
    item.genres = tmdb_genres(&show.genres, &show.genre_ids);
    item.tags = show
        .keywords
        .as_ref()
        .map(|k| tmdb_keyword_tags(&k.keywords))
        .unwrap_or_default();
    item.runtime_minutes = show.episode_run_time.first().copied();
    item.seasons = show.number_of_seasons;
    item.episodes = show.number_of_episodes;
    item.status = show.status;
    item.creators = show.created_by.into_iter().map(|p| p.name).collect();
    item.cast = tmdb_cast(show.credits.as_ref());
    item.videos = tmdb_videos(show.videos.as_ref());
    item.watch_providers = tmdb_watch_providers(show.watch_providers.as_ref());

    item
}

/// Parses Jikan durations like `"24 min per ep"` or `"1 hr 55 min"`
fn jikan_duration_minutes(duration: Option<&str>) -> Option<u32> {
    let duration = duration?;
    let mut minutes = 0;
    let mut last_number: Option<u32> = None;
    for token in duration.split_whitespace() {
        if let Ok(n) = token.parse::<u32>() {
            last_number = Some(n);
            continue;
        }
        match (token, last_number.take()) {
            (t, Some(n)) if t.starts_with("hr") => minutes += n * 60,
            (t, Some(n)) if t.starts_with("min") => minutes += n,
            _ => {}
        }
    }
    (minutes > 0).then_some(minutes)
}

/// Maps a Jikan anime or manga entry; `media_type` picks which
pub fn normalize_jikan(entry: JikanEntry, media_type: MediaType) -> MediaItem {
    let display_title = entry
        .title_english
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| entry.title.clone());

    let mut item = MediaItem::new(
        Source::Mal,
        entry.mal_id.to_string(),
        media_type,
        display_title,
    );

    if item.title != entry.title {
        item.original_title = Some(entry.title.clone());
    } else {
        item.original_title = non_empty(entry.title_japanese);
    }

    let images = entry.images.unwrap_or_default();
    item.cover_url = images
        .jpg
        .as_ref()
        .and_then(|jpg| jpg.large_image_url.clone().or_else(|| jpg.image_url.clone()))
        .or_else(|| images.webp.as_ref().and_then(|w| w.image_url.clone()));
    item.description = non_empty(entry.synopsis);

    let dates = match media_type {
        MediaType::Manga => entry.published.as_ref(),
        _ => entry.aired.as_ref(),
    };
    item.year = entry
        .year
        .or_else(|| year_from_date(dates.and_then(|d| d.from.as_deref())));
    item.rating = entry.score.map(|s| s * 10.0);
    item.popularity = entry.members.map(|m| m as f64 / 10_000.0);
    item.genres = entry.genres.into_iter().map(|g| g.name).collect();
    item.tags = entry
        .themes
        .into_iter()
        .map(|t| MediaTag {
            name: t.name,
            relevance: 1.0,
        })
        .chain(entry.demographics.into_iter().map(|d| MediaTag {
            name: d.name,
            relevance: 0.5,
        }))
        .collect();
    item.episodes = entry.episodes;
    item.chapters = entry.chapters;
    item.runtime_minutes = jikan_duration_minutes(entry.duration.as_deref());
    item.status = entry.status;
    item.creators = match media_type {
        MediaType::Manga => entry.authors.into_iter().map(|a| a.name).collect(),
        _ => entry.studios.into_iter().map(|s| s.name).collect(),
    };
    item.videos = entry
        .trailer
        .and_then(|t| t.youtube_id)
        .map(|key| vec![Video::youtube(key, "Trailer")])
        .unwrap_or_default();

    item
}

fn igdb_image(size: &str, image_id: &str) -> String {
    format!("{}/{}/{}.jpg", IGDB_IMAGE_BASE, size, image_id)
}

/// Maps an IGDB game
pub fn normalize_igdb(game: IgdbGame) -> MediaItem {
    let mut item = MediaItem::new(Source::Igdb, game.id.to_string(), MediaType::Game, game.name);

    item.cover_url = game
        .cover
        .as_ref()
        .map(|c| igdb_image("t_cover_big", &c.image_id));
    item.backdrop_url = game
        .artworks
        .first()
        .or_else(|| game.screenshots.first())
        .map(|img| igdb_image("t_1080p", &img.image_id));
    item.description = non_empty(game.summary).or_else(|| non_empty(game.storyline));
    item.year = game
        .first_release_date
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.year());
    item.rating = game.total_rating;
    item.popularity = game.total_rating_count.map(|c| c as f64);
    item.genres = game.genres.into_iter().map(|g| g.name).collect();
    item.tags = game
        .themes
        .into_iter()
        .map(|t| MediaTag {
            name: t.name,
            relevance: 1.0,
        })
        .collect();
    item.platforms = game.platforms.into_iter().map(|p| p.name).collect();
    item.creators = game
        .involved_companies
        .into_iter()
        .filter(|c| c.developer)
        .map(|c| c.company.name)
        .collect();
    item.videos = game
        .videos
        .into_iter()
        .map(|v| {
            let name = v.name.unwrap_or_else(|| "Trailer".to_string());
            Video::youtube(v.video_id, name)
        })
        .collect();

    item
}

/// Splits `"Fiction / Fantasy / Epic"` style categories into distinct genres
fn book_genres(categories: &[String]) -> Vec<String> {
    let mut genres: Vec<String> = Vec::new();
    for part in categories.iter().flat_map(|c| c.split('/')) {
        let part = part.trim();
        if part.is_empty() || part.eq_ignore_ascii_case("general") {
            continue;
        }
        if !genres.iter().any(|g| g.eq_ignore_ascii_case(part)) {
            genres.push(part.to_string());
        }
    }
    genres
}

fn https(url: String) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url,
    }
}

/// Maps a Google Books volume
pub fn normalize_book(volume: BookVolume) -> MediaItem {
    let info = volume.volume_info;
    let title = match info.subtitle.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(subtitle) => format!("{}: {}", info.title, subtitle),
        None => info.title,
    };

    let mut item = MediaItem::new(Source::Book, volume.id, MediaType::Book, title);

    item.cover_url = info
        .image_links
        .and_then(|links| links.large.or(links.thumbnail).or(links.small_thumbnail))
        .map(https);
    item.description = non_empty(info.description);
    item.year = year_from_date(info.published_date.as_deref());
    item.rating = info.average_rating.map(|r| r * 20.0);
    item.popularity = info.ratings_count.map(|c| c as f64);
    item.genres = book_genres(&info.categories);
    item.page_count = info.page_count.filter(|p| *p > 0);
    item.creators = info.authors;

    item
}

/// Decodes raw provider JSON items one by one, skipping the malformed ones
pub fn decode_items<T: serde::de::DeserializeOwned>(
    values: Vec<serde_json::Value>,
    provider: &'static str,
) -> Vec<T> {
    let total = values.len();
    let decoded: Vec<T> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::debug!(error = %e, provider = provider, "Skipping malformed item");
                None
            }
        })
        .collect();

    if decoded.len() < total {
        tracing::warn!(
            provider = provider,
            skipped = total - decoded.len(),
            "Provider returned malformed items"
        );
    }

    decoded
}
