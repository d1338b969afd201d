use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Catalog a title was sourced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Tmdb,
    Mal,
    Igdb,
    Book,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Tmdb => "tmdb",
            Source::Mal => "mal",
            Source::Igdb => "igdb",
            Source::Book => "book",
        }
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tmdb" => Ok(Source::Tmdb),
            "mal" => Ok(Source::Mal),
            "igdb" => Ok(Source::Igdb),
            "book" => Ok(Source::Book),
            other => Err(format!("Unknown media source '{}'", other)),
        }
    }
}

/// Kind of title tracked in a library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Anime,
    Manga,
    Game,
    Book,
    Tv,
    Film,
}

impl MediaType {
    pub const ALL: [MediaType; 6] = [
        MediaType::Anime,
        MediaType::Manga,
        MediaType::Game,
        MediaType::Book,
        MediaType::Tv,
        MediaType::Film,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Anime => "anime",
            MediaType::Manga => "manga",
            MediaType::Game => "game",
            MediaType::Book => "book",
            MediaType::Tv => "tv",
            MediaType::Film => "film",
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    /// Accepts the canonical names plus the aliases the web client sends
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anime" => Ok(MediaType::Anime),
            "manga" => Ok(MediaType::Manga),
            "game" | "games" => Ok(MediaType::Game),
            "book" | "books" => Ok(MediaType::Book),
            "tv" | "series" | "show" => Ok(MediaType::Tv),
            "film" | "films" | "movie" | "movies" => Ok(MediaType::Film),
            other => Err(format!("Unknown media type '{}'", other)),
        }
    }
}

/// A genre-like label with how strongly it applies to the title (0–1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaTag {
    pub name: String,
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub character: Option<String>,
    pub profile_url: Option<String>,
}

/// Trailer or clip hosted on the video platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub key: String,
    pub name: String,
    pub thumbnail_url: String,
    pub embed_url: String,
}

impl Video {
    /// Builds a YouTube-backed video entry from its id
    pub fn youtube(key: impl Into<String>, name: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            thumbnail_url: format!("https://img.youtube.com/vi/{}/hqdefault.jpg", key),
            embed_url: format!("https://www.youtube.com/embed/{}", key),
            name: name.into(),
            key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchKind {
    Flatrate,
    Rent,
    Buy,
    Free,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchProvider {
    pub name: String,
    pub logo_url: Option<String>,
    pub kind: WatchKind,
}

/// Normalized cross-provider title record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub slug: String,
    pub source: Source,
    pub external_id: String,
    pub media_type: MediaType,
    pub title: String,
    pub original_title: Option<String>,
    pub cover_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub description: Option<String>,
    pub year: Option<i32>,
    /// Community rating on a 0–100 scale
    pub rating: Option<f64>,
    pub popularity: Option<f64>,
    pub genres: Vec<String>,
    pub tags: Vec<MediaTag>,
    pub runtime_minutes: Option<u32>,
    pub episodes: Option<u32>,
    pub seasons: Option<u32>,
    pub chapters: Option<u32>,
    pub page_count: Option<u32>,
    pub creators: Vec<String>,
    pub platforms: Vec<String>,
    pub cast: Vec<CastMember>,
    pub videos: Vec<Video>,
    pub watch_providers: Vec<WatchProvider>,
    pub status: Option<String>,
}

impl MediaItem {
    /// Composite identity shared by `id` and `slug`
    pub fn compose_id(source: Source, external_id: &str) -> String {
        format!("{}-{}", source, external_id)
    }

    /// Creates an item with identity fields set and everything else empty.
    ///
    /// Every normalizer starts here so `id` and `slug` are always derived the
    /// same way from source and external id.
    pub fn new(
        source: Source,
        external_id: impl Into<String>,
        media_type: MediaType,
        title: impl Into<String>,
    ) -> Self {
        let external_id = external_id.into();
        let id = Self::compose_id(source, &external_id);
        Self {
            slug: id.clone(),
            id,
            source,
            external_id,
            media_type,
            title: title.into(),
            original_title: None,
            cover_url: None,
            backdrop_url: None,
            description: None,
            year: None,
            rating: None,
            popularity: None,
            genres: Vec::new(),
            tags: Vec::new(),
            runtime_minutes: None,
            episodes: None,
            seasons: None,
            chapters: None,
            page_count: None,
            creators: Vec::new(),
            platforms: Vec::new(),
            cast: Vec::new(),
            videos: Vec::new(),
            watch_providers: Vec::new(),
            status: None,
        }
    }
}

/// Parsed `"<source>-<external_id>"` slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSlug {
    pub source: Source,
    pub external_id: String,
}

impl FromStr for MediaSlug {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, external_id) = s
            .split_once('-')
            .ok_or_else(|| format!("Malformed media slug '{}'", s))?;
        if external_id.is_empty() {
            return Err(format!("Malformed media slug '{}'", s));
        }
        Ok(Self {
            source: source.parse()?,
            external_id: external_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_id_and_slug() {
        let item = MediaItem::new(Source::Mal, "5114", MediaType::Anime, "Fullmetal Alchemist");
        assert_eq!(item.id, "mal-5114");
        assert_eq!(item.slug, item.id);
        assert_eq!(item.external_id, "5114");
    }

    #[test]
    fn test_slug_parse() {
        let slug: MediaSlug = "book-zyTCAlFPjgYC".parse().unwrap();
        assert_eq!(slug.source, Source::Book);
        assert_eq!(slug.external_id, "zyTCAlFPjgYC");
    }

    #[test]
    fn test_slug_keeps_dashes_in_external_id() {
        let slug: MediaSlug = "book-ab-cd".parse().unwrap();
        assert_eq!(slug.external_id, "ab-cd");
    }

    #[test]
    fn test_slug_parse_rejects_unknown_source() {
        assert!("imdb-tt0111161".parse::<MediaSlug>().is_err());
        assert!("tmdb".parse::<MediaSlug>().is_err());
        assert!("tmdb-".parse::<MediaSlug>().is_err());
    }

    #[test]
    fn test_media_type_aliases() {
        assert_eq!("movie".parse::<MediaType>().unwrap(), MediaType::Film);
        assert_eq!("Games".parse::<MediaType>().unwrap(), MediaType::Game);
        assert!("podcast".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_media_type_serialization() {
        assert_eq!(serde_json::to_string(&MediaType::Tv).unwrap(), "\"tv\"");
        assert_eq!(serde_json::to_string(&Source::Igdb).unwrap(), "\"igdb\"");
    }

    #[test]
    fn test_youtube_video_urls() {
        let video = Video::youtube("abc123", "Trailer");
        assert_eq!(video.thumbnail_url, "https://img.youtube.com/vi/abc123/hqdefault.jpg");
        assert_eq!(video.embed_url, "https://www.youtube.com/embed/abc123");
    }
}
