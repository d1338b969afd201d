// ============================================================================
// Jikan v4 (MyAnimeList) API Types
// ============================================================================

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JikanList {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanItem<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanNamed {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JikanImages {
    #[serde(default)]
    pub jpg: Option<JikanImageUrls>,
    #[serde(default)]
    pub webp: Option<JikanImageUrls>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JikanImageUrls {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanDateRange {
    #[serde(default)]
    pub from: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JikanTrailer {
    #[serde(default)]
    pub youtube_id: Option<String>,
}

/// Anime and manga share one shape; fields that only apply to one are optional
#[derive(Debug, Clone, Deserialize)]
pub struct JikanEntry {
    pub mal_id: u64,
    pub title: String,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,
    #[serde(default)]
    pub images: Option<JikanImages>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub aired: Option<JikanDateRange>,
    #[serde(default)]
    pub published: Option<JikanDateRange>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub members: Option<u64>,
    #[serde(default)]
    pub genres: Vec<JikanNamed>,
    #[serde(default)]
    pub themes: Vec<JikanNamed>,
    #[serde(default)]
    pub demographics: Vec<JikanNamed>,
    #[serde(default)]
    pub studios: Vec<JikanNamed>,
    #[serde(default)]
    pub authors: Vec<JikanNamed>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub chapters: Option<u32>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub trailer: Option<JikanTrailer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_deserialization_with_nulls() {
        let json = r#"{
            "mal_id": 5114,
            "title": "Fullmetal Alchemist: Brotherhood",
            "score": 9.1,
            "year": null,
            "aired": { "from": "2009-04-05T00:00:00+00:00" },
            "genres": [ { "mal_id": 1, "type": "anime", "name": "Action", "url": "" } ],
            "trailer": { "youtube_id": null }
        }"#;
        let entry: JikanEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.mal_id, 5114);
        assert_eq!(entry.year, None);
        assert_eq!(entry.genres[0].name, "Action");
        assert!(entry.trailer.unwrap().youtube_id.is_none());
    }
}
