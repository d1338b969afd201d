// ============================================================================
// IGDB v4 API Types
// ============================================================================

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct IgdbNamed {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgdbImage {
    pub image_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgdbVideo {
    pub video_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgdbInvolvedCompany {
    pub company: IgdbNamed,
    #[serde(default)]
    pub developer: bool,
}

/// A game with the expanded fields requested by `GAME_FIELDS`
#[derive(Debug, Clone, Deserialize)]
pub struct IgdbGame {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub storyline: Option<String>,
    #[serde(default)]
    pub cover: Option<IgdbImage>,
    #[serde(default)]
    pub screenshots: Vec<IgdbImage>,
    #[serde(default)]
    pub artworks: Vec<IgdbImage>,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub first_release_date: Option<i64>,
    /// Critic + user aggregate on a 0–100 scale
    #[serde(default)]
    pub total_rating: Option<f64>,
    #[serde(default)]
    pub total_rating_count: Option<u64>,
    #[serde(default)]
    pub genres: Vec<IgdbNamed>,
    #[serde(default)]
    pub themes: Vec<IgdbNamed>,
    #[serde(default)]
    pub platforms: Vec<IgdbNamed>,
    #[serde(default)]
    pub involved_companies: Vec<IgdbInvolvedCompany>,
    #[serde(default)]
    pub videos: Vec<IgdbVideo>,
}

/// Twitch client-credentials grant response
#[derive(Debug, Clone, Deserialize)]
pub struct TwitchToken {
    pub access_token: String,
    pub expires_in: u64,
}
