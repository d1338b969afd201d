use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

use super::{MediaItem, MediaTag, MediaType};

/// Canonical progress state shared by library entries and imports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LibraryStatus {
    #[default]
    Planning,
    InProgress,
    Completed,
    OnHold,
    Dropped,
}

impl LibraryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryStatus::Planning => "planning",
            LibraryStatus::InProgress => "in_progress",
            LibraryStatus::Completed => "completed",
            LibraryStatus::OnHold => "on_hold",
            LibraryStatus::Dropped => "dropped",
        }
    }
}

impl Display for LibraryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LibraryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(LibraryStatus::Planning),
            "in_progress" => Ok(LibraryStatus::InProgress),
            "completed" => Ok(LibraryStatus::Completed),
            "on_hold" => Ok(LibraryStatus::OnHold),
            "dropped" => Ok(LibraryStatus::Dropped),
            other => Err(format!("Unknown library status '{}'", other)),
        }
    }
}

/// The slice of a `MediaItem` kept alongside a library entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSnapshot {
    pub title: String,
    pub media_type: MediaType,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub tags: Vec<MediaTag>,
}

impl From<&MediaItem> for MediaSnapshot {
    fn from(item: &MediaItem) -> Self {
        Self {
            title: item.title.clone(),
            media_type: item.media_type,
            cover_url: item.cover_url.clone(),
            year: item.year,
            rating: item.rating,
            popularity: item.popularity,
            genres: item.genres.clone(),
            tags: item.tags.clone(),
        }
    }
}

/// A user's relationship to one title, keyed by `(user_id, media_id)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub user_id: Uuid,
    pub media_id: String,
    pub media: MediaSnapshot,
    pub status: LibraryStatus,
    pub progress: u32,
    /// Personal rating on a 0–10 scale
    pub rating: Option<f64>,
    pub favorite: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional filters for listing a library
#[derive(Debug, Clone, Default)]
pub struct LibraryFilter {
    pub status: Option<LibraryStatus>,
    pub media_type: Option<MediaType>,
}

impl LibraryFilter {
    pub fn matches(&self, entry: &LibraryEntry) -> bool {
        self.status.map_or(true, |s| entry.status == s)
            && self.media_type.map_or(true, |t| entry.media.media_type == t)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub media_id: String,
    pub rating: Option<f64>,
    pub body: String,
    pub contains_spoilers: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub media_id: String,
    pub action: String,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(
        user_id: Uuid,
        media_id: impl Into<String>,
        action: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            media_id: media_id.into(),
            action: action.into(),
            detail,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&LibraryStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!("on_hold".parse::<LibraryStatus>().unwrap(), LibraryStatus::OnHold);
        assert_eq!(LibraryStatus::default(), LibraryStatus::Planning);
    }

    #[test]
    fn test_snapshot_from_item() {
        let mut item = MediaItem::new(Source::Tmdb, "438631", MediaType::Film, "Dune");
        item.genres = vec!["Science Fiction".to_string()];
        item.year = Some(2021);

        let snapshot = MediaSnapshot::from(&item);
        assert_eq!(snapshot.title, "Dune");
        assert_eq!(snapshot.media_type, MediaType::Film);
        assert_eq!(snapshot.genres, vec!["Science Fiction".to_string()]);
        assert_eq!(snapshot.year, Some(2021));
    }
}
