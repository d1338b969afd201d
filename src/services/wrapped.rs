use std::collections::HashMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::{
    models::{LibraryEntry, LibraryStatus, MediaType},
    services::recommendations::{classify, Personality},
};

const TOP_GENRES: usize = 5;
pub const CARD_WIDTH: u32 = 1200;
pub const CARD_HEIGHT: u32 = 630;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: usize,
}

/// Year-in-review over the entries touched during `year`
#[derive(Debug, Clone, Serialize)]
pub struct WrappedSummary {
    pub year: i32,
    pub total: usize,
    pub by_type: HashMap<MediaType, usize>,
    pub completed: usize,
    pub favorites: usize,
    pub avg_rating: Option<f64>,
    pub top_genres: Vec<GenreCount>,
    pub personality: Personality,
}

pub fn wrapped_summary(entries: &[LibraryEntry], year: i32) -> WrappedSummary {
    let in_year: Vec<LibraryEntry> = entries
        .iter()
        .filter(|e| e.updated_at.year() == year)
        .cloned()
        .collect();

    let mut by_type = HashMap::new();
    let mut genres: HashMap<&str, usize> = HashMap::new();
    for entry in &in_year {
        *by_type.entry(entry.media.media_type).or_insert(0) += 1;
        for genre in &entry.media.genres {
            *genres.entry(genre.as_str()).or_insert(0) += 1;
        }
    }

    let mut top_genres: Vec<GenreCount> = genres
        .into_iter()
        .map(|(genre, count)| GenreCount {
            genre: genre.to_string(),
            count,
        })
        .collect();
    top_genres.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.genre.cmp(&b.genre)));
    top_genres.truncate(TOP_GENRES);

    let ratings: Vec<f64> = in_year.iter().filter_map(|e| e.rating).collect();

    WrappedSummary {
        year,
        total: in_year.len(),
        by_type,
        completed: in_year
            .iter()
            .filter(|e| e.status == LibraryStatus::Completed)
            .count(),
        favorites: in_year.iter().filter(|e| e.favorite).count(),
        avg_rating: (!ratings.is_empty())
            .then(|| ratings.iter().sum::<f64>() / ratings.len() as f64),
        top_genres,
        personality: classify(&in_year),
    }
}

/// Fields printed on a shareable wrapped card
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShareCard {
    pub name: Option<String>,
    pub personality: Option<String>,
    pub top_genre: Option<String>,
    pub total: Option<u32>,
    pub completed: Option<u32>,
}

fn escaped(value: Option<&str>, fallback: &str) -> String {
    let value = value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(fallback);
    html_escape::encode_safe(value).into_owned()
}

/// Renders the card as a standalone SVG document
pub fn render_share_card(card: &ShareCard) -> String {
    let name = escaped(card.name.as_deref(), "My");
    let personality = escaped(card.personality.as_deref(), "The Explorer");
    let top_genre = escaped(card.top_genre.as_deref(), "Everything");
    let total = card.total.unwrap_or(0);
    let completed = card.completed.unwrap_or(0);

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
  <defs>
    <linearGradient id="bg" x1="0" y1="0" x2="1" y2="1">
      <stop offset="0%" stop-color="#1e1b4b"/>
      <stop offset="100%" stop-color="#831843"/>
    </linearGradient>
  </defs>
  <rect width="{w}" height="{h}" fill="url(#bg)"/>
  <text x="80" y="120" fill="#f9a8d4" font-family="sans-serif" font-size="36">{name} Feyris Wrapped</text>
  <text x="80" y="240" fill="#ffffff" font-family="sans-serif" font-size="80" font-weight="bold">{personality}</text>
  <text x="80" y="340" fill="#e9d5ff" font-family="sans-serif" font-size="36">Top genre: {top_genre}</text>
  <text x="80" y="480" fill="#ffffff" font-family="sans-serif" font-size="56" font-weight="bold">{total}</text>
  <text x="80" y="530" fill="#e9d5ff" font-family="sans-serif" font-size="28">titles tracked</text>
  <text x="480" y="480" fill="#ffffff" font-family="sans-serif" font-size="56" font-weight="bold">{completed}</text>
  <text x="480" y="530" fill="#e9d5ff" font-family="sans-serif" font-size="28">completed</text>
</svg>"##,
        w = CARD_WIDTH,
        h = CARD_HEIGHT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaSnapshot;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn entry(year: i32, media_type: MediaType, genres: &[&str], rating: Option<f64>) -> LibraryEntry {
        let at = Utc.with_ymd_and_hms(year, 6, 1, 12, 0, 0).unwrap();
        LibraryEntry {
            user_id: Uuid::nil(),
            media_id: Uuid::new_v4().to_string(),
            media: MediaSnapshot {
                title: "Title".to_string(),
                media_type,
                cover_url: None,
                year: None,
                rating: None,
                popularity: None,
                genres: genres.iter().map(|g| g.to_string()).collect(),
                tags: vec![],
            },
            status: LibraryStatus::Completed,
            progress: 0,
            rating,
            favorite: false,
            notes: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_summary_only_counts_requested_year() {
        let library = vec![
            entry(2025, MediaType::Anime, &["Action", "Drama"], Some(8.0)),
            entry(2025, MediaType::Anime, &["Drama"], Some(6.0)),
            entry(2025, MediaType::Book, &["Fantasy"], None),
            entry(2024, MediaType::Film, &["Horror"], Some(2.0)),
        ];
        let summary = wrapped_summary(&library, 2025);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_type[&MediaType::Anime], 2);
        assert!(!summary.by_type.contains_key(&MediaType::Film));
        assert_eq!(summary.completed, 3);
        assert_eq!(summary.avg_rating, Some(7.0));
        assert_eq!(summary.top_genres[0].genre, "Drama");
        assert_eq!(summary.top_genres[0].count, 2);
        assert_eq!(summary.top_genres[1].genre, "Action");
    }

    #[test]
    fn test_empty_year() {
        let summary = wrapped_summary(&[], 2025);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.avg_rating, None);
        assert!(summary.top_genres.is_empty());
    }

    #[test]
    fn test_share_card_escapes_text() {
        let card = ShareCard {
            name: Some("<script>alert(1)</script>".to_string()),
            personality: Some("The Critic".to_string()),
            top_genre: Some("Sci-Fi & Fantasy".to_string()),
            total: Some(42),
            completed: Some(30),
        };
        let svg = render_share_card(&card);

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"width="1200" height="630""#));
        assert!(!svg.contains("<script>"));
        assert!(svg.contains("&lt;script&gt;"));
        assert!(svg.contains("Sci-Fi &amp; Fantasy"));
        assert!(svg.contains(">42<"));
    }

    #[test]
    fn test_share_card_defaults() {
        let svg = render_share_card(&ShareCard::default());
        assert!(svg.contains("The Explorer"));
        assert!(svg.contains(">0<"));
    }
}
