use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
    models::{LibraryEntry, LibraryStatus, MediaItem, MediaType},
    services::providers::Catalog,
};

const RECENT_WINDOW_DAYS: i64 = 180;
const RECENT_WEIGHT: f64 = 1.5;
const FAVORITE_WEIGHT: f64 = 3.0;
const LOVED_GENRE_THRESHOLD: f64 = 0.7;
const CROSS_MEDIUM_GENRE_THRESHOLD: f64 = 0.5;
const CROSS_MEDIUM_MULTIPLIER: f64 = 1.3;
const MAX_POPULARITY_BONUS: f64 = 0.5;
const SCORE_SCALE: f64 = 20.0;
const MAX_SCORE: f64 = 99.0;
const MAX_REASONS: usize = 3;

/// Per-user affinity over genres, tags, and media types
///
/// Derived from a library snapshot on demand; never persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TasteProfile {
    /// Genre → affinity in [0, 1]
    pub genres: HashMap<String, f64>,
    /// Tag → affinity in [0, 1]
    pub tags: HashMap<String, f64>,
    /// Media type → share of total weight (sums to 1)
    pub types: HashMap<MediaType, f64>,
    pub dominant_type: Option<MediaType>,
    pub avg_rating: f64,
    pub total_entries: usize,
}

fn rating_weight(rating: Option<f64>) -> f64 {
    match rating {
        Some(r) if r >= 9.0 => 3.0,
        Some(r) if r >= 8.0 => 2.0,
        _ => 1.0,
    }
}

fn status_weight(status: LibraryStatus) -> f64 {
    match status {
        LibraryStatus::Completed => 1.0,
        LibraryStatus::InProgress => 0.7,
        LibraryStatus::OnHold => 0.5,
        LibraryStatus::Planning => 0.3,
        LibraryStatus::Dropped => 0.1,
    }
}

/// How much one library entry counts towards the profile
pub fn entry_weight(entry: &LibraryEntry, now: DateTime<Utc>) -> f64 {
    let mut weight = rating_weight(entry.rating) * status_weight(entry.status);

    if now - entry.updated_at <= Duration::days(RECENT_WINDOW_DAYS) {
        weight *= RECENT_WEIGHT;
    }
    if entry.favorite {
        weight *= FAVORITE_WEIGHT;
    }

    weight
}

/// Scales every value so the largest becomes 1; a map of zeros is left alone
fn normalize_by_max(map: &mut HashMap<String, f64>) {
    let max = map.values().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        for value in map.values_mut() {
            *value /= max;
        }
    }
}

/// Builds a taste profile from a single pass over the library
pub fn build_taste_profile(entries: &[LibraryEntry], now: DateTime<Utc>) -> TasteProfile {
    let mut genres: HashMap<String, f64> = HashMap::new();
    let mut tags: HashMap<String, f64> = HashMap::new();
    let mut types: HashMap<MediaType, f64> = HashMap::new();
    let mut rating_sum = 0.0;
    let mut rated = 0usize;

    for entry in entries {
        let weight = entry_weight(entry, now);

        for genre in &entry.media.genres {
            *genres.entry(genre.clone()).or_insert(0.0) += weight;
        }
        for tag in &entry.media.tags {
            *tags.entry(tag.name.clone()).or_insert(0.0) += weight;
        }
        *types.entry(entry.media.media_type).or_insert(0.0) += weight;

        if let Some(rating) = entry.rating {
            rating_sum += rating;
            rated += 1;
        }
    }

    normalize_by_max(&mut genres);
    normalize_by_max(&mut tags);

    let type_total: f64 = types.values().sum();
    if type_total > 0.0 {
        for value in types.values_mut() {
            *value /= type_total;
        }
    }

    // Fixed iteration order so equal weights resolve the same way every time
    let mut dominant_type = None;
    let mut dominant_weight = 0.0;
    for media_type in MediaType::ALL {
        if let Some(&weight) = types.get(&media_type) {
            if weight > dominant_weight {
                dominant_weight = weight;
                dominant_type = Some(media_type);
            }
        }
    }

    TasteProfile {
        genres,
        tags,
        types,
        dominant_type,
        avg_rating: if rated > 0 {
            rating_sum / rated as f64
        } else {
            0.0
        },
        total_entries: entries.len(),
    }
}

/// Match score for one candidate with up to three human-readable reasons
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaScore {
    /// Integer in [0, 99]
    pub score: u8,
    pub reasons: Vec<String>,
}

/// Scores how well `media` fits `profile`
pub fn score_media(profile: &TasteProfile, media: &MediaItem) -> MediaScore {
    let mut raw = 0.0;
    let mut reasons = Vec::new();
    let mut best_genre_affinity: f64 = 0.0;

    for genre in &media.genres {
        let affinity = profile.genres.get(genre).copied().unwrap_or(0.0);
        raw += affinity;
        best_genre_affinity = best_genre_affinity.max(affinity);
        if affinity > LOVED_GENRE_THRESHOLD {
            reasons.push(format!("Because you love {}", genre));
        }
    }

    for tag in &media.tags {
        let affinity = profile.tags.get(&tag.name).copied().unwrap_or(0.0);
        raw += affinity * tag.relevance.clamp(0.0, 1.0);
    }

    raw += (media.popularity.unwrap_or(0.0).max(0.0) / 100.0).min(MAX_POPULARITY_BONUS);

    let cross_medium = profile
        .dominant_type
        .is_some_and(|dominant| dominant != media.media_type)
        && best_genre_affinity > CROSS_MEDIUM_GENRE_THRESHOLD;
    if cross_medium {
        raw *= CROSS_MEDIUM_MULTIPLIER;
        reasons.push(format!(
            "Cross-medium pick: a {} that matches your taste",
            media.media_type
        ));
    }

    reasons.truncate(MAX_REASONS);

    MediaScore {
        score: (raw * SCORE_SCALE).min(MAX_SCORE).max(0.0).round() as u8,
        reasons,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub media: MediaItem,
    pub score: u8,
    pub reasons: Vec<String>,
}

/// Ranks trending titles from every provider (or those of `media_type`)
/// against the user's taste, skipping titles already in the library.
pub async fn recommend(
    catalog: &Catalog,
    library: &[LibraryEntry],
    media_type: Option<MediaType>,
    limit: usize,
) -> Vec<Recommendation> {
    let profile = build_taste_profile(library, Utc::now());
    let owned: HashSet<&str> = library.iter().map(|e| e.media_id.as_str()).collect();

    let mut tasks = Vec::new();
    for (provider, target_type) in catalog.targets(media_type) {
        tasks.push(tokio::spawn(async move {
            (provider.name(), provider.trending(target_type).await)
        }));
    }

    let mut seen = HashSet::new();
    let mut recommendations = Vec::new();

    for task in tasks {
        let items = match task.await {
            Ok((_, Ok(items))) => items,
            Ok((provider, Err(e))) => {
                tracing::warn!(error = %e, provider = provider, "Candidate fetch failed");
                continue;
            }
            Err(e) => {
                tracing::error!(error = %e, "Candidate task join error");
                continue;
            }
        };

        for media in items {
            if owned.contains(media.id.as_str()) || !seen.insert(media.id.clone()) {
                continue;
            }
            let MediaScore { score, reasons } = score_media(&profile, &media);
            recommendations.push(Recommendation {
                media,
                score,
                reasons,
            });
        }
    }

    recommendations.sort_by(|a, b| b.score.cmp(&a.score));
    recommendations.truncate(limit);

    tracing::info!(
        library_size = library.len(),
        dominant_type = ?profile.dominant_type,
        returned = recommendations.len(),
        "Recommendations computed"
    );

    recommendations
}
