use std::cmp::Ordering;

use regex::Regex;

use crate::{
    error::{AppError, AppResult},
    models::{MediaItem, MediaType},
    services::providers::Catalog,
};

/// Maximum number of results returned by an aggregated search
pub const MAX_RESULTS: usize = 50;

const EXACT_MATCH: f64 = 1000.0;
const PREFIX_MATCH: f64 = 500.0;
const SUBTITLE_PREFIX_MATCH: f64 = 400.0;
const WORD_MATCH: f64 = 300.0;
const SUBSTRING_MATCH: f64 = 150.0;
const NO_MATCH: f64 = -200.0;
const MAX_RATING_BONUS: f64 = 50.0;
const MAX_RECENCY_BONUS: f64 = 12.0;
const MAX_LENGTH_BONUS: f64 = 50.0;

/// Text-match component of the relevance score
///
/// `title` and `query` must already be lowercased and trimmed.
fn match_score(title: &str, query: &str, word: Option<&Regex>) -> f64 {
    if title == query {
        EXACT_MATCH
    } else if title.starts_with(&format!("{} ", query)) {
        PREFIX_MATCH
    } else if title.starts_with(&format!("{}:", query)) {
        SUBTITLE_PREFIX_MATCH
    } else if word.is_some_and(|re| re.is_match(title)) {
        WORD_MATCH
    } else if title.contains(query) {
        SUBSTRING_MATCH
    } else {
        NO_MATCH
    }
}

fn word_regex(query: &str) -> Option<Regex> {
    Regex::new(&format!(r"\b{}\b", regex::escape(query))).ok()
}

fn bonuses(item: &MediaItem, query: &str, title: &str) -> f64 {
    let rating = item
        .rating
        .map(|r| (r.max(0.0) * 0.5).min(MAX_RATING_BONUS))
        .unwrap_or(0.0);

    let recency = match item.year {
        Some(year) if year > 2000 => (f64::from(year - 2000) * 0.5).min(MAX_RECENCY_BONUS),
        _ => 0.0,
    };

    let title_len = title.chars().count();
    let length = if title_len == 0 {
        0.0
    } else {
        (query.chars().count() as f64 / title_len as f64 * MAX_LENGTH_BONUS).min(MAX_LENGTH_BONUS)
    };

    rating + recency + length
}

fn score_with(item: &MediaItem, query: &str, word: Option<&Regex>) -> f64 {
    let title = item.title.trim().to_lowercase();
    match_score(&title, query, word) + bonuses(item, query, &title)
}

/// Heuristic relevance of `item` for `query`; higher is better
pub fn score_result(item: &MediaItem, query: &str) -> f64 {
    let query = query.trim().to_lowercase();
    let word = word_regex(&query);
    score_with(item, &query, word.as_ref())
}

fn mentions(item: &MediaItem, query: &str) -> bool {
    item.title.to_lowercase().contains(query)
        || item
            .description
            .as_ref()
            .is_some_and(|d| d.to_lowercase().contains(query))
}

/// Sorts by descending score, keeps only results mentioning the query
/// (falling back to the full ranking when none do), and caps the output.
pub fn rank_results(items: Vec<MediaItem>, query: &str) -> Vec<MediaItem> {
    let query = query.trim().to_lowercase();
    let word = word_regex(&query);

    let mut scored: Vec<(f64, MediaItem)> = items
        .into_iter()
        .map(|item| (score_with(&item, &query, word.as_ref()), item))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let ranked: Vec<MediaItem> = scored.into_iter().map(|(_, item)| item).collect();

    let mut filtered: Vec<MediaItem> = ranked
        .iter()
        .filter(|item| mentions(item, &query))
        .cloned()
        .collect();
    if filtered.is_empty() {
        filtered = ranked;
    }

    filtered.truncate(MAX_RESULTS);
    filtered
}

/// Searches every provider serving `media_type` (all when `None`)
/// concurrently and ranks the combined results.
///
/// A failing provider only reduces coverage; its error is logged and the
/// remaining results are still returned.
pub async fn search_all(
    catalog: &Catalog,
    query: &str,
    media_type: Option<MediaType>,
) -> AppResult<Vec<MediaItem>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }

    let targets = catalog.targets(media_type);
    let mut tasks = Vec::with_capacity(targets.len());

    for (provider, target_type) in targets {
        let query = query.to_string();
        let task = tokio::spawn(async move {
            let name = provider.name();
            (name, target_type, provider.search(&query, target_type).await)
        });
        tasks.push(task);
    }

    let mut combined = Vec::new();
    let mut failures = 0;

    for task in tasks {
        match task.await {
            Ok((_, _, Ok(items))) => combined.extend(items),
            Ok((provider, target_type, Err(e))) => {
                failures += 1;
                tracing::warn!(
                    error = %e,
                    provider = provider,
                    media_type = %target_type,
                    "Provider search failed"
                );
            }
            Err(e) => {
                failures += 1;
                tracing::error!(error = %e, "Search task join error");
            }
        }
    }

    let total = combined.len();
    let ranked = rank_results(combined, query);

    tracing::info!(
        query = %query,
        media_type = ?media_type,
        candidates = total,
        returned = ranked.len(),
        failed_providers = failures,
        "Aggregated search completed"
    );

    Ok(ranked)
}
