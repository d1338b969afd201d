use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{csv::parse_csv_lines, mal_xml::parse_mal_xml};
use crate::{
    error::{AppError, AppResult},
    models::{LibraryStatus, MediaType},
};

/// Services whose library exports can be imported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportPlatform {
    Goodreads,
    Myanimelist,
    Letterboxd,
    Steam,
    Imdb,
}

impl ImportPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportPlatform::Goodreads => "goodreads",
            ImportPlatform::Myanimelist => "myanimelist",
            ImportPlatform::Letterboxd => "letterboxd",
            ImportPlatform::Steam => "steam",
            ImportPlatform::Imdb => "imdb",
        }
    }
}

impl Display for ImportPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "goodreads" => Ok(ImportPlatform::Goodreads),
            "myanimelist" | "mal" => Ok(ImportPlatform::Myanimelist),
            "letterboxd" => Ok(ImportPlatform::Letterboxd),
            "steam" => Ok(ImportPlatform::Steam),
            "imdb" => Ok(ImportPlatform::Imdb),
            other => Err(format!("Unsupported import platform '{}'", other)),
        }
    }
}

/// One row of an external export mapped onto library fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedItem {
    pub title: String,
    pub media_type: MediaType,
    pub status: LibraryStatus,
    /// Rescaled to 0–10
    pub rating: Option<f64>,
    pub progress: u32,
    pub year: Option<i32>,
    pub external_id: Option<String>,
    /// Author, studio, or developer when the export has one
    pub creator: Option<String>,
    pub platform: ImportPlatform,
}

impl ImportedItem {
    pub(crate) fn new(title: String, media_type: MediaType, platform: ImportPlatform) -> Self {
        Self {
            title,
            media_type,
            status: LibraryStatus::Planning,
            rating: None,
            progress: 0,
            year: None,
            external_id: None,
            creator: None,
            platform,
        }
    }
}

/// Parses an export file from `platform` into importable items
///
/// Malformed rows are skipped. MyAnimeList content starting with `<` is read
/// as its XML export, anything else as CSV.
pub fn parse_import(platform: ImportPlatform, content: &str) -> AppResult<Vec<ImportedItem>> {
    if platform == ImportPlatform::Myanimelist && content.trim_start().starts_with('<') {
        return parse_mal_xml(content);
    }

    let rows = parse_csv_lines(content);
    let Some((headers, records)) = rows.split_first() else {
        return Err(AppError::InvalidInput("Import file is empty".to_string()));
    };
    let columns = Columns::new(headers);

    let items: Vec<ImportedItem> = records
        .iter()
        .filter_map(|row| match platform {
            ImportPlatform::Goodreads => map_goodreads(&columns, row),
            ImportPlatform::Myanimelist => map_myanimelist(&columns, row),
            ImportPlatform::Letterboxd => map_letterboxd(&columns, row),
            ImportPlatform::Steam => map_steam(&columns, row),
            ImportPlatform::Imdb => map_imdb(&columns, row),
        })
        .collect();

    tracing::info!(
        platform = %platform,
        rows = records.len(),
        items = items.len(),
        "Import file parsed"
    );

    Ok(items)
}

/// Index of the first header equal to one of `names` (case-insensitive),
/// falling back to the first header containing one of them.
pub fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

    names
        .iter()
        .find_map(|name| lowered.iter().position(|h| h == name))
        .or_else(|| {
            names
                .iter()
                .find_map(|name| lowered.iter().position(|h| h.contains(name)))
        })
}

struct Columns<'a> {
    headers: &'a [String],
}

impl<'a> Columns<'a> {
    fn new(headers: &'a [String]) -> Self {
        Self { headers }
    }

    fn has(&self, names: &[&str]) -> bool {
        find_column(self.headers, names).is_some()
    }

    /// Trimmed, non-empty cell for the first matching column
    fn get<'r>(&self, row: &'r [String], names: &[&str]) -> Option<&'r str> {
        find_column(self.headers, names)
            .and_then(|i| row.get(i))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn number(&self, row: &[String], names: &[&str]) -> Option<f64> {
        self.get(row, names).and_then(|v| v.parse::<f64>().ok())
    }
}

fn title(columns: &Columns, row: &[String], names: &[&str]) -> Option<String> {
    columns.get(row, names).map(str::to_string)
}

/// Rescales to 0–10; a zero means "not rated" on every supported platform
fn rescale_rating(raw: Option<f64>, factor: f64) -> Option<f64> {
    raw.filter(|r| *r > 0.0).map(|r| (r * factor).clamp(0.0, 10.0))
}

fn parse_year(value: Option<&str>) -> Option<i32> {
    value.and_then(|v| v.get(..4)).and_then(|y| y.parse().ok())
}

pub fn map_goodreads_status(shelf: &str) -> LibraryStatus {
    match shelf.trim().to_lowercase().as_str() {
        "read" => LibraryStatus::Completed,
        "currently-reading" | "currently reading" => LibraryStatus::InProgress,
        "to-read" | "to read" => LibraryStatus::Planning,
        "did-not-finish" | "dnf" => LibraryStatus::Dropped,
        "on-hold" | "paused" => LibraryStatus::OnHold,
        _ => LibraryStatus::Planning,
    }
}

pub fn map_mal_status(status: &str) -> LibraryStatus {
    match status.trim().to_lowercase().as_str() {
        "watching" | "reading" | "1" => LibraryStatus::InProgress,
        "completed" | "2" => LibraryStatus::Completed,
        "on-hold" | "on hold" | "3" => LibraryStatus::OnHold,
        "dropped" | "4" => LibraryStatus::Dropped,
        "plan to watch" | "plan to read" | "6" => LibraryStatus::Planning,
        _ => LibraryStatus::Planning,
    }
}

/// IMDb exports have no status column; the list a row came from decides
pub fn map_imdb_status(list: &str) -> LibraryStatus {
    match list.trim().to_lowercase().as_str() {
        "rated" | "watched" | "seen" => LibraryStatus::Completed,
        "watching" => LibraryStatus::InProgress,
        "watchlist" => LibraryStatus::Planning,
        _ => LibraryStatus::Planning,
    }
}

fn imdb_media_type(title_type: Option<&str>) -> MediaType {
    match title_type.map(|t| t.to_lowercase()) {
        Some(t) if t.contains("series") || t.contains("episode") => MediaType::Tv,
        _ => MediaType::Film,
    }
}

fn map_goodreads(columns: &Columns, row: &[String]) -> Option<ImportedItem> {
    let mut item = ImportedItem::new(
        title(columns, row, &["title"])?,
        MediaType::Book,
        ImportPlatform::Goodreads,
    );
    item.status = map_goodreads_status(columns.get(row, &["exclusive shelf", "shelf"]).unwrap_or(""));
    item.rating = rescale_rating(columns.number(row, &["my rating"]), 2.0);
    item.year = parse_year(columns.get(row, &["original publication year", "year published"]));
    item.external_id = columns.get(row, &["book id"]).map(str::to_string);
    item.creator = columns.get(row, &["author"]).map(str::to_string);
    item.progress = columns
        .number(row, &["read count"])
        .map(|n| n.max(0.0) as u32)
        .unwrap_or(0);
    Some(item)
}

fn map_myanimelist(columns: &Columns, row: &[String]) -> Option<ImportedItem> {
    let is_manga = columns.has(&["manga_title", "my_read_chapters", "manga_mangadb_id"]);
    let media_type = if is_manga { MediaType::Manga } else { MediaType::Anime };

    let mut item = ImportedItem::new(
        title(columns, row, &["series_title", "manga_title", "title"])?,
        media_type,
        ImportPlatform::Myanimelist,
    );
    item.status = map_mal_status(columns.get(row, &["my_status", "status"]).unwrap_or(""));
    item.rating = rescale_rating(columns.number(row, &["my_score", "score"]), 1.0);
    item.progress = columns
        .number(row, &["my_watched_episodes", "my_read_chapters", "progress"])
        .map(|n| n.max(0.0) as u32)
        .unwrap_or(0);
    item.external_id = columns
        .get(row, &["series_animedb_id", "manga_mangadb_id", "id"])
        .map(str::to_string);
    Some(item)
}

fn map_letterboxd(columns: &Columns, row: &[String]) -> Option<ImportedItem> {
    let mut item = ImportedItem::new(
        title(columns, row, &["name", "title"])?,
        MediaType::Film,
        ImportPlatform::Letterboxd,
    );
    // Every Letterboxd export except the watchlist lists films already seen
    let watchlist = !columns.has(&["watched date", "rating", "rewatch"]);
    item.status = if watchlist {
        LibraryStatus::Planning
    } else {
        LibraryStatus::Completed
    };
    item.rating = rescale_rating(columns.number(row, &["rating"]), 2.0);
    item.year = parse_year(columns.get(row, &["year"]));
    item.external_id = columns.get(row, &["letterboxd uri", "uri"]).map(str::to_string);
    Some(item)
}

fn map_steam(columns: &Columns, row: &[String]) -> Option<ImportedItem> {
    let mut item = ImportedItem::new(
        title(columns, row, &["name", "title"])?,
        MediaType::Game,
        ImportPlatform::Steam,
    );
    let minutes = columns
        .number(row, &["playtime_forever", "playtime"])
        .unwrap_or(0.0)
        .max(0.0);
    item.status = if minutes > 0.0 {
        LibraryStatus::InProgress
    } else {
        LibraryStatus::Planning
    };
    item.progress = (minutes / 60.0).round() as u32;
    item.external_id = columns.get(row, &["appid", "app id"]).map(str::to_string);
    Some(item)
}

fn map_imdb(columns: &Columns, row: &[String]) -> Option<ImportedItem> {
    let mut item = ImportedItem::new(
        title(columns, row, &["title", "primary title"])?,
        imdb_media_type(columns.get(row, &["title type"])),
        ImportPlatform::Imdb,
    );
    item.rating = rescale_rating(columns.number(row, &["your rating"]), 1.0);
    item.status = if item.rating.is_some() {
        map_imdb_status("rated")
    } else {
        map_imdb_status(columns.get(row, &["list"]).unwrap_or("watchlist"))
    };
    item.year = parse_year(columns.get(row, &["year"]));
    item.external_id = columns.get(row, &["const"]).map(str::to_string);
    item.creator = columns.get(row, &["directors"]).map(str::to_string);
    Some(item)
}
