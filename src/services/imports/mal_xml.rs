use quick_xml::events::Event;
use quick_xml::reader::Reader;

use super::parsers::{map_mal_status, ImportPlatform, ImportedItem};
use crate::{
    error::{AppError, AppResult},
    models::MediaType,
};

/// Parses a MyAnimeList XML export (`<myanimelist>` root with `<anime>` or
/// `<manga>` children)
pub fn parse_mal_xml(xml: &str) -> AppResult<Vec<ImportedItem>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<EntryBuilder> = None;
    let mut current_element = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "anime" => current = Some(EntryBuilder::new(MediaType::Anime)),
                    "manga" => current = Some(EntryBuilder::new(MediaType::Manga)),
                    _ => {}
                }
                current_element = name;
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                if name.as_ref() == b"anime" || name.as_ref() == b"manga" {
                    if let Some(item) = current.take().and_then(EntryBuilder::build) {
                        items.push(item);
                    }
                }
                current_element.clear();
            }
            Ok(Event::Text(e)) => {
                if let Some(ref mut entry) = current {
                    let text = e.unescape().unwrap_or_default().to_string();
                    entry.set(&current_element, text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(ref mut entry) = current {
                    let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                    entry.set(&current_element, text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AppError::InvalidInput(format!(
                    "Invalid MyAnimeList XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    tracing::info!(items = items.len(), "MyAnimeList XML export parsed");

    Ok(items)
}

struct EntryBuilder {
    media_type: MediaType,
    id: Option<String>,
    title: Option<String>,
    status: Option<String>,
    score: Option<f64>,
    progress: Option<u32>,
}

impl EntryBuilder {
    fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            id: None,
            title: None,
            status: None,
            score: None,
            progress: None,
        }
    }

    fn set(&mut self, element: &str, text: String) {
        let text = text.trim().to_string();
        if text.is_empty() {
            return;
        }
        match element {
            "series_animedb_id" | "manga_mangadb_id" => self.id = Some(text),
            "series_title" | "manga_title" => self.title = Some(text),
            "my_status" => self.status = Some(text),
            "my_score" => self.score = text.parse().ok(),
            "my_watched_episodes" | "my_read_chapters" => self.progress = text.parse().ok(),
            _ => {}
        }
    }

    fn build(self) -> Option<ImportedItem> {
        let mut item = ImportedItem::new(self.title?, self.media_type, ImportPlatform::Myanimelist);
        item.status = map_mal_status(self.status.as_deref().unwrap_or(""));
        item.rating = self.score.filter(|s| *s > 0.0).map(|s| s.clamp(0.0, 10.0));
        item.progress = self.progress.unwrap_or(0);
        item.external_id = self.id;
        Some(item)
    }
}
