// ============================================================================
// Google Books API Types
// ============================================================================

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BookVolumes {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookVolume {
    pub id: String,
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    #[serde(default)]
    pub published_date: Option<String>,
    /// 1–5 stars
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub ratings_count: Option<u64>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub image_links: Option<ImageLinks>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub small_thumbnail: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_search_has_no_items_key() {
        let volumes: BookVolumes = serde_json::from_str(r#"{ "kind": "books#volumes", "totalItems": 0 }"#).unwrap();
        assert!(volumes.items.is_empty());
    }

    #[test]
    fn test_volume_deserialization() {
        let json = r#"{
            "id": "B1hSG45JCX4C",
            "volumeInfo": {
                "title": "Dune",
                "authors": ["Frank Herbert"],
                "publishedDate": "1965",
                "averageRating": 4.5,
                "categories": ["Fiction / Science Fiction / General"],
                "imageLinks": { "thumbnail": "http://books.google.com/x" }
            }
        }"#;
        let volume: BookVolume = serde_json::from_str(json).unwrap();
        assert_eq!(volume.volume_info.authors, vec!["Frank Herbert".to_string()]);
        assert_eq!(volume.volume_info.average_rating, Some(4.5));
        assert!(volume.volume_info.page_count.is_none());
    }
}
