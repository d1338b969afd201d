use crate::{
    error::{AppError, AppResult},
    models::{MediaItem, MediaSlug, MediaType, Source},
    services::providers::Catalog,
};

/// Media types to try, in order, for a slug from `source`
///
/// TMDB and MAL ids are shared between two types, so without a hint the
/// primary type is tried first and the other one second.
fn candidate_types(source: Source, hint: Option<MediaType>) -> AppResult<Vec<MediaType>> {
    let defaults: &[MediaType] = match source {
        Source::Tmdb => &[MediaType::Film, MediaType::Tv],
        Source::Mal => &[MediaType::Anime, MediaType::Manga],
        Source::Igdb => &[MediaType::Game],
        Source::Book => &[MediaType::Book],
    };

    match hint {
        None => Ok(defaults.to_vec()),
        Some(t) if defaults.contains(&t) => Ok(vec![t]),
        Some(t) => Err(AppError::InvalidInput(format!(
            "Media type '{}' does not belong to source '{}'",
            t, source
        ))),
    }
}

/// Resolves a `"<source>-<id>"` slug to a full `MediaItem`
pub async fn lookup_media(
    catalog: &Catalog,
    slug: &str,
    type_hint: Option<MediaType>,
) -> AppResult<MediaItem> {
    let parsed: MediaSlug = slug.parse().map_err(AppError::InvalidInput)?;
    let types = candidate_types(parsed.source, type_hint)?;

    let provider = catalog.for_source(parsed.source).ok_or_else(|| {
        AppError::NotFound(format!("No catalog configured for source '{}'", parsed.source))
    })?;

    for media_type in types {
        if let Some(item) = provider.details(&parsed.external_id, media_type).await? {
            return Ok(item);
        }
        tracing::debug!(slug = %slug, media_type = %media_type, "Slug not found for type");
    }

    Err(AppError::NotFound(format!("Media '{}' not found", slug)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockCatalogProvider;
    use mockall::predicate::eq;
    use std::sync::Arc;

    fn tmdb_catalog() -> Catalog {
        let mut tmdb = MockCatalogProvider::new();
        tmdb.expect_source().return_const(Source::Tmdb);
        tmdb.expect_details()
            .with(eq("1399"), eq(MediaType::Film))
            .returning(|_, _| Ok(None));
        tmdb.expect_details()
            .with(eq("1399"), eq(MediaType::Tv))
            .returning(|id, t| Ok(Some(MediaItem::new(Source::Tmdb, id, t, "Game of Thrones"))));
        Catalog::new(vec![Arc::new(tmdb)])
    }

    #[tokio::test]
    async fn test_tmdb_falls_back_to_tv() {
        let item = lookup_media(&tmdb_catalog(), "tmdb-1399", None).await.unwrap();
        assert_eq!(item.media_type, MediaType::Tv);
        assert_eq!(item.slug, "tmdb-1399");
    }

    #[tokio::test]
    async fn test_type_hint_skips_film_lookup() {
        let item = lookup_media(&tmdb_catalog(), "tmdb-1399", Some(MediaType::Tv))
            .await
            .unwrap();
        assert_eq!(item.title, "Game of Thrones");
    }

    #[tokio::test]
    async fn test_malformed_slug_is_invalid_input() {
        let result = lookup_media(&tmdb_catalog(), "imdb-tt123", None).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_mismatched_hint_is_invalid_input() {
        let result = lookup_media(&tmdb_catalog(), "tmdb-1399", Some(MediaType::Game)).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unregistered_source_is_not_found() {
        let result = lookup_media(&tmdb_catalog(), "igdb-1942", None).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_candidate_types() {
        assert_eq!(
            candidate_types(Source::Mal, None).unwrap(),
            vec![MediaType::Anime, MediaType::Manga]
        );
        assert_eq!(
            candidate_types(Source::Mal, Some(MediaType::Manga)).unwrap(),
            vec![MediaType::Manga]
        );
    }
}
