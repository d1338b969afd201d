use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use feyris_api::{
    db::{LibraryStore, MemoryStore, ReviewFilter},
    error::{AppError, AppResult},
    middleware::{StaticAuth, REQUEST_ID_HEADER},
    models::{ActivityEntry, LibraryEntry, LibraryFilter, MediaItem, MediaType, Review, Source},
    routes::{create_router, AppState},
    services::providers::{Catalog, CatalogProvider},
};

const TOKEN: &str = "test-token";

/// Catalog provider answering from a fixed list
struct StubProvider {
    source: Source,
    items: Vec<MediaItem>,
}

#[async_trait::async_trait]
impl CatalogProvider for StubProvider {
    async fn search(&self, query: &str, media_type: MediaType) -> AppResult<Vec<MediaItem>> {
        let query = query.to_lowercase();
        Ok(self
            .items
            .iter()
            .filter(|i| i.media_type == media_type && i.title.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }

    async fn trending(&self, media_type: MediaType) -> AppResult<Vec<MediaItem>> {
        Ok(self
            .items
            .iter()
            .filter(|i| i.media_type == media_type)
            .cloned()
            .collect())
    }

    async fn details(&self, external_id: &str, media_type: MediaType) -> AppResult<Option<MediaItem>> {
        Ok(self
            .items
            .iter()
            .find(|i| i.external_id == external_id && i.media_type == media_type)
            .cloned())
    }

    fn source(&self) -> Source {
        self.source
    }

    fn media_types(&self) -> Vec<MediaType> {
        let mut types: Vec<MediaType> = self.items.iter().map(|i| i.media_type).collect();
        types.dedup();
        types
    }

    fn name(&self) -> &'static str {
        self.source.as_str()
    }
}

fn item(source: Source, id: &str, media_type: MediaType, title: &str, genres: &[&str]) -> MediaItem {
    let mut item = MediaItem::new(source, id, media_type, title);
    item.genres = genres.iter().map(|g| g.to_string()).collect();
    item
}

fn create_test_app() -> Router {
    let tmdb = StubProvider {
        source: Source::Tmdb,
        items: vec![
            item(Source::Tmdb, "438631", MediaType::Film, "Dune", &["Science Fiction"]),
            item(Source::Tmdb, "693134", MediaType::Film, "Dune: Part Two", &["Science Fiction"]),
            item(Source::Tmdb, "1399", MediaType::Tv, "Game of Thrones", &["Fantasy"]),
        ],
    };
    let jikan = StubProvider {
        source: Source::Mal,
        items: vec![item(Source::Mal, "52991", MediaType::Anime, "Frieren", &["Fantasy", "Adventure"])],
    };

    let state = Arc::new(AppState {
        store: Arc::new(MemoryStore::new()),
        auth: Arc::new(StaticAuth::new().with_token(TOKEN, Uuid::new_v4())),
        catalog: Catalog::new(vec![Arc::new(tmdb), Arc::new(jikan)]),
    });

    create_router(state)
}

/// Memory store whose activity feed is unavailable
struct NoActivityStore(MemoryStore);

#[async_trait::async_trait]
impl LibraryStore for NoActivityStore {
    async fn list_entries(&self, user_id: Uuid, filter: &LibraryFilter) -> AppResult<Vec<LibraryEntry>> {
        self.0.list_entries(user_id, filter).await
    }

    async fn get_entry(&self, user_id: Uuid, media_id: &str) -> AppResult<Option<LibraryEntry>> {
        self.0.get_entry(user_id, media_id).await
    }

    async fn upsert_entry(&self, entry: LibraryEntry) -> AppResult<LibraryEntry> {
        self.0.upsert_entry(entry).await
    }

    async fn delete_entry(&self, user_id: Uuid, media_id: &str) -> AppResult<bool> {
        self.0.delete_entry(user_id, media_id).await
    }

    async fn list_activity(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<ActivityEntry>> {
        self.0.list_activity(user_id, limit).await
    }

    async fn insert_activity(&self, _entry: ActivityEntry) -> AppResult<ActivityEntry> {
        Err(AppError::Internal("activity table unavailable".into()))
    }

    async fn list_reviews(&self, filter: &ReviewFilter) -> AppResult<Vec<Review>> {
        self.0.list_reviews(filter).await
    }

    async fn get_review(&self, id: Uuid) -> AppResult<Option<Review>> {
        self.0.get_review(id).await
    }

    async fn save_review(&self, review: Review) -> AppResult<Review> {
        self.0.save_review(review).await
    }

    fn name(&self) -> &'static str {
        "no-activity"
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap()
}

fn send_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    assert_eq!(body_json(response).await, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_search_ranks_exact_match_first() {
    let app = create_test_app();
    let response = app.oneshot(get("/api/search-all?q=dune")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let results = body_json(response).await;
    assert_eq!(results[0]["title"], "Dune");
    assert_eq!(results[1]["title"], "Dune: Part Two");
    assert_eq!(results[0]["id"], results[0]["slug"]);
}

#[tokio::test]
async fn test_search_requires_query() {
    let app = create_test_app();
    let response = app.oneshot(get("/api/search-all?q=")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_home_carousels_cache_header() {
    let app = create_test_app();
    let response = app.oneshot(get("/api/home-carousels")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, s-maxage=3600, stale-while-revalidate=86400"
    );

    let carousels = body_json(response).await;
    let keys: Vec<&str> = carousels
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["trending_films", "popular_tv", "airing_anime"]);
}

#[tokio::test]
async fn test_media_lookup() {
    let app = create_test_app();

    let response = app.clone().oneshot(get("/api/media/tmdb-1399")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["media_type"], "tv");

    let response = app.clone().oneshot(get("/api/media/mal-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/api/media/nonsense")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_library_requires_auth() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/library").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/library")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_library_crud_records_activity() {
    let app = create_test_app();
    let media = json!({ "title": "Frieren", "media_type": "anime", "genres": ["Fantasy"] });

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/library",
            json!({ "media_id": "mal-52991", "media": media, "status": "in_progress", "rating": 9 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(send_json(
            "PATCH",
            "/api/library",
            json!({ "media_id": "mal-52991", "status": "completed", "progress": 28 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "completed");

    let response = app
        .clone()
        .oneshot(get("/api/library?status=completed&type=anime"))
        .await
        .unwrap();
    let entries = body_json(response).await;
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["progress"], 28);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/library?media_id=mal-52991")
                .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get("/api/activity?limit=2")).await.unwrap();
    let activity = body_json(response).await;
    assert_eq!(activity.as_array().unwrap().len(), 2);
    assert_eq!(activity[0]["action"], "library_remove");
}

#[tokio::test]
async fn test_library_validation() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/library",
            json!({ "media_id": "mal-1", "media": { "title": "X", "media_type": "anime" }, "rating": 11 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(send_json("POST", "/api/library", json!({ "media_id": "mal-1" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(send_json("PATCH", "/api/library", json!({ "media_id": "mal-404", "progress": 1 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_library_type_filter_accepts_aliases() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/library",
            json!({ "media_id": "tmdb-438631", "media": { "title": "Dune", "media_type": "film" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    for uri in ["/api/library?type=all", "/api/library?type=movie", "/api/library?type="] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1, "{}", uri);
    }

    let response = app.oneshot(get("/api/library?type=podcast")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_library_write_survives_activity_failure() {
    let state = Arc::new(AppState {
        store: Arc::new(NoActivityStore(MemoryStore::new())),
        auth: Arc::new(StaticAuth::new().with_token(TOKEN, Uuid::new_v4())),
        catalog: Catalog::new(vec![]),
    });
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/library",
            json!({ "media_id": "mal-52991", "media": { "title": "Frieren", "media_type": "anime" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(send_json("PATCH", "/api/library", json!({ "media_id": "mal-52991", "progress": 3 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/library")).await.unwrap();
    let entries = body_json(response).await;
    assert_eq!(entries[0]["progress"], 3);
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let app = create_test_app();

    let cases = [
        ("PATCH", "/api/reviews", json!({ "body": "x" })),
        ("POST", "/api/import/steam/confirm", json!({ "selected": [0] })),
        (
            "POST",
            "/api/library",
            json!({ "media_id": "mal-1", "media": { "title": "X", "media_type": "anime" }, "status": "watching" }),
        ),
    ];

    for (method, uri, body) in cases {
        let response = app.clone().oneshot(send_json(method, uri, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{} {}", method, uri);
        assert!(body_json(response).await["error"].is_string(), "{} {}", method, uri);
    }

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/library")
                .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reviews_round_trip() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/reviews",
            json!({ "media_id": "tmdb-438631", "rating": 8.5, "body": "Spice must flow." }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let review_id = body_json(response).await["id"].clone();

    let response = app
        .clone()
        .oneshot(send_json(
            "PATCH",
            "/api/reviews",
            json!({ "id": review_id, "contains_spoilers": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/api/reviews?media_id=tmdb-438631"))
        .await
        .unwrap();
    let reviews = body_json(response).await;
    assert_eq!(reviews[0]["contains_spoilers"], true);

    let response = app
        .oneshot(send_json("POST", "/api/reviews", json!({ "media_id": "tmdb-438631", "body": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommendations_exclude_library() {
    let app = create_test_app();

    app.clone()
        .oneshot(send_json(
            "POST",
            "/api/library",
            json!({
                "media_id": "tmdb-1399",
                "media": { "title": "Game of Thrones", "media_type": "tv", "genres": ["Fantasy"] },
                "status": "completed",
                "rating": 9
            }),
        ))
        .await
        .unwrap();

    let response = app.oneshot(get("/api/recommendations")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let recommendations = body_json(response).await;
    let ids: Vec<&str> = recommendations
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["media"]["id"].as_str().unwrap())
        .collect();
    assert!(!ids.contains(&"tmdb-1399"));
    assert_eq!(ids[0], "mal-52991");
    assert!(recommendations[0]["score"].as_u64().unwrap() <= 99);
}

#[tokio::test]
async fn test_import_preview_and_confirm() {
    let app = create_test_app();
    let csv = "Book Id,Title,Author,My Rating,Exclusive Shelf\n1,Dune,Frank Herbert,5,read\n2,Emma,Jane Austen,0,to-read\n";

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import/goodreads")
                .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
                .body(Body::from(csv))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let preview = body_json(response).await;
    assert_eq!(preview["platform"], "goodreads");
    assert_eq!(preview["items"].as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/import/goodreads/confirm",
            json!({ "content": csv, "selected": [1] }),
        ))
        .await
        .unwrap();
    let confirmed = body_json(response).await;
    assert_eq!(confirmed["items"][0]["title"], "Emma");

    let response = app
        .oneshot(send_json(
            "POST",
            "/api/import/goodreads/confirm",
            json!({ "content": csv, "selected": [5] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_share_card_is_public_svg() {
    let app = create_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/og?name=Ann&personality=The%20Critic&total=12")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let svg = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(svg.contains("The Critic"));
}

#[tokio::test]
async fn test_wrapped_summary() {
    let app = create_test_app();

    app.clone()
        .oneshot(send_json(
            "POST",
            "/api/library",
            json!({
                "media_id": "mal-52991",
                "media": { "title": "Frieren", "media_type": "anime", "genres": ["Fantasy"] },
                "status": "completed"
            }),
        ))
        .await
        .unwrap();

    let response = app.oneshot(get("/api/wrapped")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let wrapped = body_json(response).await;
    assert_eq!(wrapped["total"], 1);
    assert_eq!(wrapped["completed"], 1);
    assert_eq!(wrapped["top_genres"][0]["genre"], "Fantasy");
    assert_eq!(wrapped["personality"]["archetype"], "worldbuilder");
}
