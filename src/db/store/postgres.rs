use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::{LibraryStore, ReviewFilter};
use crate::{
    error::{AppError, AppResult},
    models::{ActivityEntry, LibraryEntry, LibraryFilter, MediaSnapshot, Review},
};

/// Postgres-backed store for the hosted database
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct LibraryRow {
    user_id: Uuid,
    media_id: String,
    media: Json<MediaSnapshot>,
    status: String,
    progress: i32,
    rating: Option<f64>,
    favorite: bool,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LibraryRow> for LibraryEntry {
    type Error = AppError;

    fn try_from(row: LibraryRow) -> Result<Self, Self::Error> {
        Ok(LibraryEntry {
            user_id: row.user_id,
            media_id: row.media_id,
            media: row.media.0,
            status: row.status.parse().map_err(AppError::Internal)?,
            progress: row.progress.max(0) as u32,
            rating: row.rating,
            favorite: row.favorite,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ActivityRow {
    id: Uuid,
    user_id: Uuid,
    media_id: String,
    action: String,
    detail: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityEntry {
    fn from(row: ActivityRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            media_id: row.media_id,
            action: row.action,
            detail: row.detail,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    media_id: String,
    rating: Option<f64>,
    body: String,
    contains_spoilers: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            media_id: row.media_id,
            rating: row.rating,
            body: row.body,
            contains_spoilers: row.contains_spoilers,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const LIBRARY_COLUMNS: &str = "user_id, media_id, media, status, progress, rating, favorite, notes, created_at, updated_at";

#[async_trait::async_trait]
impl LibraryStore for PgStore {
    async fn list_entries(
        &self,
        user_id: Uuid,
        filter: &LibraryFilter,
    ) -> AppResult<Vec<LibraryEntry>> {
        let sql = format!(
            r#"
            SELECT {LIBRARY_COLUMNS}
            FROM library_entries
            WHERE user_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR media->>'media_type' = $3)
            ORDER BY updated_at DESC
            "#
        );

        let rows: Vec<LibraryRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.media_type.map(|t| t.as_str()))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(LibraryEntry::try_from).collect()
    }

    async fn get_entry(&self, user_id: Uuid, media_id: &str) -> AppResult<Option<LibraryEntry>> {
        let sql = format!(
            "SELECT {LIBRARY_COLUMNS} FROM library_entries WHERE user_id = $1 AND media_id = $2"
        );

        let row: Option<LibraryRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(media_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(LibraryEntry::try_from).transpose()
    }

    async fn upsert_entry(&self, entry: LibraryEntry) -> AppResult<LibraryEntry> {
        let sql = format!(
            r#"
            INSERT INTO library_entries ({LIBRARY_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id, media_id) DO UPDATE SET
                media = EXCLUDED.media,
                status = EXCLUDED.status,
                progress = EXCLUDED.progress,
                rating = EXCLUDED.rating,
                favorite = EXCLUDED.favorite,
                notes = EXCLUDED.notes,
                updated_at = EXCLUDED.updated_at
            RETURNING {LIBRARY_COLUMNS}
            "#
        );

        let row: LibraryRow = sqlx::query_as(&sql)
            .bind(entry.user_id)
            .bind(&entry.media_id)
            .bind(Json(&entry.media))
            .bind(entry.status.as_str())
            .bind(entry.progress.min(i32::MAX as u32) as i32)
            .bind(entry.rating)
            .bind(entry.favorite)
            .bind(&entry.notes)
            .bind(entry.created_at)
            .bind(entry.updated_at)
            .fetch_one(&self.pool)
            .await?;

        LibraryEntry::try_from(row)
    }

    async fn delete_entry(&self, user_id: Uuid, media_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM library_entries WHERE user_id = $1 AND media_id = $2")
            .bind(user_id)
            .bind(media_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_activity(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<ActivityEntry>> {
        let rows: Vec<ActivityRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, media_id, action, detail, created_at
            FROM activity
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ActivityEntry::from).collect())
    }

    async fn insert_activity(&self, entry: ActivityEntry) -> AppResult<ActivityEntry> {
        sqlx::query(
            r#"
            INSERT INTO activity (id, user_id, media_id, action, detail, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.media_id)
        .bind(&entry.action)
        .bind(&entry.detail)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn list_reviews(&self, filter: &ReviewFilter) -> AppResult<Vec<Review>> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, media_id, rating, body, contains_spoilers, created_at, updated_at
            FROM reviews
            WHERE ($1::text IS NULL OR media_id = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.media_id.as_deref())
        .bind(filter.user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn get_review(&self, id: Uuid) -> AppResult<Option<Review>> {
        let row: Option<ReviewRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, media_id, rating, body, contains_spoilers, created_at, updated_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Review::from))
    }

    async fn save_review(&self, review: Review) -> AppResult<Review> {
        let row: ReviewRow = sqlx::query_as(
            r#"
            INSERT INTO reviews (id, user_id, media_id, rating, body, contains_spoilers, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                rating = EXCLUDED.rating,
                body = EXCLUDED.body,
                contains_spoilers = EXCLUDED.contains_spoilers,
                updated_at = EXCLUDED.updated_at
            RETURNING id, user_id, media_id, rating, body, contains_spoilers, created_at, updated_at
            "#,
        )
        .bind(review.id)
        .bind(review.user_id)
        .bind(&review.media_id)
        .bind(review.rating)
        .bind(&review.body)
        .bind(review.contains_spoilers)
        .bind(review.created_at)
        .bind(review.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(Review::from(row))
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
