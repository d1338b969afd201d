//! Persistence for user-owned records (library, activity, reviews).
//!
//! Catalog data is never stored here; only what a user did with a title.

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{ActivityEntry, LibraryEntry, LibraryFilter, Review},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Which reviews to list
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub media_id: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Storage backend for library entries, activity, and reviews
///
/// Library entries are keyed by `(user_id, media_id)`; `upsert_entry` is
/// last-write-wins but keeps the original `created_at`.
#[async_trait::async_trait]
pub trait LibraryStore: Send + Sync {
    /// Entries for a user, most recently updated first
    async fn list_entries(
        &self,
        user_id: Uuid,
        filter: &LibraryFilter,
    ) -> AppResult<Vec<LibraryEntry>>;

    async fn get_entry(&self, user_id: Uuid, media_id: &str) -> AppResult<Option<LibraryEntry>>;

    async fn upsert_entry(&self, entry: LibraryEntry) -> AppResult<LibraryEntry>;

    /// Returns whether an entry was removed
    async fn delete_entry(&self, user_id: Uuid, media_id: &str) -> AppResult<bool>;

    /// Newest first, at most `limit` rows
    async fn list_activity(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<ActivityEntry>>;

    async fn insert_activity(&self, entry: ActivityEntry) -> AppResult<ActivityEntry>;

    /// Newest first
    async fn list_reviews(&self, filter: &ReviewFilter) -> AppResult<Vec<Review>>;

    async fn get_review(&self, id: Uuid) -> AppResult<Option<Review>>;

    /// Inserts a new review or replaces the one with the same id
    async fn save_review(&self, review: Review) -> AppResult<Review>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
