use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LibraryStore, ReviewFilter};
use crate::{
    error::AppResult,
    models::{ActivityEntry, LibraryEntry, LibraryFilter, Review},
};

/// In-process store, used for tests and `DATABASE_URL=memory`
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    entries: HashMap<(Uuid, String), LibraryEntry>,
    activity: Vec<ActivityEntry>,
    reviews: HashMap<Uuid, Review>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LibraryStore for MemoryStore {
    async fn list_entries(
        &self,
        user_id: Uuid,
        filter: &LibraryFilter,
    ) -> AppResult<Vec<LibraryEntry>> {
        let inner = self.inner.read().await;
        let mut entries: Vec<LibraryEntry> = inner
            .entries
            .values()
            .filter(|e| e.user_id == user_id && filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(entries)
    }

    async fn get_entry(&self, user_id: Uuid, media_id: &str) -> AppResult<Option<LibraryEntry>> {
        let inner = self.inner.read().await;
        Ok(inner.entries.get(&(user_id, media_id.to_string())).cloned())
    }

    async fn upsert_entry(&self, mut entry: LibraryEntry) -> AppResult<LibraryEntry> {
        let mut inner = self.inner.write().await;
        let key = (entry.user_id, entry.media_id.clone());
        if let Some(existing) = inner.entries.get(&key) {
            entry.created_at = existing.created_at;
        }
        inner.entries.insert(key, entry.clone());
        Ok(entry)
    }

    async fn delete_entry(&self, user_id: Uuid, media_id: &str) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .entries
            .remove(&(user_id, media_id.to_string()))
            .is_some())
    }

    async fn list_activity(&self, user_id: Uuid, limit: usize) -> AppResult<Vec<ActivityEntry>> {
        let inner = self.inner.read().await;
        let mut activity: Vec<ActivityEntry> = inner
            .activity
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        // Insertion order breaks ties between rows written in the same instant
        activity.reverse();
        activity.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        activity.truncate(limit);
        Ok(activity)
    }

    async fn insert_activity(&self, entry: ActivityEntry) -> AppResult<ActivityEntry> {
        let mut inner = self.inner.write().await;
        inner.activity.push(entry.clone());
        Ok(entry)
    }

    async fn list_reviews(&self, filter: &ReviewFilter) -> AppResult<Vec<Review>> {
        let inner = self.inner.read().await;
        let mut reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|r| filter.media_id.as_ref().map_or(true, |m| &r.media_id == m))
            .filter(|r| filter.user_id.map_or(true, |u| r.user_id == u))
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn get_review(&self, id: Uuid) -> AppResult<Option<Review>> {
        let inner = self.inner.read().await;
        Ok(inner.reviews.get(&id).cloned())
    }

    async fn save_review(&self, review: Review) -> AppResult<Review> {
        let mut inner = self.inner.write().await;
        inner.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
