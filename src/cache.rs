use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::story::StoryList;

/// Source of the current time, injectable so expiry can be tested.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Arc<StoryList>,
    pub stored_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(value: Arc<StoryList>, stored_at: DateTime<Utc>, ttl: Duration) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| stored_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            value,
            stored_at,
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Time-bounded store for aggregated story lists.
///
/// Values are handed out as shared snapshots; a stored list is never mutated.
#[async_trait]
pub trait StoryCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Arc<StoryList>>;
    async fn set(&self, key: &str, value: Arc<StoryList>, ttl: Duration);
}

pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoryCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Arc<StoryList>> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;

        // expired entries stay until the next set overwrites them
        if entry.is_expired(self.clock.now()) {
            return None;
        }

        Some(Arc::clone(&entry.value))
    }

    async fn set(&self, key: &str, value: Arc<StoryList>, ttl: Duration) {
        let entry = CacheEntry::new(value, self.clock.now(), ttl);
        self.entries.write().await.insert(key.to_string(), entry);
    }
}
