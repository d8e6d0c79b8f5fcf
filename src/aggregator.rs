//! Fetch, merge and cache the current top stories.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::cache::StoryCache;
use crate::envelope::ResponseEnvelope;
use crate::hacker_news::{StorySource, UpstreamError};
use crate::story::{Story, StoryId, StoryList};

pub const CACHE_KEY: &str = "LatestStories";
pub const MAX_STORIES: usize = 200;
pub const CACHE_TTL: Duration = Duration::from_secs(10 * 60);

pub const MSG_FROM_CACHE: &str = "Stories retrieved from cache.";
pub const MSG_NO_STORIES: &str = "No stories found.";
pub const MSG_RETRIEVED: &str = "Stories retrieved successfully.";
pub const MSG_FAILED: &str = "An error occurred while fetching latest stories.";

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("failed to fetch story id list: {0}")]
    IdList(#[source] UpstreamError),

    #[error("story fetch task failed: {0}")]
    Task(#[from] JoinError),
}

impl AggregateError {
    pub fn status_code(&self) -> u16 {
        match self {
            AggregateError::IdList(err) => err.status().unwrap_or(500),
            AggregateError::Task(_) => 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub max_stories: usize,
    pub cache_ttl: Duration,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            max_stories: MAX_STORIES,
            cache_ttl: CACHE_TTL,
        }
    }
}

enum Outcome {
    Fetched(Arc<StoryList>),
    NoStories,
}

pub struct StoryAggregator {
    source: Arc<dyn StorySource>,
    cache: Arc<dyn StoryCache>,
    settings: AggregatorSettings,
}

impl StoryAggregator {
    pub fn new(
        source: Arc<dyn StorySource>,
        cache: Arc<dyn StoryCache>,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            source,
            cache,
            settings,
        }
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Returns the latest stories, from cache when fresh.
    ///
    /// Failures are always expressed as a failure envelope. Stories whose
    /// details cannot be fetched are left out of the list without affecting
    /// the overall outcome.
    pub async fn get_latest_stories(&self) -> ResponseEnvelope<Arc<StoryList>> {
        if let Some(cached) = self.cache.get(CACHE_KEY).await {
            info!(count = cached.len(), "Returning top stories from cache");
            return ResponseEnvelope::success(cached, MSG_FROM_CACHE);
        }

        match self.refresh().await {
            Ok(Outcome::Fetched(stories)) => ResponseEnvelope::success(stories, MSG_RETRIEVED),
            Ok(Outcome::NoStories) => ResponseEnvelope::success(Arc::new(vec![]), MSG_NO_STORIES),
            Err(err) => {
                error!(error = %err, "{}", MSG_FAILED);
                ResponseEnvelope::failure(err.status_code(), MSG_FAILED, err.to_string())
            }
        }
    }

    async fn refresh(&self) -> Result<Outcome, AggregateError> {
        info!("Fetching latest stories from Hacker News");
        let mut ids = self
            .source
            .fetch_id_list()
            .await
            .map_err(AggregateError::IdList)?;

        if ids.is_empty() {
            warn!("Received empty story list from Hacker News");
            return Ok(Outcome::NoStories);
        }

        ids.truncate(self.settings.max_stories);

        let stories = Arc::new(self.fetch_stories(ids).await?);

        self.cache
            .set(CACHE_KEY, Arc::clone(&stories), self.settings.cache_ttl)
            .await;
        info!(count = stories.len(), "Stored latest stories in cache");

        Ok(Outcome::Fetched(stories))
    }

    /// Fetches every story concurrently and merges them back into id order.
    ///
    /// All tasks run to completion before the merge, even if one of them fails.
    async fn fetch_stories(&self, ids: Vec<StoryId>) -> Result<StoryList, AggregateError> {
        let mut tasks = JoinSet::new();

        for (index, id) in ids.iter().copied().enumerate() {
            let source = Arc::clone(&self.source);
            tasks.spawn(async move { (index, source.fetch_detail(id).await.ok()) });
        }

        let mut slots: Vec<Option<Story>> = vec![None; ids.len()];
        let mut task_error = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, story)) => slots[index] = story,
                Err(err) => {
                    task_error.get_or_insert(err);
                }
            }
        }

        if let Some(err) = task_error {
            return Err(err.into());
        }

        let stories: StoryList = slots.into_iter().flatten().collect();
        if stories.len() < ids.len() {
            warn!(
                requested = ids.len(),
                resolved = stories.len(),
                "Some stories could not be fetched"
            );
        }

        Ok(stories)
    }
}
