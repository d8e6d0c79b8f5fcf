use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::story::{Story, StoryId};

pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("item {0} not found")]
    Missing(StoryId),
}

impl UpstreamError {
    /// HTTP status reported by the upstream, if a response was received at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status(code) => Some(*code),
            UpstreamError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Read-only access to the story id list and story details.
///
/// Implementations make exactly one attempt per call and report every failure
/// as an `UpstreamError`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorySource: Send + Sync {
    async fn fetch_id_list(&self) -> Result<Vec<StoryId>, UpstreamError>;
    async fn fetch_detail(&self, id: StoryId) -> Result<Story, UpstreamError>;
}

fn build_user_agent() -> HeaderMap {
    let custom_user_agent = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(custom_user_agent));
    headers
}

pub struct HackerNewsClient {
    client: reqwest::Client,
    base_url: String,
}

impl HackerNewsClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .default_headers(build_user_agent())
            .timeout(timeout)
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn top_stories_url(&self) -> String {
        format!("{}/topstories.json", self.base_url)
    }

    pub fn item_url(&self, id: StoryId) -> String {
        format!("{}/item/{}.json", self.base_url, id)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl StorySource for HackerNewsClient {
    async fn fetch_id_list(&self) -> Result<Vec<StoryId>, UpstreamError> {
        let url = self.top_stories_url();
        self.fetch_json(&url).await.inspect_err(|err| {
            warn!(url = %url, error = %err, "Failed to fetch story id list");
        })
    }

    async fn fetch_detail(&self, id: StoryId) -> Result<Story, UpstreamError> {
        let url = self.item_url(id);

        // unknown or deleted items come back as a literal `null`
        let result = match self.fetch_json::<Option<Story>>(&url).await {
            Ok(Some(story)) => Ok(story),
            Ok(None) => Err(UpstreamError::Missing(id)),
            Err(err) => Err(err),
        };

        result.inspect_err(|err| {
            warn!(url = %url, error = %err, "Failed to fetch story details");
        })
    }
}
