use serde::{Deserialize, Serialize};

/// Identifier of a Hacker News item.
pub type StoryId = u64;

/// Display fields of a story. Everything else the item endpoint returns is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub title: Option<String>,
    pub url: Option<String>,
}

impl Story {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            url: Some(url.into()),
        }
    }
}

pub type StoryList = Vec<Story>;
