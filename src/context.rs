//! Build-time collaborators shared by every card in one build
//!
//! The only mutable state touched while composing cards lives behind
//! [`MediaProvider`]. It is injected through [`BuildContext`] rather than
//! reached through a global, so each build decides which allocator it uses.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors raised by a media provider
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// No item matches the query, even after a reset
    #[error("no media available for {query}")]
    Exhausted { query: String },

    /// The matching item cannot be handed out
    #[error("media item '{slug}' has no url")]
    NoUrl { slug: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Image,
    Video,
}

/// One stock asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub format: MediaFormat,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub slug: String,
}

/// Filter for media lookups; every listed tag must be present
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaQuery {
    pub format: Option<MediaFormat>,
    pub tags: Vec<String>,
}

impl MediaQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: MediaFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Restrict to an aspect ratio tag such as `aspect:portrait`
    pub fn aspect(self, aspect: &str) -> Self {
        self.tag(format!("aspect:{}", aspect))
    }

    pub fn matches(&self, item: &MediaItem) -> bool {
        if let Some(format) = self.format {
            if item.format != format {
                return false;
            }
        }
        self.tags.iter().all(|tag| item.tags.contains(tag))
    }
}

impl fmt::Display for MediaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            Some(MediaFormat::Image) => f.write_str("image")?,
            Some(MediaFormat::Video) => f.write_str("video")?,
            None => f.write_str("any format")?,
        }
        if !self.tags.is_empty() {
            write!(f, " tagged [{}]", self.tags.join(", "))?;
        }
        Ok(())
    }
}

/// Source of stock media for default configurations
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Hand out one unused item matching the query
    async fn pick(&self, query: MediaQuery) -> Result<MediaItem, MediaError>;

    /// Every unused item matching the query
    async fn all(&self, query: MediaQuery) -> Vec<MediaItem>;

    /// First item whose slug contains `partial`, ignoring case
    async fn by_slug(&self, partial: &str) -> Option<MediaItem>;
}

/// In-memory media allocator
///
/// Items are handed out in collection order and never twice until every
/// match has been used, at which point the used set is cleared.
#[derive(Debug, Default)]
pub struct StockMedia {
    items: Vec<MediaItem>,
    used: Mutex<HashSet<String>>,
}

impl StockMedia {
    pub fn new(items: Vec<MediaItem>) -> Self {
        Self {
            items,
            used: Mutex::new(HashSet::new()),
        }
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    fn available<'a>(&'a self, used: &HashSet<String>, query: &MediaQuery) -> Vec<&'a MediaItem> {
        self.items
            .iter()
            .filter(|item| !used.contains(&item.url) && query.matches(item))
            .collect()
    }

    /// Forget which items were handed out
    pub async fn reset(&self) {
        self.used.lock().await.clear();
    }
}

#[async_trait]
impl MediaProvider for StockMedia {
    async fn pick(&self, query: MediaQuery) -> Result<MediaItem, MediaError> {
        let mut used = self.used.lock().await;

        let mut candidates = self.available(&used, &query);
        if candidates.is_empty() && !used.is_empty() {
            tracing::debug!(%query, "media exhausted, resetting used set");
            used.clear();
            candidates = self.available(&used, &query);
        }

        let item = match candidates.first() {
            Some(item) => (*item).clone(),
            None => {
                return Err(MediaError::Exhausted {
                    query: query.to_string(),
                })
            }
        };

        if item.url.is_empty() {
            return Err(MediaError::NoUrl { slug: item.slug });
        }
        used.insert(item.url.clone());
        Ok(item)
    }

    async fn all(&self, query: MediaQuery) -> Vec<MediaItem> {
        let used = self.used.lock().await;
        self.available(&used, &query).into_iter().cloned().collect()
    }

    async fn by_slug(&self, partial: &str) -> Option<MediaItem> {
        let partial = partial.to_lowercase();
        self.items
            .iter()
            .find(|item| item.slug.to_lowercase().contains(&partial))
            .cloned()
    }
}

/// Collaborators available to loaders while a card tree is built
#[derive(Clone)]
pub struct BuildContext {
    pub media: Arc<dyn MediaProvider>,
}

impl BuildContext {
    pub fn new(media: Arc<dyn MediaProvider>) -> Self {
        Self { media }
    }

    /// Context with an empty media collection
    pub fn empty() -> Self {
        Self::new(Arc::new(StockMedia::default()))
    }
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext").finish_non_exhaustive()
    }
}
