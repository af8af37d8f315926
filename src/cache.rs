//! Process-local, time-bounded memoization.
//!
//! Entries are keyed by which operation produced them plus that operation's
//! normalized arguments, and expire a fixed time after insertion. There is no
//! other eviction. Only successful, non-empty results are stored, so a
//! failed fetch or an empty body is retried on the next request.

use crate::models::NewsLink;
use moka::future::Cache;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace};

/// Operation identity plus normalized arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Links extracted from a listing page, capped at `max`.
    Listing { url: String, max: usize },
    /// Body text of one article page.
    Article { url: String },
    /// Summary of an input already truncated to the model's budget.
    Summary { input: String },
}

/// Anything the cache can hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    Links(Vec<NewsLink>),
    Text(String),
}

impl CachedValue {
    fn is_empty(&self) -> bool {
        match self {
            CachedValue::Links(links) => links.is_empty(),
            CachedValue::Text(text) => text.is_empty(),
        }
    }
}

impl From<Vec<NewsLink>> for CachedValue {
    fn from(links: Vec<NewsLink>) -> Self {
        CachedValue::Links(links)
    }
}

impl From<String> for CachedValue {
    fn from(text: String) -> Self {
        CachedValue::Text(text)
    }
}

impl TryFrom<CachedValue> for Vec<NewsLink> {
    type Error = CachedValue;

    fn try_from(value: CachedValue) -> Result<Self, Self::Error> {
        match value {
            CachedValue::Links(links) => Ok(links),
            other => Err(other),
        }
    }
}

impl TryFrom<CachedValue> for String {
    type Error = CachedValue;

    fn try_from(value: CachedValue) -> Result<Self, Self::Error> {
        match value {
            CachedValue::Text(text) => Ok(text),
            other => Err(other),
        }
    }
}

/// TTL cache shared by the listing, article and summary paths.
///
/// A disabled cache always computes and never stores.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Option<Cache<CacheKey, CachedValue>>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("enabled", &self.entries.is_some())
            .field("entries", &self.entries.as_ref().map(|c| c.entry_count()))
            .finish()
    }
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Some(Cache::builder().time_to_live(ttl).build()),
        }
    }

    pub fn disabled() -> Self {
        Self { entries: None }
    }

    /// Return the live entry for `key`, or run `compute`, store its result
    /// and return it.
    ///
    /// Errors and empty values pass through without being stored.
    pub async fn get_or_try_insert<V, E, Fut>(&self, key: CacheKey, compute: Fut) -> Result<V, E>
    where
        V: Into<CachedValue> + TryFrom<CachedValue> + Clone,
        Fut: Future<Output = Result<V, E>>,
    {
        let Some(entries) = &self.entries else {
            return compute.await;
        };

        if let Some(hit) = entries.get(&key).await {
            match V::try_from(hit) {
                Ok(value) => {
                    debug!(?key, "Cache hit");
                    return Ok(value);
                }
                Err(_) => trace!(?key, "Cached value has unexpected shape; recomputing"),
            }
        }

        let value = compute.await?;
        let cached: CachedValue = value.clone().into();
        if cached.is_empty() {
            trace!(?key, "Not caching empty value");
        } else {
            entries.insert(key, cached).await;
        }
        Ok(value)
    }
}
