//! Data models for scraped links and their summaries.
//!
//! - [`NewsLink`]: a title and absolute URL taken from the listing page
//! - [`ArticleDigest`]: the rendered outcome for one article
//! - [`Digest`]: one eager run over the whole listing, serializable to JSON
//! - [`Notice`]: a non-fatal message shown to the user
//!
//! None of these are persisted between sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A candidate article discovered on the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsLink {
    /// Trimmed headline text.
    pub title: String,
    /// Absolute article URL, unique within one listing fetch.
    pub url: String,
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A user-visible message produced when a pipeline step degrades.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NoticeLevel::Warning => write!(f, "warning: {}", self.message),
            NoticeLevel::Error => write!(f, "error: {}", self.message),
        }
    }
}

/// Outcome of fetching and summarizing a single article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleDigest {
    pub title: String,
    pub url: String,
    /// `None` when the body or the summary could not be produced.
    pub summary: Option<String>,
    /// Warnings and raw error messages collected along the way.
    pub notices: Vec<Notice>,
}

impl ArticleDigest {
    pub fn new(link: &NewsLink) -> Self {
        Self {
            title: link.title.clone(),
            url: link.url.clone(),
            summary: None,
            notices: Vec::new(),
        }
    }
}

/// One eager pass over the listing page.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Digest {
    /// Local date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// Local time of the run.
    pub local_time: String,
    /// Listing page the links came from.
    pub source_url: String,
    pub articles: Vec<ArticleDigest>,
    /// Notices about the listing itself (e.g. nothing found).
    pub notices: Vec<Notice>,
}
