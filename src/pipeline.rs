//! Listing → article → summary orchestration.
//!
//! Every network and model boundary returns a `Result`; [`degrade`] is the
//! single place where a failure becomes a default value plus a [`Notice`].
//! Nothing here can end the session.

use crate::cache::{CacheKey, ResponseCache};
use crate::config::AppConfig;
use crate::error::{FetchError, SummarizationError};
use crate::fetch::PageSource;
use crate::models::{ArticleDigest, NewsLink, Notice};
use crate::scrapers::naver;
use crate::summarizer::{Summarizer, SummaryModel};
use std::fmt::Display;
use tracing::{info, instrument, warn};

pub const MSG_NO_NEWS: &str = "가져온 뉴스가 없습니다. 나중에 다시 시도해주세요.";
pub const MSG_NO_BODY: &str = "기사 본문을 가져올 수 없습니다.";
pub const MSG_NO_SUMMARY: &str = "요약을 생성할 수 없습니다.";

const CTX_LISTING: &str = "뉴스 링크를 가져오는 중 오류 발생";
const CTX_ARTICLE: &str = "기사 본문을 가져오는 중 오류 발생";
const CTX_SUMMARY: &str = "요약 중 오류 발생";

/// Unwrap `result`, or record the raw error as a notice and fall back to
/// `T::default()`.
pub fn degrade<T: Default, E: Display>(
    result: Result<T, E>,
    context: &str,
    notices: &mut Vec<Notice>,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, context, "Degrading to empty result");
            notices.push(Notice::error(format!("{context}: {e}")));
            T::default()
        }
    }
}

/// Fetcher, scraper and summarizer wired together with one shared cache.
pub struct Pipeline<S, M> {
    source: S,
    summarizer: Summarizer<M>,
    cache: ResponseCache,
    listing_url: String,
    origin: String,
    max_links: usize,
}

impl<S: PageSource, M: SummaryModel> Pipeline<S, M> {
    pub fn new(
        source: S,
        summarizer: Summarizer<M>,
        cache: ResponseCache,
        config: &AppConfig,
    ) -> Self {
        Self {
            source,
            summarizer,
            cache,
            listing_url: config.listing_url.clone(),
            origin: config.origin.clone(),
            max_links: config.max_links,
        }
    }

    pub fn listing_url(&self) -> &str {
        &self.listing_url
    }

    /// Links from the listing page, memoized per URL and cap.
    pub async fn links(&self) -> Result<Vec<NewsLink>, FetchError> {
        let key = CacheKey::Listing {
            url: self.listing_url.clone(),
            max: self.max_links,
        };
        self.cache
            .get_or_try_insert(
                key,
                naver::index_articles(&self.source, &self.listing_url, &self.origin, self.max_links),
            )
            .await
    }

    /// Body text of one article, memoized per URL.
    pub async fn article_text(&self, url: &str) -> Result<String, FetchError> {
        let key = CacheKey::Article {
            url: url.to_string(),
        };
        self.cache
            .get_or_try_insert(key, naver::fetch_article(&self.source, url))
            .await
    }

    pub async fn summarize(&self, text: &str) -> Result<String, SummarizationError> {
        self.summarizer.summarize(text).await
    }

    /// Fetch the listing, degrading failures and emptiness to notices.
    #[instrument(level = "info", skip(self), fields(url = %self.listing_url))]
    pub async fn load_listing(&self) -> (Vec<NewsLink>, Vec<Notice>) {
        let mut notices = Vec::new();
        let links = degrade(
            self.links().await,
            CTX_LISTING,
            &mut notices,
        );
        if links.is_empty() {
            notices.push(Notice::warning(MSG_NO_NEWS));
        }
        info!(count = links.len(), "Listing ready");
        (links, notices)
    }

    /// Fetch and summarize one article. Summarization is only attempted
    /// when the body is non-empty.
    #[instrument(level = "info", skip_all, fields(url = %link.url))]
    pub async fn digest_article(&self, link: &NewsLink) -> ArticleDigest {
        let mut digest = ArticleDigest::new(link);

        let body = degrade(
            self.article_text(&link.url).await,
            CTX_ARTICLE,
            &mut digest.notices,
        );
        if body.is_empty() {
            digest.notices.push(Notice::warning(MSG_NO_BODY));
            return digest;
        }

        let summary = degrade(
            self.summarize(&body).await,
            CTX_SUMMARY,
            &mut digest.notices,
        );
        if summary.is_empty() {
            digest.notices.push(Notice::warning(MSG_NO_SUMMARY));
        } else {
            digest.summary = Some(summary);
        }
        info!(summarized = digest.summary.is_some(), "Article processed");
        digest
    }
}
