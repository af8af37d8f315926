//! HTTP retrieval with browser-like headers.
//!
//! [`PageSource`] is the one interface the scrapers depend on. Two
//! implementations satisfy it:
//!
//! - [`HttpFetcher`]: a shared non-blocking `reqwest::Client` awaited on the
//!   runtime
//! - [`BlockingHttpFetcher`]: a `reqwest::blocking::Client` built fresh for
//!   each request and driven on the blocking thread pool
//!
//! [`Fetcher`] picks one at startup from [`FetchMode`]. Both send the same
//! headers, use the same timeout, and treat any non-2xx status as a
//! [`FetchError`].

use crate::config::{FetchConfig, FetchMode};
use crate::error::FetchError;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Anything that can turn a URL into a page body.
pub trait PageSource {
    /// GET `url` and return the decoded body text.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Build the spoofed browser header set from configuration.
///
/// Values that are not valid header text are skipped with a warning rather
/// than failing client construction.
pub fn browser_headers(config: &FetchConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let pairs: [(HeaderName, &str); 3] = [
        (USER_AGENT, config.user_agent.as_str()),
        (ACCEPT_LANGUAGE, config.accept_language.as_str()),
        (ACCEPT, config.accept.as_str()),
    ];
    for (name, value) in pairs {
        if value.is_empty() {
            continue;
        }
        match HeaderValue::from_str(value) {
            Ok(v) => {
                headers.insert(name, v);
            }
            Err(e) => warn!(header = %name, error = %e, "Skipping invalid header value"),
        }
    }
    headers
}

/// Non-blocking fetcher sharing one connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .default_headers(browser_headers(config))
            .timeout(config.timeout())
            .build()?;
        Ok(Self { client })
    }
}

impl PageSource for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

/// Blocking fetcher. Each call builds its own client on a blocking thread,
/// performs one request, and tears the client down again.
#[derive(Debug, Clone)]
pub struct BlockingHttpFetcher {
    headers: HeaderMap,
    timeout: Duration,
}

impl BlockingHttpFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            headers: browser_headers(config),
            timeout: config.timeout(),
        }
    }
}

fn blocking_get(url: &str, headers: HeaderMap, timeout: Duration) -> Result<String, FetchError> {
    let client = reqwest::blocking::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()?;
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text()?)
}

impl PageSource for BlockingHttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let owned_url = url.to_string();
        let headers = self.headers.clone();
        let timeout = self.timeout;
        let body = tokio::task::spawn_blocking(move || blocking_get(&owned_url, headers, timeout))
            .await
            .map_err(|e| FetchError::Join(e.to_string()))??;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page (blocking)"
        );
        Ok(body)
    }
}

/// The fetcher selected by configuration.
#[derive(Debug, Clone)]
pub enum Fetcher {
    Async(HttpFetcher),
    Blocking(BlockingHttpFetcher),
}

impl Fetcher {
    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        Ok(match config.mode {
            FetchMode::Async => Fetcher::Async(HttpFetcher::new(config)?),
            FetchMode::Blocking => Fetcher::Blocking(BlockingHttpFetcher::new(config)),
        })
    }
}

impl PageSource for Fetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        match self {
            Fetcher::Async(f) => f.fetch(url).await,
            Fetcher::Blocking(f) => f.fetch(url).await,
        }
    }
}
