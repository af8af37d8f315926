//! Runtime configuration.
//!
//! Every field has a built-in default, so the application runs without any
//! file at all. A YAML file passed with `--config` overrides individual
//! fields; anything it leaves out keeps its default.
//!
//! ```yaml
//! listing_url: https://news.naver.com/section/105
//! max_links: 5
//! cache_ttl_secs: 3600
//! fetch:
//!   mode: blocking
//!   timeout_secs: 10
//! model:
//!   repo: csebuetnlp/mT5_multilingual_XLSum
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_LISTING_URL: &str = "https://news.naver.com/section/105";
pub const DEFAULT_ORIGIN: &str = "https://news.naver.com";
pub const DEFAULT_MAX_LINKS: usize = 5;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Section page enumerating candidate articles.
    pub listing_url: String,
    /// Prefix for relative article links.
    pub origin: String,
    /// Upper bound on the number of links taken from the listing.
    pub max_links: usize,
    /// Expiry window for memoized listings, article bodies and summaries.
    pub cache_ttl_secs: u64,
    pub fetch: FetchConfig,
    pub model: ModelConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            max_links: DEFAULT_MAX_LINKS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            fetch: FetchConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Scheduling strategy used for page retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Non-blocking client awaited on the runtime.
    Async,
    /// Blocking client run on the blocking thread pool, one request per call.
    Blocking,
}

/// HTTP client settings shared by listing and article requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub mode: FetchMode,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
    pub accept: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::Async,
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where the summarization model's files live on the Hugging Face hub.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub repo: String,
    pub revision: String,
    /// Repository holding the tokenizer when the model repo ships only a
    /// sentencepiece file.
    pub tokenizer_repo: Option<String>,
    pub tokenizer_revision: String,
    pub config_file: String,
    pub tokenizer_file: String,
    pub weights_file: String,
    /// Task prefix prepended to the input (`"summarize: "` for vanilla T5).
    pub prefix: String,
    /// Force CPU inference even when an accelerator is available.
    pub cpu: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            repo: "csebuetnlp/mT5_multilingual_XLSum".to_string(),
            revision: "main".to_string(),
            tokenizer_repo: Some("lmz/mt5-tokenizers".to_string()),
            tokenizer_revision: "main".to_string(),
            config_file: "config.json".to_string(),
            tokenizer_file: "mt5-base.tokenizer.json".to_string(),
            weights_file: "pytorch_model.bin".to_string(),
            prefix: String::new(),
            cpu: false,
        }
    }
}

/// Load configuration from an optional YAML file.
///
/// Returns the defaults when `path` is `None`.
#[instrument(level = "info")]
pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    let config = parse_config(&raw)?;
    info!(path, listing_url = %config.listing_url, "Loaded configuration");
    Ok(config)
}

/// Parse configuration from YAML text. An empty document yields the defaults.
pub fn parse_config(raw: &str) -> Result<AppConfig, ConfigError> {
    if raw.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}
