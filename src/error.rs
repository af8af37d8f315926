//! Error taxonomy for the fetch → scrape → summarize pipeline.
//!
//! Markup that does not match the expected structure is not an error here:
//! the extractors return empty data instead. Everything that crosses a
//! network or model boundary comes back as one of the enums below and is
//! turned into a user-visible notice by the presentation layer.

use thiserror::Error;

/// Failure while retrieving a page over HTTP.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("fetch task aborted: {0}")]
    Join(String),
}

/// Failure while producing a summary.
#[derive(Error, Debug)]
pub enum SummarizationError {
    #[error("nothing to summarize")]
    EmptyInput,

    #[error("could not load summarization model: {0}")]
    ModelLoad(String),

    #[error("model inference failed: {0}")]
    Inference(String),

    #[error("summarization task aborted: {0}")]
    Join(String),
}

impl From<candle_core::Error> for SummarizationError {
    fn from(e: candle_core::Error) -> Self {
        SummarizationError::Inference(e.to_string())
    }
}

/// Failure while reading the optional YAML configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}
