//! Abstractive summarization behind a single lazily-built model.
//!
//! [`SummaryModel`] is the seam between the pipeline and whatever actually
//! runs inference; [`t5::T5Summarizer`] is the production implementation.
//! [`Summarizer`] wraps a model type with:
//!
//! - single construction on first use, shared by every clone afterwards
//! - a hard input ceiling of [`MAX_INPUT_CHARS`] characters
//! - fixed generation bounds ([`GENERATION`]): 30..=150 tokens, greedy
//! - optional memoization keyed by the truncated input
//!
//! Model calls are blocking and uncancellable, so both construction and
//! inference run on the blocking thread pool.

pub mod t5;

use crate::cache::{CacheKey, ResponseCache};
use crate::error::SummarizationError;
use crate::utils::truncate_chars;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Input ceiling matching the model's context budget.
pub const MAX_INPUT_CHARS: usize = 512;

/// Decoding bounds handed to the model on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    /// Maximum number of generated tokens.
    pub max_length: usize,
    /// End-of-sequence is suppressed until this many tokens exist.
    pub min_length: usize,
    /// `false` selects greedy (argmax) decoding.
    pub do_sample: bool,
}

pub const GENERATION: GenerationParams = GenerationParams {
    max_length: 150,
    min_length: 30,
    do_sample: false,
};

/// A loaded sequence-to-sequence model that can summarize text.
///
/// Implementations are called from blocking threads and may take seconds.
pub trait SummaryModel: Send + Sync + 'static {
    fn generate(&self, input: &str, params: &GenerationParams)
    -> Result<String, SummarizationError>;
}

type Loader<M> = dyn Fn() -> Result<M, SummarizationError> + Send + Sync;

/// Lazily-constructed, shared summarization front end.
pub struct Summarizer<M> {
    model: Arc<OnceCell<M>>,
    loader: Arc<Loader<M>>,
    cache: ResponseCache,
}

impl<M> Clone for Summarizer<M> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            loader: Arc::clone(&self.loader),
            cache: self.cache.clone(),
        }
    }
}

impl<M> Summarizer<M> {
    /// Whether the model has been constructed yet.
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }
}

impl<M> fmt::Debug for Summarizer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Summarizer")
            .field("loaded", &self.is_loaded())
            .field("cache", &self.cache)
            .finish()
    }
}

impl<M: SummaryModel> Summarizer<M> {
    /// Create a summarizer that will call `loader` once, the first time a
    /// summary is requested.
    pub fn new(
        loader: impl Fn() -> Result<M, SummarizationError> + Send + Sync + 'static,
        cache: ResponseCache,
    ) -> Self {
        Self {
            model: Arc::new(OnceCell::new()),
            loader: Arc::new(loader),
            cache,
        }
    }

    /// Summarize the first [`MAX_INPUT_CHARS`] characters of `text`.
    ///
    /// The model is built on the first call. Construction and inference run
    /// on the blocking pool with the fixed [`GENERATION`] bounds. A failed
    /// construction is retried on the next call.
    ///
    /// # Arguments
    ///
    /// * `text` - Article body; only its prefix is sent to the model
    ///
    /// # Returns
    ///
    /// The summary text, served from the cache when the same truncated input
    /// was summarized within the TTL.
    ///
    /// # Errors
    ///
    /// [`SummarizationError::EmptyInput`] for blank input, otherwise whatever
    /// loading or inference reports.
    #[instrument(level = "info", skip_all, fields(chars = text.chars().count()))]
    pub async fn summarize(&self, text: &str) -> Result<String, SummarizationError> {
        let input = truncate_chars(text, MAX_INPUT_CHARS);
        if input.trim().is_empty() {
            return Err(SummarizationError::EmptyInput);
        }
        let key = CacheKey::Summary {
            input: input.to_string(),
        };
        self.cache
            .get_or_try_insert(key, self.generate(input.to_string()))
            .await
    }

    async fn generate(&self, input: String) -> Result<String, SummarizationError> {
        let cell = Arc::clone(&self.model);
        let loader = Arc::clone(&self.loader);

        tokio::task::spawn_blocking(move || -> Result<String, SummarizationError> {
            let model = cell.get_or_try_init(|| {
                let t0 = Instant::now();
                let model = loader()?;
                info!(elapsed_ms = t0.elapsed().as_millis() as u64, "Summarization model loaded");
                Ok::<_, SummarizationError>(model)
            })?;

            let t0 = Instant::now();
            let summary = model.generate(&input, &GENERATION)?;
            debug!(
                elapsed_ms = t0.elapsed().as_millis() as u64,
                summary_chars = summary.chars().count(),
                "Generated summary"
            );
            Ok(summary)
        })
        .await
        .map_err(|e| SummarizationError::Join(e.to_string()))?
    }
}
