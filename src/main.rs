//! # IT News Summarizer
//!
//! Fetches the latest headlines from the Naver News IT/science section,
//! scrapes each article's body, and summarizes it with a pretrained
//! sequence-to-sequence model running locally through Candle.
//!
//! ## Usage
//!
//! ```sh
//! it_news_summarizer                       # summarize all five headlines
//! it_news_summarizer --mode select         # pick one article at a time
//! it_news_summarizer -j ./digests -v       # keep a JSON copy, log at info
//! ```
//!
//! ## Architecture
//!
//! The application is a one-way pipeline:
//! 1. **Indexing**: scrape up to five article links from the section page
//! 2. **Fetching**: download one article and extract its body text
//! 3. **Summarizing**: run the lazily-loaded model on the first 512 characters
//! 4. **Presenting**: print panels (eager) or loop over a menu (select)
//!
//! Failures at any step become inline notices; the session keeps going.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cache;
mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod summarizer;
mod ui;
mod utils;

use cache::ResponseCache;
use cli::{Cli, Mode};
use config::load_config;
use fetch::Fetcher;
use outputs::json;
use pipeline::Pipeline;
use summarizer::Summarizer;
use summarizer::t5::T5Summarizer;
use ui::TerminalChooser;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init ---
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("it_news_summarizer starting up");
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = load_config(args.config.as_deref())?;
    if let Some(repo) = &args.model_repo {
        config.model.repo = repo.clone();
    }
    if args.cpu {
        config.model.cpu = true;
    }

    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "JSON output directory is not writable");
            return Err(e);
        }
    }

    // ---- Pipeline ----
    let cache = if args.no_cache {
        ResponseCache::disabled()
    } else {
        ResponseCache::new(config.cache_ttl())
    };
    let fetcher = Fetcher::from_config(&config.fetch)?;
    let model_config = config.model.clone();
    let summarizer = Summarizer::new(move || T5Summarizer::load(&model_config), cache.clone());
    let pipeline = Pipeline::new(fetcher, summarizer, cache, &config);
    info!(mode = ?args.mode, listing_url = %config.listing_url, "Pipeline ready");

    let mut stdout = std::io::stdout();
    match args.mode {
        Mode::Eager => {
            let digest = ui::run_eager(&pipeline, &mut stdout).await?;
            if let Some(dir) = &args.json_output_dir {
                if let Err(e) = json::write_digest(&digest, dir).await {
                    error!(error = %e, "Failed to write JSON digest");
                }
            }
        }
        Mode::Select => {
            let shown = ui::run_select(&pipeline, &mut TerminalChooser, &mut stdout).await?;
            info!(count = shown.len(), "Select session ended");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
