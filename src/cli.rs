//! Command-line interface definitions.
//!
//! Flags override the matching fields of the optional YAML config file.

use clap::{Parser, ValueEnum};

/// How the articles are presented.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Summarize every listed article and print them all.
    Eager,
    /// Pick one article at a time from a menu; only that one is summarized.
    Select,
}

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Summarize the whole section and keep a JSON copy
/// it_news_summarizer --mode eager -j ./digests
///
/// # Interactive picker, CPU only, different checkpoint
/// it_news_summarizer --mode select --cpu --model-repo google/mt5-small
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Presentation mode
    #[arg(long, value_enum, default_value_t = Mode::Eager)]
    pub mode: Mode,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory for JSON digests of eager runs
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Disable memoization of listings, articles and summaries
    #[arg(long)]
    pub no_cache: bool,

    /// Hugging Face repository of the summarization model
    #[arg(long, env = "NEWS_SUMMARY_MODEL")]
    pub model_repo: Option<String>,

    /// Run the model on the CPU even if a GPU is available
    #[arg(long)]
    pub cpu: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
