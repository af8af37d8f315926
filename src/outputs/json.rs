//! JSON output of an eager run.
//!
//! Each run lands in `{json_output_dir}/{local_date}/{HH-MM-SS}.json`, so
//! several runs on the same day never overwrite each other.

use crate::models::Digest;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Path a digest will be written to under `json_output_dir`.
pub fn digest_path(digest: &Digest, json_output_dir: &str) -> PathBuf {
    Path::new(json_output_dir)
        .join(&digest.local_date)
        .join(format!("{}.json", digest.local_time.replace(':', "-")))
}

/// Write a [`Digest`] to a JSON file under a per-day directory.
///
/// Creates the dated directory if needed and writes the pretty-printed
/// digest. Runs started in the same second overwrite each other.
///
/// # Arguments
///
/// * `digest` - The eager run to serialize
/// * `json_output_dir` - Base directory for JSON output
///
/// # Returns
///
/// The path written, or an error if directory creation or file writing fails.
///
/// # Output Path
///
/// `{json_output_dir}/{local_date}/{HH-MM-SS}.json`
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_digest(digest: &Digest, json_output_dir: &str) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(digest)?;
    let path = digest_path(digest, json_output_dir);

    if let Some(dir) = path.parent() {
        info!(dir = %dir.display(), "Ensuring JSON directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = digest.articles.len(), "Wrote JSON digest");
    Ok(path)
}
