//! JSON output for reports and news collections.
//!
//! Files are UTF-8 with non-ASCII characters kept as-is and two-space
//! indentation, written once at the end of a run.

use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

pub const NEWS_FILE: &str = "pegn_news.json";
pub const SOCIAL_FILE: &str = "ibge_social.json";
pub const SPENDING_FILE: &str = "siconfi_spending.json";
pub const TRANSPARENCY_FILE: &str = "transparency_data.json";

/// Serialize `value` to `{json_output_dir}/{file_name}`.
///
/// Creates the output directory if needed and returns the written path.
#[instrument(level = "info", skip_all, fields(%json_output_dir, %file_name))]
pub async fn write_json<T: Serialize + ?Sized>(
    value: &T,
    json_output_dir: &str,
    file_name: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;

    if let Err(e) = fs::create_dir_all(json_output_dir).await {
        error!(error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = Path::new(json_output_dir).join(file_name);
    info!(path = %path.display(), "Writing JSON");
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON file");

    Ok(path)
}
