//! Writes evaluation sets to disk.
use std::path::Path;

use anyhow::{Context as _, Result};
use marquee_core::evaluation::QaDataSet;

/// Where the default script run writes the evaluation set
pub const DEFAULT_EXPORT_PATH: &str = "data/movies-generated-qa-EN-US.jsonl";

/// Writes the dataset as json lines, one `{"question", "ground_truth"}` object per line.
///
/// Parent directories are created as needed and an existing file is replaced.
///
/// # Errors
///
/// Errors if the file cannot be written
pub async fn export_jsonl(path: impl AsRef<Path>, dataset: &QaDataSet) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::tokio::create_dir_all(parent).await?;
    }

    let content = dataset
        .to_jsonl()
        .context("Failed to serialize evaluation set")?;
    fs_err::tokio::write(path, content).await?;

    tracing::info!(path = %path.display(), pairs = dataset.len(), "Exported evaluation set");
    Ok(())
}
