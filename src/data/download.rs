// Raw dataset acquisition.
//
// The CSV is fetched once into data/raw/. Mirrors are tried in order and the
// first one that answers with a success status wins. If all of them fail, the
// user gets instructions for placing the file by hand.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::error::{PipelineError, Result};

/// File name the raw dataset is stored under.
pub const RAW_FILE_NAME: &str = "bbc-text.csv";

/// Path the raw dataset lives at inside `raw_dir`.
pub fn raw_dataset_path(raw_dir: &Path) -> PathBuf {
    raw_dir.join(RAW_FILE_NAME)
}

/// Return the path to the raw CSV, downloading it first if needed.
pub async fn ensure_dataset(raw_dir: &Path, urls: &[String]) -> Result<PathBuf> {
    let dest = raw_dataset_path(raw_dir);
    if dest.exists() {
        info!(path = %dest.display(), "Dataset already present, skipping download");
        println!("Dataset already exists, skipping download...");
        return Ok(dest);
    }

    std::fs::create_dir_all(raw_dir).map_err(|e| PipelineError::ArtifactWrite {
        stage: "download",
        path: raw_dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    println!("Downloading BBC News dataset...");

    let client = reqwest::Client::new();
    let mut failures = Vec::new();

    for url in urls {
        println!("  Trying {url}...");
        match download_file(&client, url, &dest).await {
            Ok(bytes) => {
                info!(url = %url, bytes, "Dataset downloaded");
                println!("  Download completed ({bytes} bytes)");
                return Ok(dest);
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Dataset source failed");
                println!("  Failed: {e}");
                failures.push(format!("{url}: {e}"));
            }
        }
    }

    Err(PipelineError::DatasetUnavailable {
        target: dest,
        reason: if failures.is_empty() {
            "no download sources configured".to_string()
        } else {
            format!("all {} sources failed ({})", failures.len(), failures.join("; "))
        },
    })
}

/// Fetch one URL to `dest`. Returns the number of bytes written.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<u64> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("    {spinner} {msg}")
            .expect("valid template"),
    );
    pb.set_message("receiving");
    pb.enable_steady_tick(Duration::from_millis(100));

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e.into());
        }
    };

    let written = store(&bytes, dest);
    pb.finish_and_clear();
    written?;
    Ok(bytes.len() as u64)
}

/// Write to a temp name first so a half-written file never looks like a
/// dataset. The temp file is removed if the write or rename fails.
fn store(bytes: &[u8], dest: &Path) -> std::io::Result<()> {
    let partial = partial_path(dest);
    let result = std::fs::write(&partial, bytes).and_then(|()| std::fs::rename(&partial, dest));
    if result.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    result
}

fn partial_path(dest: &Path) -> PathBuf {
    dest.with_extension("csv.part")
}
