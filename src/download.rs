// Byte transfer and the per-task driver
//
// One task: skip if the destination exists, resolve a direct URL, then
// stream it to `<dest>.part` and rename into place. The guard removes
// the partial file on every failure path, so an interrupted task leaves
// nothing behind.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::errors::DownloadError;
use crate::models::{DownloadOutcome, VideoRecord};
use crate::resolve::LinkResolver;

const TRANSFER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
const CONVERTER_REFERER: &str = "https://snaptik.app/";

/// Removes the partial file on drop unless disarmed
struct PartGuard {
    path: PathBuf,
    armed: bool,
}

impl PartGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// HTTP client for media transfers. Connect timeout only; an overall
/// request deadline would cut off large files mid-stream.
pub fn transfer_client() -> Result<reqwest::Client, DownloadError> {
    reqwest::Client::builder()
        .user_agent(TRANSFER_USER_AGENT)
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| DownloadError::TransferError(format!("http client: {}", e)))
}

fn make_transfer_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::with_template(
                    "    [{bar:40.cyan/blue}] {bytes}/{total_bytes} @ {bytes_per_sec}",
                )
                .expect("progress template is valid")
                .progress_chars("#>-"),
            );
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("    {spinner:.cyan} {bytes} @ {bytes_per_sec}")
                    .expect("progress template is valid"),
            );
            bar
        }
    }
}

/// Stream `url` into `dest`, reporting byte progress
pub async fn transfer(
    http: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<(), DownloadError> {
    let resp = http
        .get(url)
        .header(header::REFERER, CONVERTER_REFERER)
        .send()
        .await
        .map_err(|e| DownloadError::TransferError(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(DownloadError::TransferError(format!(
            "HTTP {}",
            resp.status()
        )));
    }

    let part = dest.with_extension("part");
    let mut guard = PartGuard::new(part.clone());
    let bar = make_transfer_bar(resp.content_length());

    let mut file = fs::File::create(&part)
        .await
        .map_err(|e| DownloadError::TransferError(e.to_string()))?;

    let mut stream = resp.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::TransferError(e.to_string()))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::TransferError(e.to_string()))?;
        bar.inc(chunk.len() as u64);
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::TransferError(e.to_string()))?;
    drop(file);

    fs::rename(&part, dest)
        .await
        .map_err(|e| DownloadError::TransferError(e.to_string()))?;
    guard.disarm();
    bar.finish_and_clear();
    Ok(())
}

/// Run one task to its terminal state. A destination that already
/// exists is skipped before any converter work happens.
pub async fn run_task(
    http: &reqwest::Client,
    resolver: &mut dyn LinkResolver,
    record: &VideoRecord,
    dest: PathBuf,
) -> DownloadOutcome {
    if dest.exists() {
        debug!(dest = %dest.display(), "already downloaded");
        return DownloadOutcome::Skipped(dest);
    }

    if let Some(parent) = dest.parent() {
        if let Err(e) = fs::create_dir_all(parent).await {
            return DownloadOutcome::Failed(DownloadError::TransferError(e.to_string()));
        }
    }

    let direct_url = match resolver.resolve(record).await {
        Ok(url) => url,
        Err(e) => return DownloadOutcome::Failed(e),
    };

    match transfer(http, &direct_url, &dest).await {
        Ok(()) => DownloadOutcome::Completed(dest),
        Err(e) => DownloadOutcome::Failed(e),
    }
}
