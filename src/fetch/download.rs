// src/fetch/download.rs
use anyhow::{Context, Result};
use reqwest::Client;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Semaphore, time::Instant};
use tracing::{error, info};
use url::Url;

use super::urls::ReportUrl;

/// Download `url` to `dest`, creating parent directories as needed.
pub async fn download_file(client: &Client, url: &Url, dest: &Path) -> Result<PathBuf> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }
    let resp = client
        .get(url.as_str())
        .send()
        .await
        .with_context(|| format!("requesting {url}"))?
        .error_for_status()?;
    let bytes = resp.bytes().await?;
    fs::write(dest, &bytes)
        .await
        .with_context(|| format!("writing {}", dest.display()))?;
    Ok(dest.to_path_buf())
}

/// Fetch every report into `dest_dir`, at most `concurrency` at a time.
/// Failures are logged and left out of the returned paths.
pub async fn download_all(
    client: &Client,
    reports: Vec<ReportUrl>,
    dest_dir: &Path,
    concurrency: usize,
) -> Vec<PathBuf> {
    let sem = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::with_capacity(reports.len());

    for report in reports {
        let client = client.clone();
        let sem = sem.clone();
        let dest = dest_dir.join(&report.file_name);
        handles.push(tokio::spawn(async move {
            let _permit = sem.acquire_owned().await?;
            info!(name = %report.file_name, "downloading");
            let start = Instant::now();
            let path = download_file(&client, &report.url, &dest).await?;
            info!(name = %report.file_name, elapsed = ?start.elapsed(), "downloaded");
            Ok::<_, anyhow::Error>(path)
        }));
    }

    let mut paths = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(Ok(path)) => paths.push(path),
            Ok(Err(e)) => error!(error = %e, "download failed"),
            Err(e) => error!(error = %e, "download task panicked"),
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_reports_are_skipped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let reports = vec![ReportUrl {
            url: Url::parse("http://127.0.0.1:9/quote/2024-01-23.pdf")?,
            file_name: "quote2024-01-23.pdf".into(),
        }];
        let paths = download_all(&Client::new(), reports, dir.path(), 2).await;
        assert!(paths.is_empty());
        assert!(!dir.path().join("quote2024-01-23.pdf").exists());
        Ok(())
    }
}
