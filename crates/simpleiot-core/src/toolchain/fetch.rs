//! Release archive download and extraction.

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::ToolchainError;

/// Downloads a release archive to a local file.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), ToolchainError>;
}

/// HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, ToolchainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| ToolchainError::Download {
                url: String::new(),
                message: format!("HTTP client error: {}", e),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ArchiveFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), ToolchainError> {
        let download_error = |message: String| ToolchainError::Download {
            url: url.to_string(),
            message,
        };

        debug!(%url, dest = %dest.display(), "Downloading");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(download_error(format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        tokio::fs::write(dest, &bytes).await?;
        debug!(bytes = bytes.len(), "Download complete");

        Ok(())
    }
}

/// Copy the entry named `file_name` (at any depth) out of a zip archive to `dest`.
pub fn extract_file(archive: &Path, file_name: &str, dest: &Path) -> Result<(), ToolchainError> {
    let mut zip = open_archive(archive)?;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| ToolchainError::Archive(e.to_string()))?;

        if entry.is_dir() {
            continue;
        }

        let matches = entry
            .name()
            .rsplit(['/', '\\'])
            .next()
            .is_some_and(|name| name == file_name);

        if matches {
            let mut out = File::create(dest)?;
            io::copy(&mut entry, &mut out)?;
            return Ok(());
        }
    }

    Err(ToolchainError::Archive(format!(
        "{} not found in {}",
        file_name,
        archive.display()
    )))
}

/// Extract every entry of a zip archive under `dest`.
pub fn extract_all(archive: &Path, dest: &Path) -> Result<(), ToolchainError> {
    let mut zip = open_archive(archive)?;
    zip.extract(dest)
        .map_err(|e| ToolchainError::Archive(e.to_string()))
}

fn open_archive(archive: &Path) -> Result<zip::ZipArchive<File>, ToolchainError> {
    let file = File::open(archive)?;
    zip::ZipArchive::new(file)
        .map_err(|e| ToolchainError::Archive(format!("{}: {}", archive.display(), e)))
}
