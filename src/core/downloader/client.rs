use std::path::Path;

use futures_util::StreamExt;
use reqwest::{Client, Response};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// What `fetch_if_missing` did for one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded,
    /// The destination already existed; no request was made.
    Skipped,
}

/// Artifact fetcher over a shared HTTP client.
///
/// Existing files are trusted as complete: there is no checksum or size
/// verification, so an interrupted download must be removed by hand.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET `url`, turning non-2xx statuses into `DownloadFailed`.
    pub async fn get(&self, url: &str) -> LauncherResult<Response> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    pub async fn get_text(&self, url: &str) -> LauncherResult<String> {
        Ok(self.get(url).await?.text().await?)
    }

    /// Stream `url` into `dest` unless `dest` already exists.
    ///
    /// Parent directories are created as needed.
    pub async fn fetch_if_missing(&self, url: &str, dest: &Path) -> LauncherResult<FetchOutcome> {
        if tokio::fs::try_exists(dest)
            .await
            .map_err(|e| LauncherError::io(dest, e))?
        {
            debug!("Skipping existing {:?}", dest);
            return Ok(FetchOutcome::Skipped);
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let response = self.get(url).await?;
        let mut body = response.bytes_stream();

        // Scoped so the handle is closed before callers touch the file.
        {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|e| LauncherError::io(dest, e))?;
            while let Some(chunk) = body.next().await {
                file.write_all(&chunk?)
                    .await
                    .map_err(|e| LauncherError::io(dest, e))?;
            }
            file.flush().await.map_err(|e| LauncherError::io(dest, e))?;
        }

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(FetchOutcome::Downloaded)
    }
}
