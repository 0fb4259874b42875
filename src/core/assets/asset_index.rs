use std::collections::HashMap;

use serde::Deserialize;

use crate::core::downloader::Downloader;
use crate::core::error::LauncherResult;

/// Asset index JSON: logical name → content-addressed object.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndex {
    #[serde(default)]
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    #[serde(default)]
    pub size: u64,
}

impl AssetObject {
    /// `<first two hash chars>/<hash>`, shared by the remote host and the local store.
    pub fn relative_path(&self) -> String {
        let prefix = self.hash.get(..2).unwrap_or(&self.hash);
        format!("{}/{}", prefix, self.hash)
    }

    pub fn url(&self, resources_host: &str) -> String {
        format!("{}/{}", resources_host.trim_end_matches('/'), self.relative_path())
    }
}

impl AssetIndex {
    /// Fetch an index; the raw body is returned for storing under `assets/indexes/`.
    pub async fn fetch(downloader: &Downloader, url: &str) -> LauncherResult<(Self, String)> {
        let raw = downloader.get_text(url).await?;
        let index: AssetIndex = serde_json::from_str(&raw)?;
        Ok((index, raw))
    }
}
