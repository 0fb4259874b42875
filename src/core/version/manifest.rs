// ─── Version Index ───
// Fetches and queries the Mojang version manifest (the list of all versions).

use serde::Deserialize;
use tracing::info;

use crate::core::error::{LauncherError, LauncherResult};

pub const VERSION_MANIFEST_URL: &str =
    "https://launchermeta.mojang.com/mc/game/version_manifest.json";

/// Top-level Mojang version index.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionIndex {
    pub latest: LatestVersions,
    pub versions: Vec<VersionEntry>,
}

/// Named aliases for the newest release and snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// A single entry in the index.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
}

impl VersionEntry {
    pub fn is_snapshot(&self) -> bool {
        self.version_type == "snapshot"
    }
}

impl VersionIndex {
    /// Fetch the version index using a shared HTTP client.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> LauncherResult<Self> {
        info!("Fetching Minecraft version list...");

        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let index: VersionIndex = response.json().await?;

        info!("Loaded {} versions from index", index.versions.len());
        Ok(index)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_index() {
        let json = r#"{
            "latest": { "release": "1.20.1", "snapshot": "23w31a" },
            "versions": [
                { "id": "23w31a", "type": "snapshot", "url": "https://example.com/23w31a.json" },
                { "id": "1.20.1", "type": "release", "url": "https://example.com/1.20.1.json",
                  "releaseTime": "2023-06-12T13:25:51+00:00" }
            ]
        }"#;
        let index: VersionIndex = serde_json::from_str(json).unwrap();
        assert_eq!(index.latest.release, "1.20.1");
        assert!(index.find_version("23w31a").unwrap().is_snapshot());
        assert!(!index.find_version("1.20.1").unwrap().is_snapshot());
        assert!(index.find_version("1.0").is_none());
    }
}
