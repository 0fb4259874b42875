// Per-profile files written at install time and read back at launch.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::model::{ClientRecord, Profile, ProfileSummary};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::GameManifest;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CLIENT_RECORD_FILE: &str = "hearth.client.yml";
pub const SUMMARY_FILE: &str = "hearth.yml";

impl Profile {
    pub fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }

    pub fn client_record_path(&self) -> PathBuf {
        self.path.join(CLIENT_RECORD_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.path.join(SUMMARY_FILE)
    }

    /// Store the game manifest exactly as it was served.
    pub async fn write_manifest(&self, raw: &str) -> LauncherResult<()> {
        write_file(&self.manifest_path(), raw.as_bytes()).await
    }

    pub async fn write_client_record(&self, record: &ClientRecord) -> LauncherResult<()> {
        write_yaml(&self.client_record_path(), record).await
    }

    pub async fn write_summary(&self, summary: &ProfileSummary) -> LauncherResult<()> {
        write_yaml(&self.summary_path(), summary).await
    }

    /// Read both client files; a missing or unparsable file is `ProfileFilesMissing`.
    pub async fn read_client_files(&self) -> LauncherResult<(ClientRecord, GameManifest)> {
        let missing = |e: LauncherError| {
            debug!("Profile file unreadable: {}", e);
            LauncherError::ProfileFilesMissing {
                path: self.path.clone(),
            }
        };

        let record: ClientRecord = read_yaml(&self.client_record_path()).await.map_err(missing)?;
        let raw = read_file(&self.manifest_path()).await.map_err(missing)?;
        let manifest: GameManifest = serde_json::from_str(&raw)
            .map_err(LauncherError::from)
            .map_err(missing)?;

        Ok((record, manifest))
    }
}

async fn write_file(path: &Path, contents: &[u8]) -> LauncherResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::io(parent, e))?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| LauncherError::io(path, e))
}

async fn read_file(path: &Path) -> LauncherResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| LauncherError::io(path, e))
}

async fn write_yaml<T: Serialize>(path: &Path, value: &T) -> LauncherResult<()> {
    let yaml = serde_yaml::to_string(value)?;
    write_file(path, yaml.as_bytes()).await
}

async fn read_yaml<T: DeserializeOwned>(path: &Path) -> LauncherResult<T> {
    let raw = read_file(path).await?;
    Ok(serde_yaml::from_str(&raw)?)
}
