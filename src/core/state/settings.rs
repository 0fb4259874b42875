use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::auth::AUTH_SERVER_URL;
use crate::core::loaders::FORGE_MAVEN;
use crate::core::maven::MOJANG_LIBRARIES;
use crate::core::version::VERSION_MANIFEST_URL;

pub const SETTINGS_FILE: &str = "settings.json";

pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";

/// Remote services the launcher talks to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Endpoints {
    pub version_manifest: String,
    pub resources: String,
    pub libraries: String,
    pub forge_maven: String,
    pub auth_server: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            version_manifest: VERSION_MANIFEST_URL.to_string(),
            resources: RESOURCES_URL.to_string(),
            libraries: MOJANG_LIBRARIES.to_string(),
            forge_maven: FORGE_MAVEN.to_string(),
            auth_server: AUTH_SERVER_URL.to_string(),
        }
    }
}

/// Optional `settings.json` in the workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct LauncherSettings {
    pub endpoints: Endpoints,
    /// Asset objects fetched at once.
    pub asset_concurrency: usize,
    /// Library downloads at once; unbounded when unset.
    pub library_concurrency: Option<usize>,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            asset_concurrency: 20,
            library_concurrency: None,
        }
    }
}

impl LauncherSettings {
    /// Missing file means defaults; an unreadable one is logged and ignored.
    pub fn load(workspace: &Path) -> Self {
        load_settings_from_disk(workspace).unwrap_or_default()
    }
}

fn load_settings_from_disk(workspace: &Path) -> Option<LauncherSettings> {
    let path = workspace.join(SETTINGS_FILE);
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!("Ignoring invalid {:?}: {}", path, e);
            None
        }
    }
}
