use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::LauncherError;
use crate::core::loaders::LoaderOverride;

/// Whether a profile runs the game client or a dedicated server.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InstallMode {
    #[default]
    Client,
    Server,
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallMode::Client => write!(f, "client"),
            InstallMode::Server => write!(f, "server"),
        }
    }
}

impl FromStr for InstallMode {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(InstallMode::Client),
            "server" => Ok(InstallMode::Server),
            other => Err(LauncherError::Other(format!(
                "Unknown mode '{}', expected client or server",
                other
            ))),
        }
    }
}

/// An installed game directory, as recorded in the config store.
///
/// Keyed by `path`; the name is a secondary lookup key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub path: PathBuf,
    pub game_version: String,
    #[serde(default)]
    pub loader_version: Option<String>,
    pub mode: InstallMode,
}

impl Profile {
    pub fn key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// `hearth.yml`: a human-readable note of what was installed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub name: String,
    pub minecraft: String,
    #[serde(default)]
    pub loader: Option<String>,
    pub mode: InstallMode,
    pub installed_at: DateTime<Utc>,
}

impl From<&Profile> for ProfileSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            minecraft: profile.game_version.clone(),
            loader: profile.loader_version.clone(),
            mode: profile.mode,
            installed_at: Utc::now(),
        }
    }
}

/// `hearth.client.yml`: launch-time variables and the optional loader override.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientRecord {
    pub name: String,
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader: Option<LoaderOverride>,
}
