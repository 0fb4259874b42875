// ─── Forge ───
// Promotion table lookups, universal jar coordinates and the
// `version.json` manifest embedded in the universal jar.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::MavenArtifact;
use crate::core::profile::InstallMode;

pub const FORGE_MAVEN: &str = "https://files.minecraftforge.net/maven";

const FORGE_GROUP: &str = "net.minecraftforge";
const FORGE_ARTIFACT: &str = "forge";

// ─── Promotions ───

/// `promotions.json` published next to the Forge artifacts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Promotions {
    #[serde(default)]
    pub promos: HashMap<String, PromotionEntry>,
}

/// Older tables store full objects, newer ones only the loader version.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PromotionEntry {
    Detailed {
        #[serde(default)]
        mcversion: Option<String>,
        version: String,
    },
    Version(String),
}

/// A resolved promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub loader_version: String,
    pub game_version: Option<String>,
}

impl Promotions {
    pub fn lookup(&self, key: &str) -> Option<Promotion> {
        let (loader_version, mcversion) = match self.promos.get(key)? {
            PromotionEntry::Detailed { mcversion, version } => (version.clone(), mcversion.clone()),
            PromotionEntry::Version(version) => (version.clone(), None),
        };

        // "1.20.1-latest" names its game version in the key itself.
        let game_version = mcversion.or_else(|| {
            key.strip_suffix("-recommended")
                .or_else(|| key.strip_suffix("-latest"))
                .map(ToString::to_string)
        });

        Some(Promotion {
            loader_version,
            game_version,
        })
    }
}

// ─── Loader manifest ───

/// Subset of the `version.json` packed into the universal jar.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderManifest {
    pub main_class: String,
    #[serde(default)]
    pub minecraft_arguments: String,
    #[serde(default)]
    pub libraries: Vec<LoaderLibrary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderLibrary {
    pub name: String,
    /// Repository base; the default library host is used when absent.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub clientreq: Option<bool>,
    #[serde(default)]
    pub serverreq: Option<bool>,
}

impl LoaderLibrary {
    /// The flag only has to be present; its value is not consulted.
    pub fn required_for(&self, mode: InstallMode) -> bool {
        match mode {
            InstallMode::Client => self.clientreq.is_some(),
            InstallMode::Server => self.serverreq.is_some(),
        }
    }

    pub fn artifact(&self) -> LauncherResult<MavenArtifact> {
        MavenArtifact::parse(&self.name)
    }

    pub fn download_url(&self, default_repo: &str) -> LauncherResult<String> {
        let repo = self.url.as_deref().unwrap_or(default_repo);
        Ok(self.artifact()?.url(repo))
    }
}

impl LoaderManifest {
    /// Read `version.json` out of a downloaded universal jar.
    pub async fn read_from_jar(jar_path: &Path) -> LauncherResult<Self> {
        let bytes = tokio::fs::read(jar_path)
            .await
            .map_err(|e| LauncherError::io(jar_path, e))?;

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;
        let mut entry = match archive.by_name("version.json") {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(LauncherError::LoaderManifestMissing {
                    path: jar_path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let mut raw = String::new();
        entry
            .read_to_string(&mut raw)
            .map_err(|e| LauncherError::io(jar_path, e))?;

        let manifest: LoaderManifest = serde_json::from_str(&raw)?;
        debug!(
            "Loader manifest: main class {}, {} libraries",
            manifest.main_class,
            manifest.libraries.len()
        );
        Ok(manifest)
    }

    pub fn required_libraries(&self, mode: InstallMode) -> impl Iterator<Item = &LoaderLibrary> {
        self.libraries.iter().filter(move |lib| lib.required_for(mode))
    }
}

/// Override recorded in the client side-record and applied at launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderOverride {
    pub main_class: String,
    pub minecraft_arguments: String,
    /// Paths relative to the profile directory.
    #[serde(default)]
    pub libraries: Vec<String>,
}

// ─── Remote access ───

/// Thin client over the Forge maven.
#[derive(Debug, Clone)]
pub struct ForgeClient {
    client: reqwest::Client,
    maven_url: String,
}

impl ForgeClient {
    pub fn new(client: reqwest::Client, maven_url: impl Into<String>) -> Self {
        Self {
            client,
            maven_url: maven_url.into(),
        }
    }

    pub fn promotions_url(&self) -> String {
        format!(
            "{}/net/minecraftforge/forge/promotions.json",
            self.maven_url.trim_end_matches('/')
        )
    }

    pub async fn promotions(&self) -> LauncherResult<Promotions> {
        let url = self.promotions_url();
        info!("Fetching Forge promotions from {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url,
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    pub fn universal_jar_url(&self, game_version: &str, loader_version: &str) -> String {
        let mut artifact = forge_artifact(game_version, loader_version);
        artifact.classifier = Some("universal".to_string());
        artifact.url(&self.maven_url)
    }
}

/// `net.minecraftforge:forge:<mc>-<loader>`, where client installs relocate the jar.
pub fn forge_artifact(game_version: &str, loader_version: &str) -> MavenArtifact {
    MavenArtifact::new(
        FORGE_GROUP,
        FORGE_ARTIFACT,
        &format!("{}-{}", game_version, loader_version),
    )
}
