// ─── Game Manifest ───
// Parses a Mojang version JSON: libraries, natives, assets and argument templates.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use super::rules::{resolve_rules, Platform, Rule};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::profile::InstallMode;

/// JVM template used when a manifest predates structured `arguments`.
pub const DEFAULT_JVM_ARGUMENTS: [&str; 5] = [
    "-Djava.library.path=${natives_directory}",
    "-Dminecraft.launcher.brand=${launcher_name}",
    "-Dminecraft.launcher.version=${launcher_version}",
    "-cp",
    "${classpath}",
];

/// A fully parsed Mojang version JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameManifest {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: String,
    pub main_class: String,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    #[serde(default)]
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexInfo>,
    #[serde(default)]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionDownloads {
    pub client: Option<DownloadArtifact>,
    pub server: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<ArgumentEntry>,
    #[serde(default)]
    pub jvm: Vec<ArgumentEntry>,
}

/// One element of a structured argument list: a literal, or a value gated by rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ArgumentEntry {
    Plain(String),
    Conditional {
        #[serde(default)]
        rules: Vec<Rule>,
        value: ArgumentValue,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    One(String),
    Many(Vec<String>),
}

// ─── Library Entry ───

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// OS name → classifier key, e.g. `"linux": "natives-linux"`.
    #[serde(default)]
    pub natives: Option<HashMap<String, String>>,
    #[serde(default)]
    pub extract: Option<ExtractRules>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibDownloadArtifact>,
    #[serde(default)]
    pub classifiers: HashMap<String, LibDownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibDownloadArtifact {
    pub path: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl LibraryEntry {
    pub fn is_allowed(&self, platform: &Platform) -> bool {
        resolve_rules(&self.rules, platform)
    }

    pub fn artifact(&self) -> Option<&LibDownloadArtifact> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    /// Native classifier artifact for the platform, if the library ships one.
    pub fn native_artifact(&self, platform: &Platform) -> Option<&LibDownloadArtifact> {
        let classifier = self
            .natives
            .as_ref()?
            .get(&platform.os_name)?
            .replace("${arch}", platform.bitness());

        let artifact = self.downloads.as_ref()?.classifiers.get(&classifier);
        if artifact.is_none() {
            debug!("Library {} declares missing native {}", self.name, classifier);
        }
        artifact
    }

    pub fn extract_excludes(&self) -> &[String] {
        self.extract
            .as_ref()
            .map(|e| e.exclude.as_slice())
            .unwrap_or_default()
    }
}

impl GameManifest {
    /// Fetch a version JSON; the raw text is returned alongside for verbatim storage.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> LauncherResult<(Self, String)> {
        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let raw = response.text().await?;
        let manifest: GameManifest = serde_json::from_str(&raw)?;
        Ok((manifest, raw))
    }

    /// The `client` or `server` executable download for a mode.
    pub fn download_for(&self, mode: InstallMode) -> Option<&DownloadArtifact> {
        let downloads = self.downloads.as_ref()?;
        match mode {
            InstallMode::Client => downloads.client.as_ref(),
            InstallMode::Server => downloads.server.as_ref(),
        }
    }

    pub fn allowed_libraries<'a>(
        &'a self,
        platform: &'a Platform,
    ) -> impl Iterator<Item = &'a LibraryEntry> + 'a {
        self.libraries.iter().filter(move |lib| lib.is_allowed(platform))
    }

    /// JVM argument templates, falling back to the legacy default.
    pub fn jvm_arguments(&self, platform: &Platform) -> Vec<String> {
        match &self.arguments {
            Some(args) => resolve_argument_list(&args.jvm, platform),
            None => DEFAULT_JVM_ARGUMENTS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Game argument templates from `arguments.game` or `minecraftArguments`.
    pub fn game_arguments(&self, platform: &Platform) -> Vec<String> {
        match (&self.arguments, &self.minecraft_arguments) {
            (Some(args), _) => resolve_argument_list(&args.game, platform),
            (None, Some(legacy)) => split_legacy_arguments(legacy),
            (None, None) => Vec::new(),
        }
    }
}

/// Flatten a structured argument list, dropping entries whose rules reject the platform.
pub fn resolve_argument_list(entries: &[ArgumentEntry], platform: &Platform) -> Vec<String> {
    let mut resolved = Vec::new();

    for entry in entries {
        match entry {
            ArgumentEntry::Plain(arg) => resolved.push(arg.clone()),
            ArgumentEntry::Conditional { rules, value } => {
                if !resolve_rules(rules, platform) {
                    continue;
                }
                match value {
                    ArgumentValue::One(arg) => resolved.push(arg.clone()),
                    ArgumentValue::Many(args) => resolved.extend(args.iter().cloned()),
                }
            }
        }
    }

    resolved
}

pub fn split_legacy_arguments(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux() -> Platform {
        Platform::new("linux", "x86_64", "6.5.0")
    }

    #[test]
    fn structured_arguments_follow_rules() {
        let manifest: GameManifest = serde_json::from_value(serde_json::json!({
            "id": "1.20.1",
            "type": "release",
            "mainClass": "net.minecraft.client.main.Main",
            "arguments": {
                "game": [
                    "--username",
                    "${auth_player_name}",
                    {
                        "rules": [{"action": "allow", "features": {"is_demo_user": true}}],
                        "value": "--demo"
                    },
                    {
                        "rules": [{"action": "allow", "os": {"name": "linux"}}],
                        "value": ["--width", "854"]
                    }
                ],
                "jvm": [
                    {
                        "rules": [{"action": "allow", "os": {"name": "osx"}}],
                        "value": ["-XstartOnFirstThread"]
                    },
                    "-cp",
                    "${classpath}"
                ]
            }
        }))
        .unwrap();

        assert_eq!(
            manifest.game_arguments(&linux()),
            vec!["--username", "${auth_player_name}", "--width", "854"]
        );
        assert_eq!(manifest.jvm_arguments(&linux()), vec!["-cp", "${classpath}"]);
    }

    #[test]
    fn legacy_arguments_split_on_whitespace() {
        let manifest: GameManifest = serde_json::from_value(serde_json::json!({
            "id": "1.8.9",
            "mainClass": "net.minecraft.client.main.Main",
            "minecraftArguments": "--username ${auth_player_name}  --version ${version_name}"
        }))
        .unwrap();

        assert_eq!(
            manifest.game_arguments(&linux()),
            vec!["--username", "${auth_player_name}", "--version", "${version_name}"]
        );
        assert_eq!(manifest.jvm_arguments(&linux()).len(), DEFAULT_JVM_ARGUMENTS.len());
        assert_eq!(manifest.jvm_arguments(&linux())[4], "${classpath}");
    }

    #[test]
    fn native_classifier_expands_arch() {
        let lib: LibraryEntry = serde_json::from_value(serde_json::json!({
            "name": "tv.twitch:twitch-platform:6.5",
            "natives": { "linux": "natives-linux-${arch}", "windows": "natives-windows" },
            "extract": { "exclude": ["META-INF/"] },
            "downloads": {
                "classifiers": {
                    "natives-linux-64": {
                        "path": "tv/twitch/twitch-platform/6.5/twitch-platform-6.5-natives-linux-64.jar",
                        "url": "https://libraries.minecraft.net/native.jar"
                    }
                }
            }
        }))
        .unwrap();

        let native = lib.native_artifact(&linux()).unwrap();
        assert!(native.path.ends_with("natives-linux-64.jar"));
        assert!(lib.artifact().is_none());
        assert_eq!(lib.extract_excludes(), ["META-INF/".to_string()]);
        assert!(lib
            .native_artifact(&Platform::new("windows", "x86_64", ""))
            .is_none());
    }

    #[test]
    fn download_for_mode() {
        let manifest: GameManifest = serde_json::from_value(serde_json::json!({
            "id": "1.20.1",
            "mainClass": "Main",
            "downloads": {
                "client": { "url": "https://example.com/client.jar", "sha1": "aa", "size": 1 },
                "server": { "url": "https://example.com/server.jar" }
            }
        }))
        .unwrap();

        assert!(manifest
            .download_for(InstallMode::Server)
            .unwrap()
            .url
            .ends_with("server.jar"));
        assert!(manifest
            .download_for(InstallMode::Client)
            .unwrap()
            .url
            .ends_with("client.jar"));
    }
}
