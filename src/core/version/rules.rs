// ─── Manifest Rules ───
// Platform predicate shared by library filtering and argument filtering.

use std::collections::{BTreeMap, BTreeSet};

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

/// Description of the machine a manifest is being evaluated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Mojang OS name: `windows`, `osx` or `linux`.
    pub os_name: String,
    /// Architecture in launcher notation (`x64`, `x86`, `arm64`, ...).
    pub arch: String,
    /// OS release string matched against `os.version` patterns.
    pub os_release: String,
    /// Launcher features that are switched on (`is_demo_user`, ...).
    pub features: BTreeSet<String>,
}

impl Platform {
    /// Descriptor for the running process.
    pub fn current() -> Self {
        Self {
            os_name: normalize_os_name(std::env::consts::OS).to_string(),
            arch: normalize_arch(std::env::consts::ARCH).to_string(),
            os_release: current_release(),
            features: BTreeSet::new(),
        }
    }

    pub fn new(os_name: &str, arch: &str, os_release: &str) -> Self {
        Self {
            os_name: normalize_os_name(os_name).to_string(),
            arch: normalize_arch(arch).to_string(),
            os_release: os_release.to_string(),
            features: BTreeSet::new(),
        }
    }

    /// Bitness used to expand `${arch}` in native classifier names.
    pub fn bitness(&self) -> &'static str {
        match self.arch.as_str() {
            "x86" | "arm" => "32",
            _ => "64",
        }
    }
}

fn current_release() -> String {
    if cfg!(target_os = "windows") {
        windows_release(
            sysinfo::System::os_version().as_deref(),
            sysinfo::System::kernel_version().as_deref(),
        )
    } else {
        sysinfo::System::kernel_version().unwrap_or_default()
    }
}

/// NT version string (`10.0.19045`) from the marketing version and build
/// number; manifest `os.version` patterns match NT versions.
fn windows_release(os_version: Option<&str>, build: Option<&str>) -> String {
    let nt = match os_version.and_then(|v| v.split_whitespace().next()) {
        Some("10" | "11") => "10.0",
        Some("8.1") => "6.3",
        Some("8") => "6.2",
        Some("7") => "6.1",
        Some(other) => other,
        None => "",
    };

    match build {
        Some(build) if !nt.is_empty() && !build.is_empty() => format!("{}.{}", nt, build),
        _ => nt.to_string(),
    }
}

/// Map Rust/Node style OS identifiers onto the names used in manifests.
pub fn normalize_os_name(raw: &str) -> &str {
    match raw {
        "macos" | "darwin" | "osx" => "osx",
        "win32" | "windows" => "windows",
        other => other,
    }
}

fn normalize_arch(raw: &str) -> &str {
    match raw {
        "x86_64" | "amd64" | "x64" => "x64",
        "x86" | "i686" | "i386" => "x86",
        "aarch64" | "arm64" => "arm64",
        other => other,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
    /// Case-insensitive regular expression over the OS release string.
    #[serde(default)]
    pub version: Option<String>,
}

impl OsRule {
    fn matches(&self, platform: &Platform) -> bool {
        if let Some(arch) = &self.arch {
            if normalize_arch(arch) != platform.arch {
                return false;
            }
        }

        if let Some(name) = &self.name {
            if normalize_os_name(name) != platform.os_name {
                return false;
            }
        }

        if let Some(pattern) = &self.version {
            // An unparsable pattern can never match.
            let matched = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map(|re| re.is_match(&platform.os_release))
                .unwrap_or(false);
            if !matched {
                return false;
            }
        }

        true
    }
}

/// One conditional clause of a manifest `rules` array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
    #[serde(default)]
    pub features: Option<BTreeMap<String, bool>>,
}

impl Rule {
    pub fn allow() -> Self {
        Self {
            action: RuleAction::Allow,
            os: None,
            features: None,
        }
    }

    pub fn disallow() -> Self {
        Self {
            action: RuleAction::Disallow,
            os: None,
            features: None,
        }
    }

    pub fn with_os(mut self, os: OsRule) -> Self {
        self.os = Some(os);
        self
    }

    /// Whether this rule lets its item through on `platform`.
    ///
    /// The base verdict is the action itself; a present constraint that does
    /// not match the platform inverts it.
    pub fn permits(&self, platform: &Platform) -> bool {
        let verdict = self.action == RuleAction::Allow;

        if let Some(os) = &self.os {
            if !os.matches(platform) {
                return !verdict;
            }
        }

        if let Some(features) = &self.features {
            let satisfied = features
                .iter()
                .all(|(name, wanted)| platform.features.contains(name) == *wanted);
            if !satisfied {
                return !verdict;
            }
        }

        verdict
    }
}

/// Evaluate a rule list. Empty lists include unconditionally; otherwise
/// every rule must permit the item.
pub fn resolve_rules(rules: &[Rule], platform: &Platform) -> bool {
    rules.iter().all(|rule| rule.permits(platform))
}
