use std::path::Path;

use crate::core::loaders::LoaderOverride;
use crate::core::version::{GameManifest, Platform};

/// Platform-specific Java classpath separator.
pub fn classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// Classpath entries relative to the profile directory.
///
/// Order: rule-accepted manifest artifacts, loader libraries, then the game jar.
pub fn classpath_entries(
    manifest: &GameManifest,
    platform: &Platform,
    loader: Option<&LoaderOverride>,
) -> Vec<String> {
    let mut entries: Vec<String> = manifest
        .allowed_libraries(platform)
        .filter_map(|lib| lib.artifact())
        .map(|artifact| {
            Path::new("libraries")
                .join(&artifact.path)
                .to_string_lossy()
                .into_owned()
        })
        .collect();

    if let Some(loader) = loader {
        entries.extend(loader.libraries.iter().cloned());
    }

    entries.push("minecraft.jar".to_string());
    entries
}

pub fn build_classpath(
    manifest: &GameManifest,
    platform: &Platform,
    loader: Option<&LoaderOverride>,
) -> String {
    classpath_entries(manifest, platform, loader).join(classpath_separator())
}
