use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use super::natives::{extract_native, NativeArchive};
use super::InstallState;
use crate::core::assets::AssetIndex;
use crate::core::downloader::{Downloader, FetchOutcome};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::loaders::forge::{forge_artifact, ForgeClient, LoaderManifest, LoaderOverride};
use crate::core::pipeline::{Concurrency, Step, StepScope};
use crate::core::profile::{ClientRecord, InstallMode, ProfileSummary};
use crate::core::version::resolver::{ensure_loader_compatible, resolve_game_version, resolve_loader};
use crate::core::version::{GameManifest, VersionIndex};

const LAUNCHER_NAME: &str = "hearth";
const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fetch every `(url, destination)` pair that is not already on disk.
async fn fetch_all(
    scope: &StepScope<'_>,
    downloader: &Downloader,
    items: Vec<(String, PathBuf)>,
) -> LauncherResult<usize> {
    let total = items.len();
    let outcomes = scope
        .parallel_map(items, |(url, dest)| async move {
            downloader.fetch_if_missing(&url, &dest).await
        })
        .await?;

    let downloaded = outcomes
        .iter()
        .filter(|o| **o == FetchOutcome::Downloaded)
        .count();
    debug!("{} of {} artifacts downloaded", downloaded, total);
    Ok(downloaded)
}

fn relative_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// ─── Resolution ───

pub struct FetchVersionIndex;

#[async_trait]
impl<'a> Step<InstallState<'a>> for FetchVersionIndex {
    fn description(&self, _state: &InstallState<'a>) -> String {
        "Fetching Minecraft version list".to_string()
    }

    async fn run(&self, state: &mut InstallState<'a>, _scope: &StepScope<'_>) -> LauncherResult<()> {
        let index = VersionIndex::fetch(
            state.context.downloader.client(),
            &state.context.endpoints.version_manifest,
        )
        .await?;
        state.version_index = Some(index);
        Ok(())
    }
}

pub struct ResolveLoader;

#[async_trait]
impl<'a> Step<InstallState<'a>> for ResolveLoader {
    fn description(&self, state: &InstallState<'a>) -> String {
        match &state.request.loader {
            Some(loader) => format!("Resolving Forge version '{}'", loader),
            None => "Resolving Forge version".to_string(),
        }
    }

    async fn run(&self, state: &mut InstallState<'a>, _scope: &StepScope<'_>) -> LauncherResult<()> {
        let loader = state
            .request
            .loader
            .clone()
            .ok_or(LauncherError::MissingState("loader selector"))?;

        ensure_loader_compatible(&state.request.game, state.version_index()?)?;

        let promotions = if loader.needs_promotions() {
            let forge = ForgeClient::new(
                state.context.downloader.client().clone(),
                state.context.endpoints.forge_maven.clone(),
            );
            Some(forge.promotions().await?)
        } else {
            None
        };

        let resolution = resolve_loader(
            &state.request.game,
            &loader,
            state.version_index()?,
            promotions.as_ref(),
        )?;

        info!(
            "Forge {} selected (game version {:?})",
            resolution.loader_version, resolution.game_version
        );
        state.loader_version = Some(resolution.loader_version);
        state.game_override = resolution.game_version;
        Ok(())
    }
}

pub struct FetchGameManifest;

#[async_trait]
impl<'a> Step<InstallState<'a>> for FetchGameManifest {
    fn description(&self, state: &InstallState<'a>) -> String {
        let version = match &state.game_override {
            Some(v) => v.clone(),
            None => state.request.game.to_string(),
        };
        format!("Fetching Minecraft version '{}' manifest", version)
    }

    async fn run(&self, state: &mut InstallState<'a>, _scope: &StepScope<'_>) -> LauncherResult<()> {
        let index = state.version_index()?;
        let version = match &state.game_override {
            Some(v) => v.clone(),
            None => resolve_game_version(&state.request.game, index)?,
        };
        let entry = index
            .find_version(&version)
            .ok_or_else(|| LauncherError::VersionNotFound(version.clone()))?;

        info!("Selected Minecraft {}", version);
        let (manifest, raw) = GameManifest::fetch(state.context.downloader.client(), &entry.url).await?;

        state.game_version = Some(version);
        state.manifest = Some(manifest);
        state.manifest_raw = Some(raw);
        Ok(())
    }
}

// ─── Client payload ───

pub struct FetchLibraries {
    pub concurrency: Concurrency,
}

#[async_trait]
impl<'a> Step<InstallState<'a>> for FetchLibraries {
    fn description(&self, _state: &InstallState<'a>) -> String {
        "Fetching Minecraft libraries".to_string()
    }

    fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    async fn run(&self, state: &mut InstallState<'a>, scope: &StepScope<'_>) -> LauncherResult<()> {
        let libraries_dir = state.request.libraries_dir();
        let platform = &state.context.platform;

        let mut items = Vec::new();
        let mut natives = Vec::new();

        for library in state.manifest()?.allowed_libraries(platform) {
            if let Some(artifact) = library.artifact() {
                items.push((artifact.url.clone(), libraries_dir.join(&artifact.path)));
            }

            if let Some(native) = library.native_artifact(platform) {
                let dest = libraries_dir.join(&native.path);
                natives.push(NativeArchive {
                    path: dest.clone(),
                    exclude: library.extract_excludes().to_vec(),
                });
                items.push((native.url.clone(), dest));
            }
        }

        info!("{} libraries, {} native archives", items.len(), natives.len());
        fetch_all(scope, &state.context.downloader, items).await?;
        state.natives = natives;
        Ok(())
    }
}

pub struct FetchAssetIndex;

#[async_trait]
impl<'a> Step<InstallState<'a>> for FetchAssetIndex {
    fn description(&self, _state: &InstallState<'a>) -> String {
        "Fetching Minecraft asset index".to_string()
    }

    async fn run(&self, state: &mut InstallState<'a>, _scope: &StepScope<'_>) -> LauncherResult<()> {
        let info = state
            .manifest()?
            .asset_index
            .clone()
            .ok_or_else(|| LauncherError::Other("Game manifest has no asset index".into()))?;

        let (index, raw) = AssetIndex::fetch(&state.context.downloader, &info.url).await?;

        let indexes_dir = state.request.assets_dir().join("indexes");
        tokio::fs::create_dir_all(&indexes_dir)
            .await
            .map_err(|e| LauncherError::io(&indexes_dir, e))?;
        let index_path = indexes_dir.join(format!("{}.json", info.id));
        tokio::fs::write(&index_path, raw)
            .await
            .map_err(|e| LauncherError::io(&index_path, e))?;

        debug!("Asset index {} lists {} objects", info.id, index.objects.len());
        state.asset_index = Some(index);
        Ok(())
    }
}

pub struct FetchAssets {
    pub concurrency: Concurrency,
}

#[async_trait]
impl<'a> Step<InstallState<'a>> for FetchAssets {
    fn description(&self, _state: &InstallState<'a>) -> String {
        "Fetching Minecraft assets".to_string()
    }

    fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    async fn run(&self, state: &mut InstallState<'a>, scope: &StepScope<'_>) -> LauncherResult<()> {
        let objects_dir = state.request.assets_dir().join("objects");
        let resources = &state.context.endpoints.resources;

        let items: Vec<_> = state
            .asset_index()?
            .objects
            .values()
            .map(|object| (object.url(resources), objects_dir.join(object.relative_path())))
            .collect();

        let downloaded = fetch_all(scope, &state.context.downloader, items).await?;
        info!("Downloaded {} asset objects", downloaded);
        Ok(())
    }
}

pub struct ExtractNatives;

#[async_trait]
impl<'a> Step<InstallState<'a>> for ExtractNatives {
    fn description(&self, _state: &InstallState<'a>) -> String {
        "Extracting natives".to_string()
    }

    async fn run(&self, state: &mut InstallState<'a>, scope: &StepScope<'_>) -> LauncherResult<()> {
        let natives_dir = state.request.natives_dir();
        let natives_dir = &natives_dir;

        scope
            .parallel_map(state.natives.clone(), |archive| async move {
                extract_native(archive, natives_dir.clone()).await
            })
            .await?;
        Ok(())
    }
}

// ─── Executables ───

pub struct FetchGameJar;

impl FetchGameJar {
    fn file_name(state: &InstallState<'_>) -> LauncherResult<String> {
        if state.request.mode == InstallMode::Server && state.request.loader.is_some() {
            Ok(format!("minecraft_server.{}.jar", state.game_version()?))
        } else {
            Ok("minecraft.jar".to_string())
        }
    }
}

#[async_trait]
impl<'a> Step<InstallState<'a>> for FetchGameJar {
    fn description(&self, state: &InstallState<'a>) -> String {
        format!("Fetching Minecraft {} executable", state.request.mode)
    }

    async fn run(&self, state: &mut InstallState<'a>, _scope: &StepScope<'_>) -> LauncherResult<()> {
        let mode = state.request.mode;
        let download = state.manifest()?.download_for(mode).ok_or_else(|| {
            LauncherError::Other(format!("Game manifest has no {} download", mode))
        })?;

        let dest = state.request.path.join(Self::file_name(state)?);
        state
            .context
            .downloader
            .fetch_if_missing(&download.url, &dest)
            .await?;
        Ok(())
    }
}

// ─── Loader ───

pub struct FetchLoaderJar;

#[async_trait]
impl<'a> Step<InstallState<'a>> for FetchLoaderJar {
    fn description(&self, state: &InstallState<'a>) -> String {
        match state.loader_version.as_deref() {
            Some(v) => format!("Fetching Forge {}", v),
            None => "Fetching Forge".to_string(),
        }
    }

    async fn run(&self, state: &mut InstallState<'a>, _scope: &StepScope<'_>) -> LauncherResult<()> {
        let game_version = state.game_version()?.to_string();
        let loader_version = state.loader_version()?.to_string();

        let relocated = state
            .request
            .libraries_dir()
            .join(forge_artifact(&game_version, &loader_version).local_path());

        let jar = if state.request.mode == InstallMode::Client && relocated.exists() {
            debug!("Forge jar already relocated at {:?}", relocated);
            relocated
        } else {
            let forge = ForgeClient::new(
                state.context.downloader.client().clone(),
                state.context.endpoints.forge_maven.clone(),
            );
            let url = forge.universal_jar_url(&game_version, &loader_version);
            let dest = state.request.path.join("forge.jar");
            state.context.downloader.fetch_if_missing(&url, &dest).await?;
            dest
        };

        state.loader_manifest = Some(LoaderManifest::read_from_jar(&jar).await?);
        state.loader_jar = Some(jar);
        Ok(())
    }
}

pub struct FetchLoaderLibraries {
    pub concurrency: Concurrency,
}

#[async_trait]
impl<'a> Step<InstallState<'a>> for FetchLoaderLibraries {
    fn description(&self, _state: &InstallState<'a>) -> String {
        "Fetching Forge libraries".to_string()
    }

    fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    async fn run(&self, state: &mut InstallState<'a>, scope: &StepScope<'_>) -> LauncherResult<()> {
        let mode = state.request.mode;
        let profile_dir = state.request.path.clone();
        let default_repo = &state.context.endpoints.libraries;

        let mut items = Vec::new();
        let mut relative = Vec::new();

        for library in state.loader_manifest()?.required_libraries(mode) {
            let rel = Path::new("libraries").join(library.artifact()?.local_path());
            items.push((library.download_url(default_repo)?, profile_dir.join(&rel)));
            relative.push(relative_string(&rel));
        }

        fetch_all(scope, &state.context.downloader, items).await?;

        if mode == InstallMode::Client {
            let rel = Path::new("libraries").join(
                forge_artifact(state.game_version()?, state.loader_version()?).local_path(),
            );
            let target = profile_dir.join(&rel);
            let jar = state.loader_jar()?;

            if *jar != target {
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| LauncherError::io(parent, e))?;
                }
                tokio::fs::rename(jar, &target)
                    .await
                    .map_err(|e| LauncherError::io(jar, e))?;
                debug!("Relocated Forge jar to {:?}", target);
            }

            relative.push(relative_string(&rel));
            state.loader_jar = Some(target);
        }

        state.loader_libraries = relative;
        Ok(())
    }
}

// ─── Records ───

pub struct WriteClientRecord;

impl WriteClientRecord {
    fn vars(manifest: &GameManifest) -> BTreeMap<String, String> {
        let asset_index = manifest
            .asset_index
            .as_ref()
            .map(|a| a.id.clone())
            .unwrap_or_default();

        BTreeMap::from([
            ("natives_directory".to_string(), "natives".to_string()),
            ("assets_root".to_string(), "assets".to_string()),
            ("assets_index_name".to_string(), asset_index),
            ("version_name".to_string(), manifest.id.clone()),
            ("version_type".to_string(), manifest.version_type.clone()),
            ("launcher_name".to_string(), LAUNCHER_NAME.to_string()),
            ("launcher_version".to_string(), LAUNCHER_VERSION.to_string()),
            ("game_directory".to_string(), ".".to_string()),
        ])
    }
}

#[async_trait]
impl<'a> Step<InstallState<'a>> for WriteClientRecord {
    fn description(&self, _state: &InstallState<'a>) -> String {
        "Creating client profile".to_string()
    }

    async fn run(&self, state: &mut InstallState<'a>, _scope: &StepScope<'_>) -> LauncherResult<()> {
        let loader = state.loader_manifest.as_ref().map(|m| LoaderOverride {
            main_class: m.main_class.clone(),
            minecraft_arguments: m.minecraft_arguments.clone(),
            libraries: state.loader_libraries.clone(),
        });

        let record = ClientRecord {
            name: state.request.name.clone(),
            vars: Self::vars(state.manifest()?),
            loader,
        };

        let profile = state.profile()?;
        profile.write_manifest(state.manifest_raw()?).await?;
        profile.write_client_record(&record).await?;
        Ok(())
    }
}

pub struct SaveProfile;

#[async_trait]
impl<'a> Step<InstallState<'a>> for SaveProfile {
    fn description(&self, state: &InstallState<'a>) -> String {
        format!("Saving profile '{}'", state.request.name)
    }

    async fn run(&self, state: &mut InstallState<'a>, _scope: &StepScope<'_>) -> LauncherResult<()> {
        let profile = state.profile()?;
        profile.write_summary(&ProfileSummary::from(&profile)).await?;
        state.store.add_profile(profile)?;
        Ok(())
    }
}
