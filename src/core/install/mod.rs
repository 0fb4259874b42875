// ─── Install Orchestrator ───
// Builds the install pipeline for a request: resolve versions, fetch the
// manifest, libraries, assets and natives, layer the loader, then record
// the profile.

mod natives;
mod steps;

use std::path::PathBuf;

use tracing::info;

use crate::core::assets::AssetIndex;
use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::loaders::LoaderManifest;
use crate::core::pipeline::{Concurrency, EventSink, Pipeline};
use crate::core::profile::{InstallMode, Profile};
use crate::core::state::{ConfigStore, Endpoints, LauncherSettings};
use crate::core::version::{GameManifest, GameSelector, LoaderSelector, Platform, VersionIndex};

pub use natives::{extract_native, NativeArchive};
pub use steps::{
    ExtractNatives, FetchAssetIndex, FetchAssets, FetchGameJar, FetchGameManifest,
    FetchLibraries, FetchLoaderJar, FetchLoaderLibraries, FetchVersionIndex, ResolveLoader,
    SaveProfile, WriteClientRecord,
};

/// What the user asked to install.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    pub name: String,
    pub path: PathBuf,
    pub game: GameSelector,
    pub loader: Option<LoaderSelector>,
    pub mode: InstallMode,
}

impl InstallRequest {
    pub fn libraries_dir(&self) -> PathBuf {
        self.path.join("libraries")
    }

    pub fn natives_dir(&self) -> PathBuf {
        self.path.join("natives")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.path.join("assets")
    }
}

/// Collaborators and tuning shared by every step.
#[derive(Debug, Clone)]
pub struct InstallContext {
    pub downloader: Downloader,
    pub endpoints: Endpoints,
    pub platform: Platform,
    pub asset_concurrency: usize,
    pub library_concurrency: Concurrency,
}

impl InstallContext {
    pub fn new(client: reqwest::Client, settings: &LauncherSettings, platform: Platform) -> Self {
        Self {
            downloader: Downloader::new(client),
            endpoints: settings.endpoints.clone(),
            platform,
            asset_concurrency: settings.asset_concurrency,
            library_concurrency: settings
                .library_concurrency
                .map(Concurrency::Limited)
                .unwrap_or_default(),
        }
    }
}

/// State threaded through the install steps. Later steps read what earlier
/// ones produced through accessors that fail with `MissingState`.
pub struct InstallState<'a> {
    pub request: InstallRequest,
    pub context: InstallContext,
    pub store: &'a mut ConfigStore,
    version_index: Option<VersionIndex>,
    loader_version: Option<String>,
    /// Game version dictated by a loader promotion.
    game_override: Option<String>,
    game_version: Option<String>,
    manifest: Option<GameManifest>,
    manifest_raw: Option<String>,
    asset_index: Option<AssetIndex>,
    natives: Vec<NativeArchive>,
    loader_manifest: Option<LoaderManifest>,
    loader_jar: Option<PathBuf>,
    /// Profile-relative paths of loader libraries, in classpath order.
    loader_libraries: Vec<String>,
}

impl<'a> InstallState<'a> {
    pub fn new(request: InstallRequest, context: InstallContext, store: &'a mut ConfigStore) -> Self {
        Self {
            request,
            context,
            store,
            version_index: None,
            loader_version: None,
            game_override: None,
            game_version: None,
            manifest: None,
            manifest_raw: None,
            asset_index: None,
            natives: Vec::new(),
            loader_manifest: None,
            loader_jar: None,
            loader_libraries: Vec::new(),
        }
    }

    pub fn version_index(&self) -> LauncherResult<&VersionIndex> {
        self.version_index
            .as_ref()
            .ok_or(LauncherError::MissingState("version index"))
    }

    pub fn game_version(&self) -> LauncherResult<&str> {
        self.game_version
            .as_deref()
            .ok_or(LauncherError::MissingState("game version"))
    }

    pub fn loader_version(&self) -> LauncherResult<&str> {
        self.loader_version
            .as_deref()
            .ok_or(LauncherError::MissingState("loader version"))
    }

    pub fn manifest(&self) -> LauncherResult<&GameManifest> {
        self.manifest
            .as_ref()
            .ok_or(LauncherError::MissingState("game manifest"))
    }

    pub fn manifest_raw(&self) -> LauncherResult<&str> {
        self.manifest_raw
            .as_deref()
            .ok_or(LauncherError::MissingState("raw game manifest"))
    }

    pub fn asset_index(&self) -> LauncherResult<&AssetIndex> {
        self.asset_index
            .as_ref()
            .ok_or(LauncherError::MissingState("asset index"))
    }

    pub fn loader_manifest(&self) -> LauncherResult<&LoaderManifest> {
        self.loader_manifest
            .as_ref()
            .ok_or(LauncherError::MissingState("loader manifest"))
    }

    pub fn loader_jar(&self) -> LauncherResult<&PathBuf> {
        self.loader_jar
            .as_ref()
            .ok_or(LauncherError::MissingState("loader jar"))
    }

    /// The profile this install produces, once the versions are known.
    pub fn profile(&self) -> LauncherResult<Profile> {
        Ok(Profile {
            name: self.request.name.clone(),
            path: self.request.path.clone(),
            game_version: self.game_version()?.to_string(),
            loader_version: self.loader_version.clone(),
            mode: self.request.mode,
        })
    }
}

/// Assemble the step list for a request.
pub fn build_pipeline<'a>(request: &InstallRequest, context: &InstallContext) -> Pipeline<InstallState<'a>> {
    let client = request.mode == InstallMode::Client;
    let loader = request.loader.is_some();

    let mut pipeline = Pipeline::new().step(FetchVersionIndex);
    if loader {
        pipeline = pipeline.step(ResolveLoader);
    }
    pipeline = pipeline.step(FetchGameManifest);

    if client {
        pipeline = pipeline
            .step(FetchLibraries {
                concurrency: context.library_concurrency,
            })
            .step(FetchAssetIndex)
            .step(FetchAssets {
                concurrency: Concurrency::Limited(context.asset_concurrency),
            })
            .step(ExtractNatives);
    }

    pipeline = pipeline.step(FetchGameJar);

    if loader {
        pipeline = pipeline.step(FetchLoaderJar).step(FetchLoaderLibraries {
            concurrency: context.library_concurrency,
        });
    }

    if client {
        pipeline = pipeline.step(WriteClientRecord);
    }

    pipeline.step(SaveProfile)
}

/// Run a full install and return the recorded profile.
///
/// Nothing is rolled back on failure; re-running skips artifacts already on disk.
pub async fn install(
    request: InstallRequest,
    context: InstallContext,
    store: &mut ConfigStore,
    events: &dyn EventSink,
) -> LauncherResult<Profile> {
    info!(
        "Installing '{}' ({} {}, loader {:?}) into {:?}",
        request.name,
        request.mode,
        request.game,
        request.loader.as_ref().map(ToString::to_string),
        request.path
    );

    let pipeline = build_pipeline(&request, &context);
    let mut state = InstallState::new(request, context, store);
    pipeline.run(&mut state, events).await?;

    let profile = state.profile()?;
    info!("Installed profile '{}' at {:?}", profile.name, profile.path);
    Ok(profile)
}
