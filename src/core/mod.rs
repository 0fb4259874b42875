// ─── Hearth Core ───
// Installs Minecraft clients and servers into self-contained profile directories
// and launches them.
//
// Architecture:
//   core/
//     version/     Mojang index, version JSON, OS rules, selector resolution
//     loaders/     Forge promotions, loader jar manifest and override
//     maven/       Artifact coordinates and repository paths
//     pipeline/    Ordered async steps with bounded item fan-out
//     install/     Install steps wired into a pipeline
//     downloader/  Streaming skip-if-present downloads
//     assets/      Asset index + object paths
//     profile/     Profile model + files written into the profile directory
//     auth/        Yggdrasil authentication
//     launch/      Classpath, argument templates, process spawner
//     state/       Persistent config, settings and the opened workspace

pub mod assets;
pub mod auth;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod launch;
pub mod loaders;
pub mod maven;
pub mod pipeline;
pub mod profile;
pub mod state;
pub mod version;
