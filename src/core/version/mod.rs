pub mod manifest;
pub mod resolver;
pub mod rules;
pub mod version_file;

pub use manifest::{VersionEntry, VersionIndex, VERSION_MANIFEST_URL};
pub use resolver::{GameSelector, LoaderResolution, LoaderSelector};
pub use rules::{resolve_rules, OsRule, Platform, Rule, RuleAction};
pub use version_file::{
    ArgumentEntry, ArgumentValue, GameManifest, LibDownloadArtifact, LibraryEntry,
};
