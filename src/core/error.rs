use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the entire launcher backend.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Resolution ──────────────────────────────────────
    #[error("Can't find Minecraft with version \"{0}\"")]
    VersionNotFound(String),

    #[error("Can't use a mod loader on snapshot release \"{0}\" of Minecraft")]
    SnapshotLoader(String),

    #[error("No loader promotion found for key \"{key}\"")]
    LoaderPromotionMissing { key: String },

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── Profiles ────────────────────────────────────────
    #[error("Can't find profile with id '{0}'")]
    ProfileNotFound(String),

    #[error("No or corrupt profile found at: {path:?}")]
    ProfileFilesMissing { path: PathBuf },

    // ── Accounts ────────────────────────────────────────
    #[error("Can't find account with id '{0}'")]
    AccountNotFound(String),

    #[error("No selected account to start Minecraft with")]
    NoAccount,

    #[error("User doesn't own Minecraft")]
    Ownership,

    #[error("{error}: {message}")]
    AuthService { error: String, message: String },

    // ── Pipeline ────────────────────────────────────────
    #[error("Step {index} ({description}) failed: {source}")]
    StepFailed {
        index: usize,
        description: String,
        source: Box<LauncherError>,
    },

    #[error("Pipeline state '{0}' was not produced by an earlier step")]
    MissingState(&'static str),

    // ── Serialization ───────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Loader archive {path:?} has no version.json")]
    LoaderManifestMissing { path: PathBuf },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    /// Strip any `StepFailed` wrapping and return the error that caused it.
    pub fn root_cause(&self) -> &LauncherError {
        match self {
            LauncherError::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
