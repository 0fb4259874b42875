// ─── Version Resolver ───
// Turns abstract selectors ("latest", "recommend", ids) into concrete versions.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use super::manifest::VersionIndex;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::loaders::forge::Promotions;

/// Which base game version to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameSelector {
    Latest,
    LatestSnapshot,
    Exact(String),
}

impl FromStr for GameSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "latest" => Self::Latest,
            "latest-snapshot" => Self::LatestSnapshot,
            other => Self::Exact(other.to_string()),
        })
    }
}

impl fmt::Display for GameSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameSelector::Latest => write!(f, "latest"),
            GameSelector::LatestSnapshot => write!(f, "latest-snapshot"),
            GameSelector::Exact(id) => write!(f, "{}", id),
        }
    }
}

/// Which loader build to layer on top of the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderSelector {
    Recommended,
    Latest,
    Exact(String),
}

impl FromStr for LoaderSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "recommend" | "recommended" => Self::Recommended,
            "latest" => Self::Latest,
            other => Self::Exact(other.to_string()),
        })
    }
}

impl fmt::Display for LoaderSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderSelector::Recommended => write!(f, "recommend"),
            LoaderSelector::Latest => write!(f, "latest"),
            LoaderSelector::Exact(v) => write!(f, "{}", v),
        }
    }
}

impl LoaderSelector {
    /// Whether resolving this selector needs the promotion table.
    pub fn needs_promotions(&self) -> bool {
        !matches!(self, LoaderSelector::Exact(_))
    }
}

/// Outcome of loader resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderResolution {
    pub loader_version: String,
    /// Game version the loader targets; replaces the requested one when set.
    pub game_version: Option<String>,
}

/// Loaders are never built for snapshots.
pub fn ensure_loader_compatible(game: &GameSelector, index: &VersionIndex) -> LauncherResult<()> {
    match game {
        GameSelector::LatestSnapshot => Err(LauncherError::SnapshotLoader(
            index.latest.snapshot.clone(),
        )),
        GameSelector::Exact(id) if index.find_version(id).is_some_and(|v| v.is_snapshot()) => {
            Err(LauncherError::SnapshotLoader(id.clone()))
        }
        _ => Ok(()),
    }
}

/// Resolve a game selector to a version id present in the index.
pub fn resolve_game_version(game: &GameSelector, index: &VersionIndex) -> LauncherResult<String> {
    let version = match game {
        GameSelector::Latest => index.latest.release.clone(),
        GameSelector::LatestSnapshot => index.latest.snapshot.clone(),
        GameSelector::Exact(id) => id.clone(),
    };

    if index.find_version(&version).is_none() {
        return Err(LauncherError::VersionNotFound(version));
    }

    Ok(version)
}

/// Promotion table key for a selector pair; `None` for exact loader versions.
pub fn promotion_key(
    game: &GameSelector,
    loader: &LoaderSelector,
    index: &VersionIndex,
) -> Option<String> {
    let suffix = match loader {
        LoaderSelector::Recommended => "recommended",
        LoaderSelector::Latest => "latest",
        LoaderSelector::Exact(_) => return None,
    };

    let game_version = match game {
        GameSelector::Latest if *loader == LoaderSelector::Recommended => {
            return Some("recommended".to_string());
        }
        GameSelector::Latest => index.latest.release.as_str(),
        GameSelector::LatestSnapshot => index.latest.snapshot.as_str(),
        GameSelector::Exact(id) => id.as_str(),
    };

    Some(format!("{}-{}", game_version, suffix))
}

/// Resolve the loader version, checking snapshot compatibility first.
pub fn resolve_loader(
    game: &GameSelector,
    loader: &LoaderSelector,
    index: &VersionIndex,
    promotions: Option<&Promotions>,
) -> LauncherResult<LoaderResolution> {
    ensure_loader_compatible(game, index)?;

    // Exact selectors are their own version.
    let Some(key) = promotion_key(game, loader, index) else {
        return Ok(LoaderResolution {
            loader_version: loader.to_string(),
            game_version: None,
        });
    };

    let promotion = promotions
        .and_then(|p| p.lookup(&key))
        .ok_or_else(|| LauncherError::LoaderPromotionMissing { key: key.clone() })?;

    debug!(
        "Promotion {} -> loader {} for game {:?}",
        key, promotion.loader_version, promotion.game_version
    );

    Ok(LoaderResolution {
        loader_version: promotion.loader_version,
        game_version: promotion.game_version,
    })
}
