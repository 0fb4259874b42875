// ─── Config Store ───
// Client identity, accounts, profiles and the account selection, persisted as
// one JSON snapshot after every mutation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::auth::Account;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::profile::Profile;

pub const CONFIG_FILE: &str = "config.json";

/// The persisted snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigData {
    pub client_token: String,
    pub accounts: BTreeMap<String, Account>,
    /// Keyed by profile path.
    pub profiles: BTreeMap<String, Profile>,
    pub selected_account: Option<String>,
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            client_token: Uuid::new_v4().to_string(),
            accounts: BTreeMap::new(),
            profiles: BTreeMap::new(),
            selected_account: None,
        }
    }
}

/// What may be on disk: every field optional, merged over the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialConfig {
    client_token: Option<String>,
    accounts: Option<BTreeMap<String, Account>>,
    profiles: Option<BTreeMap<String, Profile>>,
    selected_account: Option<String>,
}

impl ConfigData {
    fn merge(&mut self, partial: PartialConfig) {
        if let Some(token) = partial.client_token.filter(|t| !t.is_empty()) {
            self.client_token = token;
        }
        if let Some(accounts) = partial.accounts {
            self.accounts = accounts;
        }
        if let Some(profiles) = partial.profiles {
            self.profiles = profiles;
        }
        if partial.selected_account.is_some() {
            self.selected_account = partial.selected_account;
        }
    }
}

pub struct ConfigStore {
    path: PathBuf,
    data: ConfigData,
}

impl ConfigStore {
    /// Load `config.json` from the workspace, creating the workspace and the
    /// file when absent. The merged result is written back immediately.
    pub fn open(workspace: &Path) -> LauncherResult<Self> {
        std::fs::create_dir_all(workspace).map_err(|e| LauncherError::io(workspace, e))?;

        let path = workspace.join(CONFIG_FILE);
        let mut data = ConfigData::default();

        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let partial: PartialConfig = serde_json::from_str(&raw)?;
                data.merge(partial);
                debug!("Loaded config from {:?}", path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config at {:?}, starting fresh", path);
            }
            Err(e) => return Err(LauncherError::io(&path, e)),
        }

        let store = Self { path, data };
        store.save()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &ConfigData {
        &self.data
    }

    pub fn save(&self) -> LauncherResult<()> {
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, json).map_err(|e| LauncherError::io(&self.path, e))
    }

    pub fn client_token(&self) -> &str {
        &self.data.client_token
    }

    // ── Accounts ────────────────────────────────────────

    /// Insert or replace an account under its id.
    pub fn add_account(&mut self, account: Account) -> LauncherResult<()> {
        debug!("Storing account {} ({})", account.name, account.id);
        self.data.accounts.insert(account.id.clone(), account);
        self.save()
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.data.accounts.get(id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.data.accounts.values()
    }

    pub fn select_account(&mut self, id: &str) -> LauncherResult<()> {
        if !self.data.accounts.contains_key(id) {
            return Err(LauncherError::AccountNotFound(id.to_string()));
        }
        self.data.selected_account = Some(id.to_string());
        self.save()
    }

    pub fn selected_account_id(&self) -> Option<&str> {
        self.data.selected_account.as_deref()
    }

    /// The selected account, or the first one by id when the selection is
    /// unset or stale. The fallback becomes the persisted selection.
    pub fn selected_account(&mut self) -> LauncherResult<Option<Account>> {
        if let Some(account) = self
            .data
            .selected_account
            .as_deref()
            .and_then(|id| self.data.accounts.get(id))
        {
            return Ok(Some(account.clone()));
        }

        let Some(first) = self.data.accounts.values().next().cloned() else {
            return Ok(None);
        };

        info!("Selecting account {} by default", first.name);
        self.data.selected_account = Some(first.id.clone());
        self.save()?;
        Ok(Some(first))
    }

    // ── Profiles ────────────────────────────────────────

    /// Insert or replace a profile under its path.
    pub fn add_profile(&mut self, profile: Profile) -> LauncherResult<()> {
        self.data.profiles.insert(profile.key(), profile);
        self.save()
    }

    /// Look a profile up by path first, then by name.
    pub fn profile(&self, key: &str) -> Option<&Profile> {
        self.data
            .profiles
            .get(key)
            .or_else(|| self.data.profiles.values().find(|p| p.name == key))
    }

    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.data.profiles.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::profile::InstallMode;

    fn account(id: &str) -> Account {
        Account {
            id: id.into(),
            name: format!("player-{}", id),
            access_token: format!("token-{}", id),
        }
    }

    fn profile(name: &str, path: &str) -> Profile {
        Profile {
            name: name.into(),
            path: PathBuf::from(path),
            game_version: "1.20.1".into(),
            loader_version: None,
            mode: InstallMode::Client,
        }
    }

    #[test]
    fn fresh_store_generates_and_persists_client_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path()).unwrap();
        let token = store.client_token().to_string();
        assert!(Uuid::parse_str(&token).is_ok());

        let reopened = ConfigStore::open(dir.path()).unwrap();
        assert_eq!(reopened.client_token(), token);
    }

    #[test]
    fn mutations_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path()).unwrap();
        store.add_account(account("b")).unwrap();
        store.add_account(account("a")).unwrap();
        store.select_account("b").unwrap();
        store.add_profile(profile("vanilla", "/games/vanilla")).unwrap();

        let reopened = ConfigStore::open(dir.path()).unwrap();
        assert_eq!(reopened.data(), store.data());
        assert_eq!(reopened.selected_account_id(), Some("b"));
    }

    #[test]
    fn partial_snapshot_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"clientToken":"fixed-token","accounts":{"a":{"id":"a","name":"A","accessToken":"t"}}}"#,
        )
        .unwrap();

        let store = ConfigStore::open(dir.path()).unwrap();
        assert_eq!(store.client_token(), "fixed-token");
        assert_eq!(store.accounts().count(), 1);
        assert_eq!(store.profiles().count(), 0);
        assert_eq!(store.selected_account_id(), None);
    }

    #[test]
    fn stale_selection_falls_back_to_first_account_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path()).unwrap();
        assert_eq!(store.selected_account().unwrap(), None);

        store.add_account(account("m")).unwrap();
        store.add_account(account("c")).unwrap();
        store.data.selected_account = Some("gone".into());

        assert_eq!(store.selected_account().unwrap().unwrap().id, "c");
        let reopened = ConfigStore::open(dir.path()).unwrap();
        assert_eq!(reopened.selected_account_id(), Some("c"));
    }

    #[test]
    fn selecting_unknown_account_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.select_account("nope"),
            Err(LauncherError::AccountNotFound(_))
        ));
    }

    #[test]
    fn profile_lookup_by_path_then_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::open(dir.path()).unwrap();
        store.add_profile(profile("alpha", "/games/a")).unwrap();
        store.add_profile(profile("beta", "/games/b")).unwrap();

        assert_eq!(store.profile("/games/b").unwrap().name, "beta");
        assert_eq!(store.profile("alpha").unwrap().key(), "/games/a");
        assert!(store.profile("gamma").is_none());

        let mut replaced = profile("alpha-2", "/games/a");
        replaced.loader_version = Some("47.1.0".into());
        store.add_profile(replaced).unwrap();
        assert_eq!(store.profiles().count(), 2);
        assert_eq!(store.profile("/games/a").unwrap().name, "alpha-2");
    }
}
